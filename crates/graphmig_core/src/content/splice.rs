//! Byte-offset editing for large content blobs.
//!
//! Parsing a multi-megabyte paragraph just to drop one element is wasteful,
//! so a few steps locate the element by offset and splice the raw bytes.
//! Callers must only target elements that never nest inside themselves.

use std::ops::Range;

/// Returns the byte span of the first `<name ...>...</name>` or `<name/>`.
pub fn find_element_span(bytes: &[u8], name: &str) -> Option<Range<usize>> {
    let start = find_open_tag(bytes, name)?;
    let tag_end = scan_tag_end(bytes, start)?;
    if bytes[..tag_end].ends_with(b"/>") {
        return Some(start..tag_end);
    }

    let close = format!("</{name}>");
    let offset = find_bytes(&bytes[tag_end..], close.as_bytes())?;
    Some(start..tag_end + offset + close.len())
}

/// Replaces `range` in `bytes` with `replacement`.
pub fn splice(bytes: &[u8], range: Range<usize>, replacement: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() - range.len() + replacement.len());
    out.extend_from_slice(&bytes[..range.start]);
    out.extend_from_slice(replacement);
    out.extend_from_slice(&bytes[range.end..]);
    out
}

/// Removes the first `name` element, returning `None` when absent.
pub fn remove_element(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let span = find_element_span(bytes, name)?;
    Some(splice(bytes, span, b""))
}

// `<name` followed by whitespace, `/` or `>`, so longer names never match.
fn find_open_tag(bytes: &[u8], name: &str) -> Option<usize> {
    let open = format!("<{name}");
    let open = open.as_bytes();
    let mut from = 0;
    loop {
        let start = from + find_bytes(&bytes[from..], open)?;
        match bytes.get(start + open.len()) {
            Some(next) if next.is_ascii_whitespace() || matches!(next, b'/' | b'>') => {
                return Some(start)
            }
            _ => from = start + 1,
        }
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn scan_tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        match quote {
            Some(open) if open == byte => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => return Some(start + offset + 1),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{find_element_span, remove_element, splice};

    #[test]
    fn finds_paired_and_self_closing_elements() {
        let xml = br#"<rt><ParseIsCurrent val="True" /><Contents>x</Contents></rt>"#;
        let span = find_element_span(xml, "ParseIsCurrent").unwrap();
        assert_eq!(&xml[span], br#"<ParseIsCurrent val="True" />"#);

        let span = find_element_span(xml, "Contents").unwrap();
        assert_eq!(&xml[span], b"<Contents>x</Contents>");
    }

    #[test]
    fn element_name_prefix_does_not_match() {
        let xml = b"<rt><ContentsExtra /></rt>";
        assert!(find_element_span(xml, "Contents").is_none());

        let xml = b"<rt><ContentsExtra /><Contents>x</Contents></rt>";
        let span = find_element_span(xml, "Contents").unwrap();
        assert_eq!(&xml[span], b"<Contents>x</Contents>");
    }

    #[test]
    fn remove_element_splices_out_exact_bytes() {
        let xml = br#"<rt a="1"><Gone>zz</Gone><Kept /></rt>"#;
        let out = remove_element(xml, "Gone").unwrap();
        assert_eq!(out, br#"<rt a="1"><Kept /></rt>"#.to_vec());
        assert_eq!(splice(b"abcdef", 1..3, b"XY"), b"aXYdef".to_vec());
    }
}
