//! Text-level access to root element attributes.
//!
//! These helpers never parse the full document. They locate the first start
//! tag, scan its attributes and splice values in place, so content outside
//! the edited attribute is preserved byte-for-byte.

use super::{ContentError, ContentResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use uuid::Uuid;

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern is valid")
});

static GUID_REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(ownerguid|guid)\s*=\s*"([^"]*)""#).expect("guid reference pattern is valid")
});

#[derive(Debug, Clone)]
struct AttrMatch {
    /// Attribute including its leading whitespace.
    whole: Range<usize>,
    value: Range<usize>,
    name: Range<usize>,
}

/// Returns the byte span of the first start tag at or after `from`.
///
/// Declarations, comments and end tags are skipped. Quoted `>` characters
/// inside attribute values do not terminate the tag.
pub fn start_tag_span(xml: &str, from: usize) -> Option<Range<usize>> {
    let bytes = xml.as_bytes();
    let mut index = from;
    while index < bytes.len() {
        if bytes[index] == b'<' {
            match bytes.get(index + 1) {
                Some(b'?') | Some(b'!') | Some(b'/') => {}
                Some(_) => return scan_tag_end(bytes, index).map(|end| index..end),
                None => return None,
            }
        }
        index += 1;
    }
    None
}

/// Returns the element name of the first start tag.
pub fn root_element_name(xml: &str) -> Option<&str> {
    let span = start_tag_span(xml, 0)?;
    let tag = &xml[span.start + 1..span.end];
    let end = tag
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(tag.len());
    Some(&tag[..end])
}

/// Returns the raw value of attribute `name` on the root element.
pub fn root_attr<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    root_attr_matches(xml)?
        .into_iter()
        .find(|found| &xml[found.name.clone()] == name)
        .map(|found| &xml[found.value])
}

/// Sets attribute `name` on the root element, appending it when absent.
pub fn set_root_attr(xml: &str, name: &str, value: &str) -> ContentResult<String> {
    let span = start_tag_span(xml, 0).ok_or(ContentError::NoRootElement)?;
    let matches = root_attr_matches(xml).ok_or(ContentError::NoRootElement)?;
    let escaped = escape_attr(value);

    if let Some(found) = matches
        .into_iter()
        .find(|found| &xml[found.name.clone()] == name)
    {
        let mut out = String::with_capacity(xml.len() + escaped.len());
        out.push_str(&xml[..found.value.start]);
        out.push_str(&escaped);
        out.push_str(&xml[found.value.end..]);
        return Ok(out);
    }

    let insert_at = if xml[..span.end].ends_with("/>") {
        span.end - 2
    } else {
        span.end - 1
    };
    let insert_at = xml[..insert_at].trim_end().len();
    let mut out = String::with_capacity(xml.len() + name.len() + escaped.len() + 4);
    out.push_str(&xml[..insert_at]);
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escaped);
    out.push('"');
    out.push_str(&xml[insert_at..]);
    Ok(out)
}

/// Removes attribute `name` from the root element.
///
/// Returns `None` when the attribute is not present.
pub fn remove_root_attr(xml: &str, name: &str) -> Option<String> {
    let found = root_attr_matches(xml)?
        .into_iter()
        .find(|found| &xml[found.name.clone()] == name)?;
    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..found.whole.start]);
    out.push_str(&xml[found.whole.end..]);
    Some(out)
}

/// Rewrites every `guid`/`ownerguid` reference equal to `old` into `new`.
///
/// The root element's own `guid` attribute is identity, not a reference, and
/// is left alone. Returns `None` when nothing referenced `old`.
pub fn rewrite_guid_refs(xml: &str, old: Uuid, new: Uuid) -> Option<String> {
    let root_span = start_tag_span(xml, 0);
    let replacement = new.to_string();
    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    let mut changed = false;

    for captures in GUID_REF_RE.captures_iter(xml) {
        let (Some(name), Some(value)) = (captures.get(1), captures.get(2)) else {
            continue;
        };
        let is_identity = name.as_str() == "guid"
            && root_span
                .as_ref()
                .is_some_and(|span| span.contains(&name.start()));
        if is_identity {
            continue;
        }
        if Uuid::parse_str(value.as_str()).ok() != Some(old) {
            continue;
        }
        out.push_str(&xml[cursor..value.start()]);
        out.push_str(&replacement);
        cursor = value.end();
        changed = true;
    }

    if !changed {
        return None;
    }
    out.push_str(&xml[cursor..]);
    Some(out)
}

/// Parses a root attribute as a guid, `None` when absent or empty.
pub(crate) fn root_guid_attr(xml: &str, name: &'static str) -> ContentResult<Option<Uuid>> {
    match root_attr(xml, name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => Uuid::parse_str(value.trim())
            .map(Some)
            .map_err(|_| ContentError::InvalidGuid {
                attribute: name.to_string(),
                value: value.to_string(),
            }),
    }
}

fn root_attr_matches(xml: &str) -> Option<Vec<AttrMatch>> {
    let span = start_tag_span(xml, 0)?;
    let tag = &xml[span.clone()];
    let name_end = tag[1..]
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .map_or(tag.len(), |offset| offset + 1);
    let base = span.start + name_end;
    let attrs = &xml[base..span.end];

    let matches = ATTR_RE
        .captures_iter(attrs)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let name = captures.get(1)?;
            let value = captures.get(2).or_else(|| captures.get(3))?;
            let mut start = base + whole.start();
            while start > base && xml.as_bytes()[start - 1].is_ascii_whitespace() {
                start -= 1;
            }
            Some(AttrMatch {
                whole: start..base + whole.end(),
                value: base + value.start()..base + value.end(),
                name: base + name.start()..base + name.end(),
            })
        })
        .collect();
    Some(matches)
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

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        remove_root_attr, rewrite_guid_refs, root_attr, root_element_name, set_root_attr,
        start_tag_span,
    };
    use uuid::Uuid;

    const OLD: &str = "11111111-1111-1111-1111-111111111111";
    const NEW: &str = "22222222-2222-2222-2222-222222222222";

    #[test]
    fn start_tag_skips_declarations_and_quoted_brackets() {
        let xml = r#"<?xml version="1.0"?><rt class="A>B" guid="x">body</rt>"#;
        let span = start_tag_span(xml, 0).unwrap();
        assert_eq!(&xml[span], r#"<rt class="A>B" guid="x">"#);
        assert_eq!(root_element_name(xml), Some("rt"));
    }

    #[test]
    fn root_attr_ignores_nested_elements() {
        let xml = r#"<rt class="LexEntry" guid="g1"><objsur guid="g2" t="o" /></rt>"#;
        assert_eq!(root_attr(xml, "guid"), Some("g1"));
        assert_eq!(root_attr(xml, "t"), None);
    }

    #[test]
    fn set_root_attr_replaces_in_place_and_appends_when_missing() {
        let xml = r#"<rt class="A" guid="g"><Name /></rt>"#;
        assert_eq!(
            set_root_attr(xml, "class", "B").unwrap(),
            r#"<rt class="B" guid="g"><Name /></rt>"#
        );
        assert_eq!(
            set_root_attr(xml, "ownerguid", "o").unwrap(),
            r#"<rt class="A" guid="g" ownerguid="o"><Name /></rt>"#
        );
        assert_eq!(
            set_root_attr(r#"<rt class="A" />"#, "guid", "g").unwrap(),
            r#"<rt class="A" guid="g" />"#
        );
    }

    #[test]
    fn remove_root_attr_drops_leading_whitespace() {
        let xml = r#"<rt class="A" ownerguid="o" owningflid="5"></rt>"#;
        let stripped = remove_root_attr(xml, "ownerguid").unwrap();
        assert_eq!(stripped, r#"<rt class="A" owningflid="5"></rt>"#);
        assert!(remove_root_attr(xml, "owningord").is_none());
    }

    #[test]
    fn rewrite_guid_refs_skips_root_identity() {
        let old = Uuid::parse_str(OLD).unwrap();
        let new = Uuid::parse_str(NEW).unwrap();
        let xml = format!(
            r#"<rt class="A" guid="{OLD}" ownerguid="{}"><P><objsur guid="{}" t="r" /></P></rt>"#,
            OLD.to_uppercase(),
            OLD
        );
        let rewritten = rewrite_guid_refs(&xml, old, new).unwrap();
        assert_eq!(
            rewritten,
            format!(
                r#"<rt class="A" guid="{OLD}" ownerguid="{NEW}"><P><objsur guid="{NEW}" t="r" /></P></rt>"#
            )
        );
        assert!(rewrite_guid_refs(&rewritten, old, new).is_none());
    }
}
