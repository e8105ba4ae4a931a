//! Structured parse-and-edit of object content.

use super::{ContentError, ContentResult};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xmltree::{Element, EmitterConfig, XMLNode};

pub const SURROGATE_ELEMENT: &str = "objsur";

static SURROGATE_GUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<objsur\b[^>]*?\bguid\s*=\s*"([^"]*)""#).expect("objsur pattern is valid")
});

/// Surrogate discriminator carried in the `t` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurrogateKind {
    /// `t="o"`: the containing object owns the target.
    Owning,
    /// `t="r"` (or missing): plain reference.
    Reference,
}

/// One `objsur` element found in content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surrogate {
    pub guid: Uuid,
    pub kind: SurrogateKind,
}

/// Parses content into an owned, editable element tree.
///
/// Whitespace-only text is kept as `Text` nodes and CDATA stays `CData`, so
/// writing the tree back never empties a run that holds only spaces.
pub fn parse_element(xml: &str) -> ContentResult<Element> {
    let config = ParserConfig::new().ignore_comments(false);
    let mut reader = EventReader::new_with_config(xml.as_bytes(), config);
    let mut open: Vec<Element> = Vec::new();
    loop {
        let event = reader
            .next()
            .map_err(|err| ContentError::Parse(err.to_string()))?;
        match event {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let mut element = Element::new(&name.local_name);
                element.prefix = name.prefix;
                element.namespace = name.namespace;
                if !namespace.is_essentially_empty() {
                    element.namespaces = Some(namespace);
                }
                for attribute in attributes {
                    element
                        .attributes
                        .insert(attribute.name.local_name, attribute.value);
                }
                open.push(element);
            }
            XmlEvent::EndElement { .. } => {
                let Some(closed) = open.pop() else {
                    return Err(ContentError::Parse("unbalanced end tag".to_string()));
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(XMLNode::Element(closed)),
                    None => return Ok(closed),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) => {
                push_child(&mut open, XMLNode::Text(text));
            }
            XmlEvent::CData(text) => push_child(&mut open, XMLNode::CData(text)),
            XmlEvent::Comment(text) => push_child(&mut open, XMLNode::Comment(text)),
            XmlEvent::ProcessingInstruction { name, data } => {
                push_child(&mut open, XMLNode::ProcessingInstruction(name, data));
            }
            XmlEvent::StartDocument { .. } => {}
            XmlEvent::EndDocument => {
                return Err(ContentError::Parse("no root element".to_string()));
            }
        }
    }
}

// Nodes outside the root element are dropped.
fn push_child(open: &mut [Element], node: XMLNode) {
    if let Some(parent) = open.last_mut() {
        parent.children.push(node);
    }
}

/// Serializes an element tree without declaration or indentation.
pub fn write_element(element: &Element) -> ContentResult<String> {
    let mut out = Vec::new();
    let config = EmitterConfig::new()
        .perform_indent(false)
        .write_document_declaration(false);
    element
        .write_with_config(&mut out, config)
        .map_err(|err| ContentError::Write(err.to_string()))?;
    String::from_utf8(out).map_err(|_| ContentError::InvalidUtf8)
}

/// Lists every surrogate below `element`, in document order.
pub fn surrogates(element: &Element) -> Vec<Surrogate> {
    let mut found = Vec::new();
    let mut stack: Vec<&Element> = vec![element];
    while let Some(current) = stack.pop() {
        for child in current.children.iter().rev() {
            if let XMLNode::Element(child) = child {
                stack.push(child);
            }
        }
        if current.name == SURROGATE_ELEMENT {
            if let Some(surrogate) = surrogate_of(current) {
                found.push(surrogate);
            }
        }
    }
    found
}

/// Scans serialized content for surrogate target guids without parsing it.
///
/// Unparseable guid values are skipped.
pub fn surrogate_guids(xml: &str) -> Vec<Uuid> {
    SURROGATE_GUID_RE
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .filter_map(|value| Uuid::parse_str(value.as_str()).ok())
        .collect()
}

/// Removes surrogates whose target matches `predicate`.
///
/// Property elements emptied by the removal are dropped as well. Returns the
/// number of surrogates removed.
pub fn remove_surrogates(element: &mut Element, predicate: impl Fn(Uuid) -> bool) -> usize {
    remove_matching(element, &predicate)
}

fn remove_matching(element: &mut Element, predicate: &dyn Fn(Uuid) -> bool) -> usize {
    let mut removed = 0;
    let mut index = 0;
    while index < element.children.len() {
        let XMLNode::Element(child) = &mut element.children[index] else {
            index += 1;
            continue;
        };

        if child.name == SURROGATE_ELEMENT {
            if surrogate_of(child).is_some_and(|surrogate| predicate(surrogate.guid)) {
                element.children.remove(index);
                removed += 1;
                continue;
            }
        } else {
            let inner = remove_matching(child, predicate);
            removed += inner;
            if inner > 0 && is_blank(child) {
                element.children.remove(index);
                continue;
            }
        }
        index += 1;
    }
    removed
}

// Only whitespace text left, which is what a pruned property looks like.
fn is_blank(element: &Element) -> bool {
    element.children.iter().all(|node| match node {
        XMLNode::Text(text) => text.trim().is_empty(),
        _ => false,
    })
}

fn surrogate_of(element: &Element) -> Option<Surrogate> {
    let guid = Uuid::parse_str(element.attributes.get("guid")?.trim()).ok()?;
    let kind = match element.attributes.get("t").map(String::as_str) {
        Some("o") => SurrogateKind::Owning,
        _ => SurrogateKind::Reference,
    };
    Some(Surrogate { guid, kind })
}
