//! Serialized object content helpers.
//!
//! # Responsibility
//! - Read and rewrite root attributes (`class`, `guid`, `ownerguid`, ...)
//!   directly on the serialized text.
//! - Parse content into an editable `xmltree::Element` and write it back.
//! - Offer byte-offset splicing for large content blobs.
//!
//! # Invariants
//! - Attribute-level rewrites never touch bytes outside the edited value.
//! - Parsed trees are owned values; nothing is shared between DTOs.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod attr;
pub mod splice;
pub mod tree;

pub use attr::{
    remove_root_attr, rewrite_guid_refs, root_attr, root_element_name, set_root_attr,
    start_tag_span,
};
pub use splice::{find_element_span, remove_element, splice};
pub use tree::{
    parse_element, remove_surrogates, surrogate_guids, surrogates, write_element, Surrogate,
    SurrogateKind,
};

pub type ContentResult<T> = Result<T, ContentError>;

/// Errors raised while reading or rewriting serialized content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Content does not start with an element.
    NoRootElement,
    /// Root element lacks a required attribute.
    MissingAttribute(&'static str),
    /// Attribute value is not a valid guid.
    InvalidGuid { attribute: String, value: String },
    /// Raw bytes are not UTF-8.
    InvalidUtf8,
    /// Structured parse failure.
    Parse(String),
    /// Structured write failure.
    Write(String),
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRootElement => write!(f, "content has no root element"),
            Self::MissingAttribute(name) => {
                write!(f, "root element is missing attribute `{name}`")
            }
            Self::InvalidGuid { attribute, value } => {
                write!(f, "invalid guid `{value}` in attribute `{attribute}`")
            }
            Self::InvalidUtf8 => write!(f, "content bytes are not valid UTF-8"),
            Self::Parse(message) => write!(f, "malformed content: {message}"),
            Self::Write(message) => write!(f, "failed to serialize content: {message}"),
        }
    }
}

impl Error for ContentError {}
