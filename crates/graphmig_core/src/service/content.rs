//! Content update and subclass reclassification.
//!
//! # Responsibility
//! - Route every content edit, structural or byte-level, through one entry
//!   point that keeps repository indices in step.
//! - Rewrite a DTO's class in place ahead of a `reclassify` call.
//!
//! # Invariants
//! - `update_dto` never changes identity; `change_guid` does that.
//! - On error the caller's DTO is left unchanged.

use crate::content::{set_root_attr, write_element, ContentError, ContentResult};
use crate::migration::{MigrationError, MigrationResult};
use crate::model::dto::{DomainObjectDto, CLASS_ATTR};
use crate::repo::{DomainObjectRepository, RepoError};
use xmltree::Element;

/// Replacement content for `update_dto`.
///
/// `Bytes` is the byte-splicing path for large blobs; `Element` is the
/// parse-and-edit path; `Text` is for attribute-level string rewrites.
#[derive(Debug, Clone)]
pub enum DtoContent {
    Text(String),
    Bytes(Vec<u8>),
    Element(Element),
}

impl DtoContent {
    fn into_text(self) -> ContentResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8),
            Self::Element(element) => write_element(&element),
        }
    }
}

impl From<String> for DtoContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for DtoContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for DtoContent {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Element> for DtoContent {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

/// Replaces `dto`'s content and refreshes the repository's indices.
///
/// When the new content carries a different class, the DTO is moved between
/// class buckets. `old_classname_hint` names the class it is currently
/// indexed under; without it the stored DTO's class is used.
///
/// # Errors
/// - `MalformedContent` when the new content cannot be read.
/// - `IdentityChanged` when the new content carries another guid.
/// - `Repo(NotFound)` when `dto` is not in the repository.
pub fn update_dto<R>(
    repo: &mut R,
    dto: &mut DomainObjectDto,
    new_content: impl Into<DtoContent>,
    old_classname_hint: Option<&str>,
) -> MigrationResult<()>
where
    R: DomainObjectRepository + ?Sized,
{
    let guid = dto.guid();
    let text = new_content
        .into()
        .into_text()
        .map_err(|err| MigrationError::malformed(guid, err))?;
    let mut updated = dto.clone();
    updated
        .replace_content(text)
        .map_err(|err| MigrationError::malformed(guid, err))?;
    if updated.guid() != guid {
        return Err(MigrationError::IdentityChanged {
            expected: guid,
            actual: updated.guid(),
        });
    }

    let indexed_class = match old_classname_hint {
        Some(hint) => hint.to_string(),
        None => repo.get(guid)?.classname().to_string(),
    };
    if indexed_class == updated.classname() {
        repo.update_content(&updated)?;
    } else {
        let old_structure = repo.class_structure(&indexed_class);
        let new_structure = repo.class_structure(updated.classname());
        repo.reclassify(&updated, &old_structure, &new_structure)?;
    }

    *dto = updated;
    Ok(())
}

/// Rewrites `dto`'s class attribute and classname from `old_class` to `new_class`.
///
/// Only the DTO value changes. The caller must follow up with
/// `DomainObjectRepository::reclassify` using the matching structure pair.
pub fn change_to_subclass(
    dto: &mut DomainObjectDto,
    old_class: &str,
    new_class: &str,
) -> MigrationResult<()> {
    let guid = dto.guid();
    if dto.classname() != old_class {
        return Err(MigrationError::Repo(RepoError::ClassMismatch {
            guid,
            expected: old_class.to_string(),
            actual: dto.classname().to_string(),
        }));
    }
    let content = set_root_attr(dto.xml(), CLASS_ATTR, new_class)
        .map_err(|err| MigrationError::malformed(guid, err))?;
    dto.replace_content(content)
        .map_err(|err| MigrationError::malformed(guid, err))
}
