//! Domain object transfer value.
//!
//! # Responsibility
//! - Carry one persisted object's identity, class and serialized content.
//! - Keep derived fields (`guid`, `classname`, owner) in lockstep with the
//!   content they are read from.
//!
//! # Invariants
//! - `classname` always equals the content's root `class` attribute.
//! - `guid` always equals the content's root `guid` attribute.
//! - Derived fields change only by replacing the whole content.

use crate::content::attr::root_guid_attr;
use crate::content::{root_attr, ContentError, ContentResult};
use uuid::Uuid;

/// Stable object identifier.
pub type Guid = Uuid;

pub const CLASS_ATTR: &str = "class";
pub const GUID_ATTR: &str = "guid";
pub const OWNER_ATTR: &str = "ownerguid";
pub const OWNING_FLID_ATTR: &str = "owningflid";
pub const OWNING_ORD_ATTR: &str = "owningord";

/// One persisted domain object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainObjectDto {
    guid: Guid,
    classname: String,
    owner: Option<Guid>,
    content: String,
}

impl DomainObjectDto {
    /// Builds a DTO from serialized content, deriving identity and class.
    ///
    /// # Errors
    /// - `MissingAttribute` when `class` or `guid` is absent.
    /// - `InvalidGuid` when `guid` or `ownerguid` does not parse.
    pub fn from_xml(content: impl Into<String>) -> ContentResult<Self> {
        let content = content.into();
        let (guid, classname, owner) = derive_fields(&content)?;
        Ok(Self {
            guid,
            classname,
            owner,
            content,
        })
    }

    /// Builds a DTO from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> ContentResult<Self> {
        let content = String::from_utf8(bytes).map_err(|_| ContentError::InvalidUtf8)?;
        Self::from_xml(content)
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn classname(&self) -> &str {
        &self.classname
    }

    /// Owner named by `ownerguid`, if any. Resolution is the repository's job.
    pub fn owner_guid(&self) -> Option<Guid> {
        self.owner
    }

    /// Serialized content as text.
    pub fn xml(&self) -> &str {
        &self.content
    }

    /// Serialized content as raw bytes, for offset-level edits.
    pub fn xml_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Replaces content and re-derives identity, class and owner from it.
    ///
    /// On error the DTO is left unchanged.
    pub(crate) fn replace_content(&mut self, content: String) -> ContentResult<()> {
        let (guid, classname, owner) = derive_fields(&content)?;
        self.guid = guid;
        self.classname = classname;
        self.owner = owner;
        self.content = content;
        Ok(())
    }
}

fn derive_fields(content: &str) -> ContentResult<(Guid, String, Option<Guid>)> {
    let classname = root_attr(content, CLASS_ATTR)
        .ok_or(ContentError::MissingAttribute(CLASS_ATTR))?
        .to_string();
    let guid = root_guid_attr(content, GUID_ATTR)?.ok_or(ContentError::MissingAttribute(GUID_ATTR))?;
    let owner = root_guid_attr(content, OWNER_ATTR)?;
    Ok((guid, classname, owner))
}

#[cfg(test)]
mod tests {
    use super::DomainObjectDto;
    use crate::content::ContentError;

    #[test]
    fn from_xml_derives_identity_class_and_owner() {
        let dto = DomainObjectDto::from_xml(
            r#"<rt class="WfiWordform" guid="2f3b1c1e-8d1e-4c53-9a4a-0d1b0e4f7a01" ownerguid="6a5c0a4e-41a8-4d8c-9c8e-3e8d3b1f2a02"><Form /></rt>"#,
        )
        .unwrap();
        assert_eq!(dto.classname(), "WfiWordform");
        assert_eq!(
            dto.guid().to_string(),
            "2f3b1c1e-8d1e-4c53-9a4a-0d1b0e4f7a01"
        );
        assert!(dto.owner_guid().is_some());
    }

    #[test]
    fn from_xml_rejects_missing_class() {
        let err = DomainObjectDto::from_xml(r#"<rt guid="2f3b1c1e-8d1e-4c53-9a4a-0d1b0e4f7a01" />"#)
            .unwrap_err();
        assert_eq!(err, ContentError::MissingAttribute("class"));
    }

    #[test]
    fn replace_content_keeps_previous_state_on_error() {
        let mut dto =
            DomainObjectDto::from_xml(r#"<rt class="A" guid="2f3b1c1e-8d1e-4c53-9a4a-0d1b0e4f7a01" />"#)
                .unwrap();
        let before = dto.clone();
        assert!(dto.replace_content(r#"<rt class="A" guid="nope" />"#.to_string()).is_err());
        assert_eq!(dto, before);
    }
}
