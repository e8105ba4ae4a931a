//! 7000003 -> 7000004: the "Unspecified Variant" entry type gets its
//! canonical guid.
//!
//! A project without that entry type is left alone.

use crate::content::parse_element;
use crate::migration::{MigrationError, MigrationResult, MigrationStep};
use crate::model::dto::{DomainObjectDto, Guid};
use crate::repo::DomainObjectRepository;
use crate::service::{change_guid, check_version, increment_version, owner_and_owned};
use log::{debug, info};
use xmltree::XMLNode;

/// Canonical identity of the "Unspecified Variant" entry type.
pub const UNSPECIFIED_VARIANT_GUID: Guid = Guid::from_u128(0x3942addb_99fd_43e9_ab7d_99025ceb0d4e);

const ENTRY_TYPE_CLASS: &str = "LexEntryType";
const ENTRY_REF_CLASS: &str = "LexEntryRef";
const VARIANT_NAME: &str = "Unspecified Variant";

pub struct CanonicalUnspecifiedVariantGuid;

impl MigrationStep for CanonicalUnspecifiedVariantGuid {
    fn from_version(&self) -> u32 {
        7_000_003
    }

    fn description(&self) -> &'static str {
        "give the Unspecified Variant entry type its canonical guid"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from_version())?;

        if repo.try_get(UNSPECIFIED_VARIANT_GUID).is_some() {
            debug!("event=migration_step module=migration status=skip reason=already_canonical");
            increment_version(repo);
            return Ok(());
        }

        let mut found = None;
        for entry_type in repo.instances_of_or_below(ENTRY_TYPE_CLASS) {
            if has_name(&entry_type, VARIANT_NAME)? {
                found = Some(entry_type);
                break;
            }
        }
        let Some(mut entry_type) = found else {
            info!("event=migration_step module=migration status=skip reason=variant_type_absent");
            increment_version(repo);
            return Ok(());
        };

        let mut candidates = owner_and_owned(repo, &entry_type);
        candidates.extend(
            repo.instances_of_or_below(ENTRY_REF_CLASS)
                .iter()
                .map(DomainObjectDto::guid),
        );
        let old_guid = entry_type.guid();
        let rewritten = change_guid(repo, &mut entry_type, UNSPECIFIED_VARIANT_GUID, &candidates)?;
        info!(
            "event=migration_step module=migration status=progress old_guid={old_guid} new_guid={UNSPECIFIED_VARIANT_GUID} rewritten={rewritten}"
        );

        increment_version(repo);
        Ok(())
    }
}

/// True when any `Name/AUni` alternative equals `name`.
fn has_name(dto: &DomainObjectDto, name: &str) -> MigrationResult<bool> {
    let element =
        parse_element(dto.xml()).map_err(|err| MigrationError::malformed(dto.guid(), err))?;
    let Some(names) = element.get_child("Name") else {
        return Ok(false);
    };
    Ok(names.children.iter().any(|node| match node {
        XMLNode::Element(alternative) if alternative.name == "AUni" => alternative
            .get_text()
            .is_some_and(|text| text.trim() == name),
        _ => false,
    }))
}
