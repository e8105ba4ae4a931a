//! 7000000 -> 7000001: the wordform inventory goes away.
//!
//! Wordforms it owned become unowned top-level objects. The inventory is then
//! detached from its owner and removed.

use crate::content::remove_root_attr;
use crate::migration::{MigrationError, MigrationResult, MigrationStep};
use crate::model::dto::{OWNER_ATTR, OWNING_FLID_ATTR, OWNING_ORD_ATTR};
use crate::repo::DomainObjectRepository;
use crate::service::{check_version, increment_version, remove_including_owned, update_dto};
use log::debug;

const INVENTORY_CLASS: &str = "WordformInventory";
const PROJECT_CLASS: &str = "LangProject";

pub struct RemoveWordformInventory;

impl MigrationStep for RemoveWordformInventory {
    fn from_version(&self) -> u32 {
        7_000_000
    }

    fn description(&self) -> &'static str {
        "remove WordformInventory and release its wordforms"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from_version())?;
        if repo.exact_instances_of(PROJECT_CLASS).is_empty() {
            return Err(MigrationError::MissingRequiredObject(
                PROJECT_CLASS.to_string(),
            ));
        }

        for inventory in repo.exact_instances_of(INVENTORY_CLASS) {
            let mut released = 0usize;
            for mut owned in repo.directly_owned_by(inventory.guid()) {
                let mut content = owned.xml().to_string();
                for attr in [OWNER_ATTR, OWNING_FLID_ATTR, OWNING_ORD_ATTR] {
                    if let Some(stripped) = remove_root_attr(&content, attr) {
                        content = stripped;
                    }
                }
                update_dto(repo, &mut owned, content, None)?;
                released += 1;
            }
            // Nothing is owned any more, so only the inventory itself goes.
            remove_including_owned(repo, &inventory, true)?;
            debug!(
                "event=migration_step module=migration status=progress inventory={} released={released}",
                inventory.guid()
            );
        }

        increment_version(repo);
        Ok(())
    }
}
