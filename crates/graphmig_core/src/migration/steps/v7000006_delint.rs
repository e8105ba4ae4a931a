//! 7000005 -> 7000006: consistency sweep.

use crate::migration::{MigrationResult, MigrationStep};
use crate::repo::DomainObjectRepository;
use crate::service::{check_version, delint, increment_version};

pub struct DelintStep;

impl MigrationStep for DelintStep {
    fn from_version(&self) -> u32 {
        7_000_005
    }

    fn description(&self) -> &'static str {
        "remove zombies and dangling references"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from_version())?;
        delint(repo)?;
        increment_version(repo);
        Ok(())
    }
}
