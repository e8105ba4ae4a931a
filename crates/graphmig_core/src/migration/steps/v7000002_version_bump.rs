//! 7000001 -> 7000002: model change with no data impact.

use crate::migration::{MigrationResult, MigrationStep};
use crate::repo::DomainObjectRepository;
use crate::service::{check_version, increment_version};

/// Advances the version without touching any object.
pub struct VersionBump {
    from: u32,
}

impl VersionBump {
    pub fn new(from: u32) -> Self {
        Self { from }
    }
}

impl MigrationStep for VersionBump {
    fn from_version(&self) -> u32 {
        self.from
    }

    fn description(&self) -> &'static str {
        "model change without data impact"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.from)?;
        increment_version(repo);
        Ok(())
    }
}
