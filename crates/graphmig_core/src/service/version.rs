//! Version gate shared by every migration step.

use crate::migration::{MigrationError, MigrationResult};
use crate::repo::DomainObjectRepository;
use log::debug;

/// Fails unless the repository is at exactly `expected`.
///
/// Every step calls this before touching anything, which makes steps
/// order-dependent and non-skippable.
pub fn check_version<R>(repo: &R, expected: u32) -> MigrationResult<()>
where
    R: DomainObjectRepository + ?Sized,
{
    let actual = repo.current_version();
    if actual != expected {
        return Err(MigrationError::VersionMismatch { expected, actual });
    }
    Ok(())
}

/// Advances the model version by one. The final action of a successful step.
pub fn increment_version<R>(repo: &mut R) -> u32
where
    R: DomainObjectRepository + ?Sized,
{
    let version = repo.advance_version();
    debug!("event=version_increment module=service status=ok version={version}");
    version
}
