//! Model-version migration steps and the sequential driver.
//!
//! # Responsibility
//! - Define the contract one version transition implements.
//! - Register steps by source version and apply them in order.
//!
//! # Invariants
//! - A step registered for version `N` only runs on a repository at `N` and
//!   leaves it at `N + 1`.
//! - A failed step aborts the run; nothing already applied is undone.

pub mod error;
pub mod registry;
pub mod steps;

use crate::repo::DomainObjectRepository;

pub use error::{MigrationError, MigrationResult};
pub use registry::{MigrationOutcome, MigrationRegistry};

/// One model-version transition.
pub trait MigrationStep {
    /// Version the step expects to find.
    fn from_version(&self) -> u32;

    /// Version the step leaves behind.
    fn to_version(&self) -> u32 {
        self.from_version() + 1
    }

    /// Short human-readable summary for logs and reports.
    fn description(&self) -> &'static str;

    /// Transforms `repo` in place.
    ///
    /// Implementations call `check_version` first and `increment_version`
    /// last. Any error is fatal to the whole run.
    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()>;
}
