//! Versioned object-graph migration for serialized project data.
//!
//! Projects are flat collections of XML-serialized objects linked by guid.
//! This crate loads one into an indexed in-memory repository, applies
//! ordered model-version steps to it, and writes it back.

pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod migration;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ConfigError, ConfigResult, RunConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use migration::{
    MigrationError, MigrationOutcome, MigrationRegistry, MigrationResult, MigrationStep,
};
pub use model::class::{ClassHierarchy, ClassStructureInfo};
pub use model::dto::{DomainObjectDto, Guid};
pub use repo::{ChangeSet, DomainObjectRepository, MemoryRepository, RepoError, RepoResult};
pub use service::{delint, DelintReport};
pub use store::{
    open_store, ProjectStore, SqliteProjectStore, StoreError, StoreKind, StoreResult,
    XmlProjectFile,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
