//! Migration registry and driver loop.

use super::steps::builtin_steps;
use super::{MigrationError, MigrationResult, MigrationStep};
use crate::repo::DomainObjectRepository;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// Result of one driver run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub start_version: u32,
    pub end_version: u32,
    /// Versions reached, one per applied step.
    pub applied: Vec<u32>,
}

impl MigrationOutcome {
    /// True when no step ran.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Steps keyed by the version they migrate from.
pub struct MigrationRegistry {
    steps: BTreeMap<u32, Box<dyn MigrationStep>>,
}

impl MigrationRegistry {
    pub fn empty() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Registry holding every step this build ships.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for step in builtin_steps() {
            registry.steps.insert(step.from_version(), step);
        }
        registry
    }

    /// Adds a step.
    ///
    /// # Errors
    /// - `DuplicateStep` when a step already exists for the same version.
    pub fn register(&mut self, step: Box<dyn MigrationStep>) -> MigrationResult<()> {
        let version = step.from_version();
        if self.steps.contains_key(&version) {
            return Err(MigrationError::DuplicateStep(version));
        }
        self.steps.insert(version, step);
        Ok(())
    }

    /// Oldest version any step accepts.
    pub fn oldest_version(&self) -> Option<u32> {
        self.steps.keys().next().copied()
    }

    /// Version the newest step produces.
    pub fn latest_version(&self) -> Option<u32> {
        self.steps.values().next_back().map(|step| step.to_version())
    }

    pub fn step_for(&self, version: u32) -> Option<&dyn MigrationStep> {
        self.steps.get(&version).map(|step| step.as_ref())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether a repository stored at `version` would be changed by `migrate`.
    pub fn needs_migration(&self, version: u32) -> bool {
        self.latest_version()
            .is_some_and(|latest| version < latest && self.steps.contains_key(&version))
    }

    /// Fails when `version` is outside the range the registry can handle.
    ///
    /// Only a query for callers that warn; `migrate` treats such a version
    /// as nothing to do.
    pub fn check_supported(&self, version: u32) -> MigrationResult<()> {
        let (Some(oldest), Some(latest)) = (self.oldest_version(), self.latest_version()) else {
            return Ok(());
        };
        if version > latest {
            return Err(MigrationError::VersionTooNew {
                version,
                latest_supported: latest,
            });
        }
        if version < oldest {
            return Err(MigrationError::VersionTooOld {
                version,
                oldest_supported: oldest,
            });
        }
        Ok(())
    }

    /// Applies steps until `target` (default: latest) or the first gap.
    ///
    /// A version with no registered step ends the run as "nothing to do",
    /// including versions below the oldest step or above the latest target.
    /// A failing step aborts immediately; the repository must then be
    /// discarded, since steps already applied are not undone.
    pub fn migrate(
        &self,
        repo: &mut dyn DomainObjectRepository,
        target: Option<u32>,
    ) -> MigrationResult<MigrationOutcome> {
        let start_version = repo.current_version();
        if let Err(err) = self.check_supported(start_version) {
            warn!(
                "event=migration_run module=migration status=nothing_to_do version={start_version} reason=\"{err}\""
            );
        }

        let target = target.or(self.latest_version()).unwrap_or(start_version);
        let run_started_at = Instant::now();
        let mut applied = Vec::new();

        while repo.current_version() < target {
            let version = repo.current_version();
            let Some(step) = self.steps.get(&version) else {
                info!(
                    "event=migration_run module=migration status=nothing_to_do version={version} target={target}"
                );
                break;
            };

            let started_at = Instant::now();
            info!(
                "event=migration_step module=migration status=start from_version={} to_version={} description=\"{}\"",
                version,
                step.to_version(),
                step.description()
            );
            if let Err(err) = step.perform_migration(repo) {
                error!(
                    "event=migration_step module=migration status=error from_version={} duration_ms={} error={}",
                    version,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(MigrationError::StepFailed {
                    version,
                    source: Box::new(err),
                });
            }

            let actual = repo.current_version();
            if actual != step.to_version() {
                error!(
                    "event=migration_step module=migration status=error from_version={version} error_code=version_not_advanced actual={actual}"
                );
                return Err(MigrationError::StepDidNotAdvance { version, actual });
            }
            info!(
                "event=migration_step module=migration status=ok from_version={} to_version={} duration_ms={}",
                version,
                actual,
                started_at.elapsed().as_millis()
            );
            applied.push(actual);
        }

        let outcome = MigrationOutcome {
            start_version,
            end_version: repo.current_version(),
            applied,
        };
        info!(
            "event=migration_run module=migration status=ok start_version={} end_version={} steps={} duration_ms={}",
            outcome.start_version,
            outcome.end_version,
            outcome.applied.len(),
            run_started_at.elapsed().as_millis()
        );
        Ok(outcome)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
