mod common;

use common::{repo_at, rt};
use graphmig_core::migration::MigrationStep;
use graphmig_core::service::{check_version, increment_version};
use graphmig_core::{DomainObjectRepository, Guid, MigrationError, MigrationRegistry, MigrationResult};

/// Adds one marker object per run, so running it twice is visible.
struct AddMarker(u32);

impl MigrationStep for AddMarker {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn description(&self) -> &'static str {
        "add a marker object"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.0)?;
        repo.add(rt("CmObject", Guid::from_u128(self.0 as u128), None, ""))?;
        increment_version(repo);
        Ok(())
    }
}

struct Fails(u32);

impl MigrationStep for Fails {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn description(&self) -> &'static str {
        "always fails"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.0)?;
        Err(MigrationError::MissingRequiredObject("LangProject".to_string()))
    }
}

struct ForgetsToIncrement(u32);

impl MigrationStep for ForgetsToIncrement {
    fn from_version(&self) -> u32 {
        self.0
    }

    fn description(&self) -> &'static str {
        "does not advance"
    }

    fn perform_migration(&self, repo: &mut dyn DomainObjectRepository) -> MigrationResult<()> {
        check_version(repo, self.0)
    }
}

fn registry(steps: Vec<Box<dyn MigrationStep>>) -> MigrationRegistry {
    let mut registry = MigrationRegistry::empty();
    for step in steps {
        registry.register(step).unwrap();
    }
    registry
}

#[test]
fn runs_steps_in_order_to_latest() {
    let registry = registry(vec![Box::new(AddMarker(102)), Box::new(AddMarker(100)), Box::new(AddMarker(101))]);
    assert_eq!(registry.oldest_version(), Some(100));
    assert_eq!(registry.latest_version(), Some(103));

    let mut repo = repo_at(100, Vec::new());
    let outcome = registry.migrate(&mut repo, None).unwrap();

    assert_eq!(outcome.start_version, 100);
    assert_eq!(outcome.end_version, 103);
    assert_eq!(outcome.applied, vec![101, 102, 103]);
    assert_eq!(repo.len(), 3);
}

#[test]
fn rerun_after_success_is_a_no_op() {
    let registry = registry(vec![Box::new(AddMarker(100)), Box::new(AddMarker(101))]);
    let mut repo = repo_at(100, Vec::new());
    registry.migrate(&mut repo, None).unwrap();

    let second = registry.migrate(&mut repo, None).unwrap();
    assert!(second.is_noop());
    assert_eq!(repo.len(), 2);
    assert!(!registry.needs_migration(repo.current_version()));
}

#[test]
fn step_refuses_wrong_version() {
    let mut repo = repo_at(101, Vec::new());
    assert!(matches!(
        AddMarker(100).perform_migration(&mut repo),
        Err(MigrationError::VersionMismatch {
            expected: 100,
            actual: 101
        })
    ));
    assert!(repo.is_empty());
}

#[test]
fn target_version_stops_early() {
    let registry = registry(vec![Box::new(AddMarker(100)), Box::new(AddMarker(101)), Box::new(AddMarker(102))]);
    let mut repo = repo_at(100, Vec::new());

    let outcome = registry.migrate(&mut repo, Some(102)).unwrap();
    assert_eq!(outcome.applied, vec![101, 102]);
    assert!(registry.needs_migration(repo.current_version()));
}

#[test]
fn missing_step_ends_the_run() {
    let registry = registry(vec![Box::new(AddMarker(100)), Box::new(AddMarker(102))]);
    let mut repo = repo_at(100, Vec::new());

    let outcome = registry.migrate(&mut repo, None).unwrap();
    assert_eq!(outcome.end_version, 101);
    assert_eq!(outcome.applied, vec![101]);
}

#[test]
fn failing_step_aborts_without_rollback() {
    let registry = registry(vec![
        Box::new(AddMarker(100)),
        Box::new(Fails(101)),
        Box::new(AddMarker(102)),
    ]);
    let mut repo = repo_at(100, Vec::new());

    let err = registry.migrate(&mut repo, None).unwrap_err();
    assert!(matches!(err, MigrationError::StepFailed { version: 101, .. }));
    assert!(matches!(
        err.root_cause(),
        MigrationError::MissingRequiredObject(class) if class == "LangProject"
    ));
    assert_eq!(repo.current_version(), 101);
    assert_eq!(repo.len(), 1);
}

#[test]
fn step_that_does_not_advance_is_reported() {
    let registry = registry(vec![Box::new(ForgetsToIncrement(100))]);
    let mut repo = repo_at(100, Vec::new());
    assert!(matches!(
        registry.migrate(&mut repo, None),
        Err(MigrationError::StepDidNotAdvance {
            version: 100,
            actual: 100
        })
    ));
}

#[test]
fn versions_outside_the_registry_are_nothing_to_do() {
    let registry = registry(vec![Box::new(AddMarker(100)), Box::new(AddMarker(101))]);

    let mut too_old = repo_at(99, Vec::new());
    let outcome = registry.migrate(&mut too_old, None).unwrap();
    assert!(outcome.is_noop());
    assert_eq!((outcome.start_version, outcome.end_version), (99, 99));
    assert!(matches!(
        registry.check_supported(99),
        Err(MigrationError::VersionTooOld {
            version: 99,
            oldest_supported: 100
        })
    ));

    let mut too_new = repo_at(103, Vec::new());
    let outcome = registry.migrate(&mut too_new, None).unwrap();
    assert!(outcome.is_noop());
    assert_eq!(outcome.end_version, 103);
    assert!(matches!(
        registry.check_supported(103),
        Err(MigrationError::VersionTooNew {
            version: 103,
            latest_supported: 102
        })
    ));
    assert!(too_old.is_empty() && too_new.is_empty());
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = registry(vec![Box::new(AddMarker(100))]);
    assert!(matches!(
        registry.register(Box::new(Fails(100))),
        Err(MigrationError::DuplicateStep(100))
    ));
    assert_eq!(registry.len(), 1);
}

#[test]
fn builtin_registry_covers_the_known_range() {
    let registry = MigrationRegistry::builtin();
    assert_eq!(registry.oldest_version(), Some(7_000_000));
    assert_eq!(registry.latest_version(), Some(7_000_006));
    assert!(registry.needs_migration(7_000_000));
    assert!(!registry.needs_migration(7_000_006));
    assert!(registry.step_for(7_000_003).is_some());
}

#[test]
fn outcome_serializes_for_reports() {
    let registry = registry(vec![Box::new(AddMarker(100))]);
    let mut repo = repo_at(100, Vec::new());
    let outcome = registry.migrate(&mut repo, None).unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["start_version"], 100);
    assert_eq!(json["end_version"], 101);
    assert_eq!(json["applied"], serde_json::json!([101]));
}
