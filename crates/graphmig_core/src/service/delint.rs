//! Whole-repository consistency sweep.
//!
//! # Responsibility
//! - Remove zombies: objects whose owner reference dangles or whose owner
//!   chain never reaches a root.
//! - Prune surrogates that point at objects no longer present.
//!
//! # Invariants
//! - Objects reachable from a root and free of dangling surrogates are not
//!   touched.

use crate::content::{parse_element, remove_surrogates, surrogate_guids};
use crate::migration::{MigrationError, MigrationResult};
use crate::model::dto::Guid;
use crate::repo::DomainObjectRepository;
use crate::service::content::update_dto;
use crate::service::removal::remove_including_owned;
use log::info;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// What one delint pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DelintReport {
    /// Guids removed as zombies, including what they owned.
    pub zombies_removed: Vec<Guid>,
    /// Surrogates pruned from surviving objects.
    pub dangling_references_removed: usize,
    /// Surviving objects rewritten to drop dangling surrogates.
    pub objects_rewritten: Vec<Guid>,
}

impl DelintReport {
    pub fn is_clean(&self) -> bool {
        self.zombies_removed.is_empty() && self.dangling_references_removed == 0
    }
}

/// Restores the ownership invariant after imperfect edits.
pub fn delint<R>(repo: &mut R) -> MigrationResult<DelintReport>
where
    R: DomainObjectRepository + ?Sized,
{
    let started_at = Instant::now();
    let mut report = DelintReport::default();

    for zombie in find_zombies(repo) {
        // Removing an earlier zombie may already have taken this one.
        let Some(dto) = repo.try_get(zombie).cloned() else {
            continue;
        };
        report
            .zombies_removed
            .extend(remove_including_owned(repo, &dto, false)?);
    }

    for guid in repo.guids() {
        let current = repo.get(guid)?;
        let missing: HashSet<Guid> = surrogate_guids(current.xml())
            .into_iter()
            .filter(|target| repo.try_get(*target).is_none())
            .collect();
        if missing.is_empty() {
            continue;
        }

        let mut element =
            parse_element(current.xml()).map_err(|err| MigrationError::malformed(guid, err))?;
        let pruned = remove_surrogates(&mut element, |target| missing.contains(&target));
        let mut current = current.clone();
        update_dto(repo, &mut current, element, None)?;
        report.dangling_references_removed += pruned;
        report.objects_rewritten.push(guid);
    }

    info!(
        "event=delint module=service status=ok zombies={} dangling_refs={} rewritten={} duration_ms={}",
        report.zombies_removed.len(),
        report.dangling_references_removed,
        report.objects_rewritten.len(),
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

/// Guids not reachable from any root by ownership, in guid order.
pub fn find_zombies<R>(repo: &R) -> Vec<Guid>
where
    R: DomainObjectRepository + ?Sized,
{
    let guids = repo.guids();
    let mut reachable = HashSet::new();
    let mut stack: Vec<Guid> = guids
        .iter()
        .copied()
        .filter(|guid| {
            repo.try_get(*guid)
                .is_some_and(|dto| dto.owner_guid().is_none())
        })
        .collect();
    while let Some(current) = stack.pop() {
        if reachable.insert(current) {
            stack.extend(repo.directly_owned_guids(current));
        }
    }

    guids
        .into_iter()
        .filter(|guid| !reachable.contains(guid))
        .collect()
}
