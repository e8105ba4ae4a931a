//! Guid remapping with bounded reference fixup.

use crate::content::{rewrite_guid_refs, set_root_attr};
use crate::migration::{MigrationError, MigrationResult};
use crate::model::dto::{DomainObjectDto, Guid, GUID_ATTR};
use crate::repo::{DomainObjectRepository, RepoError};
use log::debug;

/// Gives `dto` the identity `new_guid` and fixes references in `candidates`.
///
/// The repository's current version of the object is renamed, and `dto` is
/// refreshed to it, so a stale `dto` never reverts stored edits.
///
/// Only DTOs listed in `candidates` are searched for references to the old
/// guid. Anything outside that set keeps its stale reference; callers pick
/// the set because a repository-wide scan is too slow for large projects.
/// A candidate equal to the old guid means the renamed DTO itself; missing
/// candidates are skipped.
///
/// Returns the number of candidates rewritten.
///
/// # Errors
/// - `Repo(DuplicateGuid)` when `new_guid` is already taken.
/// - `Repo(NotFound)` when `dto` is not in the repository.
pub fn change_guid<R>(
    repo: &mut R,
    dto: &mut DomainObjectDto,
    new_guid: Guid,
    candidates: &[Guid],
) -> MigrationResult<usize>
where
    R: DomainObjectRepository + ?Sized,
{
    let old_guid = dto.guid();
    if old_guid == new_guid {
        return Ok(0);
    }
    if repo.try_get(new_guid).is_some() {
        return Err(RepoError::DuplicateGuid(new_guid).into());
    }
    let mut renamed = repo.get(old_guid)?.clone();
    let content = set_root_attr(renamed.xml(), GUID_ATTR, &new_guid.to_string())
        .map_err(|err| MigrationError::malformed(old_guid, err))?;
    renamed
        .replace_content(content)
        .map_err(|err| MigrationError::malformed(old_guid, err))?;
    repo.remove(old_guid)?;
    repo.add(renamed.clone())?;
    *dto = renamed;

    let mut rewritten = 0;
    for &candidate in candidates {
        let target = if candidate == old_guid {
            new_guid
        } else {
            candidate
        };
        let Some(current) = repo.try_get(target) else {
            debug!("event=change_guid module=service status=skip candidate={target} reason=missing");
            continue;
        };
        let Some(content) = rewrite_guid_refs(current.xml(), old_guid, new_guid) else {
            continue;
        };
        let mut updated = current.clone();
        updated
            .replace_content(content)
            .map_err(|err| MigrationError::malformed(target, err))?;
        repo.update_content(&updated)?;
        if target == new_guid {
            *dto = updated;
        }
        rewritten += 1;
    }

    debug!(
        "event=change_guid module=service status=ok old={old_guid} new={new_guid} candidates={} rewritten={rewritten}",
        candidates.len()
    );
    Ok(rewritten)
}

/// The usual referrer set for a guid change: the owner and the directly owned.
pub fn owner_and_owned<R>(repo: &R, dto: &DomainObjectDto) -> Vec<Guid>
where
    R: DomainObjectRepository + ?Sized,
{
    let mut candidates: Vec<Guid> = dto.owner_guid().into_iter().collect();
    candidates.extend(repo.directly_owned_guids(dto.guid()));
    candidates
}
