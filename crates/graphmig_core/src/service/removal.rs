//! Cascading removal over the ownership tree.

use crate::content::{parse_element, remove_surrogates};
use crate::migration::{MigrationError, MigrationResult};
use crate::model::dto::{DomainObjectDto, Guid};
use crate::repo::DomainObjectRepository;
use crate::service::content::update_dto;
use log::debug;
use std::collections::HashSet;

/// Removes `dto` and everything it transitively owns.
///
/// Traversal uses an explicit work-stack, so ownership depth is bounded by
/// memory rather than the call stack. Descendants are removed before their
/// owners. With `detach_from_owner`, the owner's `objsur` for `dto` is
/// stripped first; an owner that is missing is not an error.
///
/// Returns removed guids in removal order.
pub fn remove_including_owned<R>(
    repo: &mut R,
    dto: &DomainObjectDto,
    detach_from_owner: bool,
) -> MigrationResult<Vec<Guid>>
where
    R: DomainObjectRepository + ?Sized,
{
    let root = dto.guid();
    repo.get(root)?;
    if detach_from_owner {
        detach(repo, root)?;
    }

    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        order.push(current);
        stack.extend(repo.directly_owned_guids(current));
    }

    order.reverse();
    for guid in &order {
        repo.remove(*guid)?;
    }

    debug!(
        "event=remove_including_owned module=service status=ok root={root} removed={}",
        order.len()
    );
    Ok(order)
}

fn detach<R>(repo: &mut R, guid: Guid) -> MigrationResult<()>
where
    R: DomainObjectRepository + ?Sized,
{
    let Some(owner_guid) = repo.get(guid)?.owner_guid() else {
        return Ok(());
    };
    let Some(owner) = repo.try_get(owner_guid) else {
        return Ok(());
    };

    let mut element =
        parse_element(owner.xml()).map_err(|err| MigrationError::malformed(owner_guid, err))?;
    if remove_surrogates(&mut element, |target| target == guid) == 0 {
        return Ok(());
    }
    let mut owner = owner.clone();
    update_dto(repo, &mut owner, element, None)
}
