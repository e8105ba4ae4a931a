//! In-memory repository holding one project's full object graph.
//!
//! # Responsibility
//! - Own every DTO of one project for the duration of a migration run.
//! - Maintain guid, class-bucket and owner indices in lockstep.
//! - Record what changed since load so stores can save incrementally.
//!
//! # Invariants
//! - `class_buckets[c]` holds exactly the DTOs whose ancestor chain has `c`.
//! - `owned[o]` holds exactly the DTOs whose `ownerguid` is `o`, whether or
//!   not `o` itself is present.

use super::{ChangeSet, DomainObjectRepository, RepoError, RepoResult};
use crate::model::class::{ClassHierarchy, ClassStructureInfo};
use crate::model::dto::{DomainObjectDto, Guid};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Repository over a fully materialized object graph.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    dtos: BTreeMap<Guid, DomainObjectDto>,
    class_buckets: HashMap<String, BTreeSet<Guid>>,
    owned: HashMap<Guid, BTreeSet<Guid>>,
    hierarchy: ClassHierarchy,
    version: u32,
    project_folder: PathBuf,
    changes: ChangeSet,
}

impl MemoryRepository {
    /// Creates an empty repository at `version`.
    pub fn new(hierarchy: ClassHierarchy, version: u32, project_folder: impl Into<PathBuf>) -> Self {
        Self {
            dtos: BTreeMap::new(),
            class_buckets: HashMap::new(),
            owned: HashMap::new(),
            hierarchy,
            version,
            project_folder: project_folder.into(),
            changes: ChangeSet::default(),
        }
    }

    /// Creates a repository populated from storage. The change set starts empty.
    ///
    /// # Errors
    /// - `DuplicateGuid` when two DTOs share a guid.
    pub fn load(
        hierarchy: ClassHierarchy,
        version: u32,
        project_folder: impl Into<PathBuf>,
        dtos: impl IntoIterator<Item = DomainObjectDto>,
    ) -> RepoResult<Self> {
        let mut repo = Self::new(hierarchy, version, project_folder);
        for dto in dtos {
            repo.add(dto)?;
        }
        repo.changes.clear();
        debug!(
            "event=repo_load module=repo status=ok version={} objects={}",
            repo.version,
            repo.dtos.len()
        );
        Ok(repo)
    }

    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    /// Changes recorded since load or the last `clear_changes`.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Marks the current state as persisted.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainObjectDto> {
        self.dtos.values()
    }

    fn bucket_snapshot(&self, classname: &str) -> Vec<DomainObjectDto> {
        self.class_buckets
            .get(classname)
            .map(|bucket| {
                bucket
                    .iter()
                    .filter_map(|guid| self.dtos.get(guid))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn enter_buckets(&mut self, guid: Guid, structure: &ClassStructureInfo) {
        for class in structure.classes() {
            self.class_buckets
                .entry(class.to_string())
                .or_default()
                .insert(guid);
        }
    }

    fn leave_buckets(&mut self, guid: Guid, structure: &ClassStructureInfo) {
        for class in structure.classes() {
            if let Some(bucket) = self.class_buckets.get_mut(class) {
                bucket.remove(&guid);
                if bucket.is_empty() {
                    self.class_buckets.remove(class);
                }
            }
        }
    }

    fn link_owner(&mut self, guid: Guid, owner: Option<Guid>) {
        if let Some(owner) = owner {
            self.owned.entry(owner).or_default().insert(guid);
        }
    }

    fn unlink_owner(&mut self, guid: Guid, owner: Option<Guid>) {
        if let Some(owner) = owner {
            if let Some(children) = self.owned.get_mut(&owner) {
                children.remove(&guid);
                if children.is_empty() {
                    self.owned.remove(&owner);
                }
            }
        }
    }

    /// Adds a rooted chain to the hierarchy. Instances of a class that was
    /// unknown until now gain the ancestor buckets they were missing.
    fn register_structure(&mut self, structure: &ClassStructureInfo) -> RepoResult<()> {
        if structure.root() != self.hierarchy.root() {
            return Ok(());
        }
        let newly_known = !self.hierarchy.contains(structure.leaf());
        self.hierarchy.register(structure)?;
        if newly_known {
            let existing: Vec<Guid> = self
                .class_buckets
                .get(structure.leaf())
                .map(|bucket| bucket.iter().copied().collect())
                .unwrap_or_default();
            for guid in existing {
                self.enter_buckets(guid, structure);
            }
        }
        Ok(())
    }
}

impl DomainObjectRepository for MemoryRepository {
    fn all_instances(&self) -> Vec<DomainObjectDto> {
        self.dtos.values().cloned().collect()
    }

    fn all_instances_with_valid_classes(&self) -> Vec<DomainObjectDto> {
        self.dtos
            .values()
            .filter(|dto| self.hierarchy.contains(dto.classname()))
            .cloned()
            .collect()
    }

    fn exact_instances_of(&self, classname: &str) -> Vec<DomainObjectDto> {
        self.bucket_snapshot(classname)
            .into_iter()
            .filter(|dto| dto.classname() == classname)
            .collect()
    }

    fn instances_of_or_below(&self, classname: &str) -> Vec<DomainObjectDto> {
        self.bucket_snapshot(classname)
    }

    fn guids(&self) -> Vec<Guid> {
        self.dtos.keys().copied().collect()
    }

    fn get(&self, guid: Guid) -> RepoResult<&DomainObjectDto> {
        self.dtos.get(&guid).ok_or(RepoError::NotFound(guid))
    }

    fn try_get(&self, guid: Guid) -> Option<&DomainObjectDto> {
        self.dtos.get(&guid)
    }

    fn owning_object_of(&self, dto: &DomainObjectDto) -> RepoResult<&DomainObjectDto> {
        let owner = dto
            .owner_guid()
            .ok_or(RepoError::OwnerNotFound(dto.guid()))?;
        self.get(owner)
    }

    fn directly_owned_by(&self, guid: Guid) -> Vec<DomainObjectDto> {
        self.directly_owned_guids(guid)
            .into_iter()
            .filter_map(|owned| self.dtos.get(&owned))
            .cloned()
            .collect()
    }

    fn directly_owned_guids(&self, guid: Guid) -> Vec<Guid> {
        self.owned
            .get(&guid)
            .map(|children| children.iter().copied().collect())
            .unwrap_or_default()
    }

    fn add(&mut self, dto: DomainObjectDto) -> RepoResult<()> {
        let guid = dto.guid();
        if self.dtos.contains_key(&guid) {
            return Err(RepoError::DuplicateGuid(guid));
        }
        let structure = self.class_structure(dto.classname());
        self.enter_buckets(guid, &structure);
        self.link_owner(guid, dto.owner_guid());
        self.dtos.insert(guid, dto);
        self.changes.record_added(guid);
        Ok(())
    }

    fn remove(&mut self, guid: Guid) -> RepoResult<DomainObjectDto> {
        let dto = self.dtos.remove(&guid).ok_or(RepoError::NotFound(guid))?;
        let structure = self.class_structure(dto.classname());
        self.leave_buckets(guid, &structure);
        self.unlink_owner(guid, dto.owner_guid());
        self.changes.record_removed(guid);
        Ok(dto)
    }

    fn update_content(&mut self, dto: &DomainObjectDto) -> RepoResult<()> {
        let guid = dto.guid();
        let stored = self.dtos.get(&guid).ok_or(RepoError::NotFound(guid))?;
        if stored.classname() != dto.classname() {
            return Err(RepoError::ClassMismatch {
                guid,
                expected: stored.classname().to_string(),
                actual: dto.classname().to_string(),
            });
        }
        let previous_owner = stored.owner_guid();
        if previous_owner != dto.owner_guid() {
            self.unlink_owner(guid, previous_owner);
            self.link_owner(guid, dto.owner_guid());
        }
        self.dtos.insert(guid, dto.clone());
        self.changes.record_modified(guid);
        Ok(())
    }

    fn reclassify(
        &mut self,
        dto: &DomainObjectDto,
        old_structure: &ClassStructureInfo,
        new_structure: &ClassStructureInfo,
    ) -> RepoResult<()> {
        let guid = dto.guid();
        let stored = self.dtos.get(&guid).ok_or(RepoError::NotFound(guid))?;
        if stored.classname() != old_structure.leaf() {
            return Err(RepoError::ClassMismatch {
                guid,
                expected: old_structure.leaf().to_string(),
                actual: stored.classname().to_string(),
            });
        }
        if dto.classname() != new_structure.leaf() {
            return Err(RepoError::ClassMismatch {
                guid,
                expected: new_structure.leaf().to_string(),
                actual: dto.classname().to_string(),
            });
        }
        let previous_owner = stored.owner_guid();
        let previous_class = stored.classname().to_string();

        self.register_structure(new_structure)?;
        let indexed_under = self.class_structure(&previous_class);
        let moving_to = self.class_structure(new_structure.leaf());
        self.leave_buckets(guid, &indexed_under);
        self.enter_buckets(guid, &moving_to);
        if previous_owner != dto.owner_guid() {
            self.unlink_owner(guid, previous_owner);
            self.link_owner(guid, dto.owner_guid());
        }
        self.dtos.insert(guid, dto.clone());
        self.changes.record_modified(guid);
        debug!(
            "event=repo_reclassify module=repo status=ok guid={} from={} to={}",
            guid,
            old_structure.leaf(),
            new_structure.leaf()
        );
        Ok(())
    }

    fn class_structure(&self, classname: &str) -> ClassStructureInfo {
        self.hierarchy.structure_or_unrooted(classname)
    }

    fn current_version(&self) -> u32 {
        self.version
    }

    fn advance_version(&mut self) -> u32 {
        self.version += 1;
        self.version
    }

    fn project_folder(&self) -> &Path {
        &self.project_folder
    }

    fn len(&self) -> usize {
        self.dtos.len()
    }
}
