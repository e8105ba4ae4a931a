//! Domain object repository contract and in-memory implementation.
//!
//! # Responsibility
//! - Define the lookup/mutation contract every migration service builds on.
//! - Keep guid, class-bucket and owner indices consistent after every call.
//!
//! # Invariants
//! - A DTO is present in the bucket of every class of its ancestor chain and
//!   in no other bucket.
//! - Query results are snapshots; callers may mutate while iterating them.
//! - The model version changes only through `advance_version`.

use crate::content::ContentError;
use crate::model::class::{ClassHierarchyError, ClassStructureInfo};
use crate::model::dto::{DomainObjectDto, Guid};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub mod changes;
pub mod memory;

pub use changes::ChangeSet;
pub use memory::MemoryRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from repository lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// No DTO with this guid.
    NotFound(Guid),
    /// The DTO carries no owner reference.
    OwnerNotFound(Guid),
    /// `add` was given a guid already present.
    DuplicateGuid(Guid),
    /// The DTO's class disagrees with what the operation expects.
    ClassMismatch {
        guid: Guid,
        expected: String,
        actual: String,
    },
    /// Content could not be read.
    Content(ContentError),
    /// A new class chain conflicts with the hierarchy.
    Hierarchy(ClassHierarchyError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(guid) => write!(f, "object not found: {guid}"),
            Self::OwnerNotFound(guid) => write!(f, "object has no owner: {guid}"),
            Self::DuplicateGuid(guid) => write!(f, "object already exists: {guid}"),
            Self::ClassMismatch {
                guid,
                expected,
                actual,
            } => write!(
                f,
                "object {guid} has class `{actual}`, expected `{expected}`"
            ),
            Self::Content(err) => write!(f, "{err}"),
            Self::Hierarchy(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Content(err) => Some(err),
            Self::Hierarchy(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContentError> for RepoError {
    fn from(value: ContentError) -> Self {
        Self::Content(value)
    }
}

impl From<ClassHierarchyError> for RepoError {
    fn from(value: ClassHierarchyError) -> Self {
        Self::Hierarchy(value)
    }
}

/// Repository interface shared by mutation services and migration steps.
pub trait DomainObjectRepository {
    /// All DTOs, ordered by guid.
    fn all_instances(&self) -> Vec<DomainObjectDto>;
    /// All DTOs whose class the hierarchy knows.
    fn all_instances_with_valid_classes(&self) -> Vec<DomainObjectDto>;
    /// DTOs whose class is exactly `classname`.
    fn exact_instances_of(&self, classname: &str) -> Vec<DomainObjectDto>;
    /// DTOs of `classname` or any class below it.
    fn instances_of_or_below(&self, classname: &str) -> Vec<DomainObjectDto>;
    /// Every guid, ordered.
    fn guids(&self) -> Vec<Guid>;
    fn get(&self, guid: Guid) -> RepoResult<&DomainObjectDto>;
    fn try_get(&self, guid: Guid) -> Option<&DomainObjectDto>;
    /// Resolves `dto`'s owner reference.
    fn owning_object_of(&self, dto: &DomainObjectDto) -> RepoResult<&DomainObjectDto>;
    /// DTOs whose owner reference equals `guid`, one level only.
    fn directly_owned_by(&self, guid: Guid) -> Vec<DomainObjectDto>;
    /// Guids whose owner reference equals `guid`, one level only.
    fn directly_owned_guids(&self, guid: Guid) -> Vec<Guid>;
    fn add(&mut self, dto: DomainObjectDto) -> RepoResult<()>;
    fn remove(&mut self, guid: Guid) -> RepoResult<DomainObjectDto>;
    /// Stores new content for an existing DTO whose class is unchanged.
    fn update_content(&mut self, dto: &DomainObjectDto) -> RepoResult<()>;
    /// Stores `dto` and moves it from its old class buckets to `new_structure` buckets.
    ///
    /// `old_structure.leaf()` must name the stored class. The buckets left are
    /// the ones the DTO is actually indexed under, whatever chain is passed.
    fn reclassify(
        &mut self,
        dto: &DomainObjectDto,
        old_structure: &ClassStructureInfo,
        new_structure: &ClassStructureInfo,
    ) -> RepoResult<()>;
    /// Ancestor chain the repository would index `classname` under.
    fn class_structure(&self, classname: &str) -> ClassStructureInfo;
    fn current_version(&self) -> u32;
    /// Bumps the model version by one. Only `increment_version` calls this.
    fn advance_version(&mut self) -> u32;
    fn project_folder(&self) -> &Path;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
