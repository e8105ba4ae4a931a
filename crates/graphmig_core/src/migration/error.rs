//! Migration error taxonomy.

use crate::content::ContentError;
use crate::model::dto::Guid;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type MigrationResult<T> = Result<T, MigrationError>;

/// Errors raised by mutation services, migration steps and the driver.
///
/// Every variant is fatal to the run that raised it. Steps that tolerate a
/// condition check for it and skip instead of returning an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// Repository version differs from the version a step is written for.
    VersionMismatch { expected: u32, actual: u32 },
    /// A step needs at least one instance of a class and found none.
    MissingRequiredObject(String),
    /// A reference names a guid absent from the repository.
    UnresolvedReference { from: Guid, target: Guid },
    /// Content failed to parse or serialize.
    MalformedContent {
        guid: Option<Guid>,
        source: ContentError,
    },
    /// Content update tried to change an object's guid.
    IdentityChanged { expected: Guid, actual: Guid },
    /// Repository-level failure.
    Repo(RepoError),
    /// A step failed; wraps the step's own error.
    StepFailed {
        version: u32,
        source: Box<MigrationError>,
    },
    /// A step returned success without advancing the version exactly once.
    StepDidNotAdvance { version: u32, actual: u32 },
    /// Stored version predates every registered step.
    VersionTooOld { version: u32, oldest_supported: u32 },
    /// Stored version is newer than the latest registered step produces.
    VersionTooNew { version: u32, latest_supported: u32 },
    /// Two steps were registered for the same version.
    DuplicateStep(u32),
}

impl MigrationError {
    pub fn malformed(guid: Guid, source: ContentError) -> Self {
        Self::MalformedContent {
            guid: Some(guid),
            source,
        }
    }

    /// The innermost error, looking through `StepFailed` wrappers.
    pub fn root_cause(&self) -> &MigrationError {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl Display for MigrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionMismatch { expected, actual } => write!(
                f,
                "model version mismatch: expected {expected}, repository is at {actual}"
            ),
            Self::MissingRequiredObject(class) => {
                write!(f, "required object of class `{class}` not found")
            }
            Self::UnresolvedReference { from, target } => {
                write!(f, "object {from} references missing object {target}")
            }
            Self::MalformedContent {
                guid: Some(guid),
                source,
            } => write!(f, "malformed content in object {guid}: {source}"),
            Self::MalformedContent { guid: None, source } => {
                write!(f, "malformed content: {source}")
            }
            Self::IdentityChanged { expected, actual } => write!(
                f,
                "content update changed guid {expected} to {actual}; use change_guid"
            ),
            Self::Repo(err) => write!(f, "{err}"),
            Self::StepFailed { version, source } => {
                write!(f, "migration from version {version} failed: {source}")
            }
            Self::StepDidNotAdvance { version, actual } => write!(
                f,
                "migration from version {version} left repository at version {actual}"
            ),
            Self::VersionTooOld {
                version,
                oldest_supported,
            } => write!(
                f,
                "model version {version} predates oldest supported version {oldest_supported}"
            ),
            Self::VersionTooNew {
                version,
                latest_supported,
            } => write!(
                f,
                "model version {version} is newer than supported {latest_supported}"
            ),
            Self::DuplicateStep(version) => {
                write!(f, "more than one migration registered for version {version}")
            }
        }
    }
}

impl Error for MigrationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedContent { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            Self::StepFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<RepoError> for MigrationError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Content(source) => Self::MalformedContent { guid: None, source },
            other => Self::Repo(other),
        }
    }
}

impl From<ContentError> for MigrationError {
    fn from(value: ContentError) -> Self {
        Self::MalformedContent {
            guid: None,
            source: value,
        }
    }
}
