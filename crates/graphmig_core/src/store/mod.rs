//! Project persistence.
//!
//! # Responsibility
//! - Load a whole project into a `MemoryRepository` and write it back.
//! - Hide the on-disk format (single XML file or SQLite database) behind
//!   `ProjectStore`.
//!
//! # Invariants
//! - A successful `save` leaves the repository's change set empty.
//! - A failed `save` leaves the previous on-disk state readable.

use crate::content::ContentError;
use crate::db::DbError;
use crate::model::class::ClassHierarchy;
use crate::repo::{MemoryRepository, RepoError};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod sqlite;
mod xml_file;

pub use sqlite::SqliteProjectStore;
pub use xml_file::XmlProjectFile;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db(DbError),
    InvalidData(String),
    Repo(RepoError),
    Content(ContentError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid project data: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Content(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Repo(err) => Some(err),
            Self::Content(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ContentError> for StoreError {
    fn from(value: ContentError) -> Self {
        Self::Content(value)
    }
}

/// Storage backend for one project.
pub trait ProjectStore {
    /// Reads every object and the stored model version.
    fn load(&self, hierarchy: ClassHierarchy) -> StoreResult<MemoryRepository>;

    /// Persists `repo` and clears its change set.
    fn save(&mut self, repo: &mut MemoryRepository) -> StoreResult<()>;

    /// Path shown in logs and reports.
    fn location(&self) -> &Path;
}

/// On-disk project format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Xml,
    Sqlite,
}

impl StoreKind {
    /// Guesses the format from the file extension; anything unknown is XML.
    pub fn infer(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("sqlite") | Some("sqlite3") | Some("db") => Self::Sqlite,
            _ => Self::Xml,
        }
    }
}

/// Opens the store at `path`, inferring the format when `kind` is `None`.
pub fn open_store(path: &Path, kind: Option<StoreKind>) -> StoreResult<Box<dyn ProjectStore>> {
    match kind.unwrap_or_else(|| StoreKind::infer(path)) {
        StoreKind::Xml => Ok(Box::new(XmlProjectFile::new(path))),
        StoreKind::Sqlite => Ok(Box::new(SqliteProjectStore::open(path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::StoreKind;
    use std::path::Path;

    #[test]
    fn store_kind_follows_extension() {
        assert_eq!(StoreKind::infer(Path::new("a/b.sqlite")), StoreKind::Sqlite);
        assert_eq!(StoreKind::infer(Path::new("a/b.DB")), StoreKind::Sqlite);
        assert_eq!(StoreKind::infer(Path::new("a/b.fwdata")), StoreKind::Xml);
        assert_eq!(StoreKind::infer(Path::new("noext")), StoreKind::Xml);
    }
}
