//! SQLite project store.
//!
//! # Invariants
//! - One row per object in `objects`; `project_meta.model_version` holds the
//!   data-model version.
//! - `save` writes only the repository's change set, in one transaction.

use super::{ProjectStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::class::ClassHierarchy;
use crate::model::dto::DomainObjectDto;
use crate::repo::{DomainObjectRepository, MemoryRepository};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::time::Instant;

const MODEL_VERSION_KEY: &str = "model_version";

pub struct SqliteProjectStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteProjectStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        Ok(Self { conn, path })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Replaces the whole stored project with `repo`.
    ///
    /// Used to seed a database from another format. Clears the change set.
    pub fn save_all(&mut self, repo: &mut MemoryRepository) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM objects;", [])?;
        {
            let mut insert =
                tx.prepare("INSERT INTO objects (guid, class, content) VALUES (?1, ?2, ?3);")?;
            for dto in repo.iter() {
                insert.execute(params![dto.guid().to_string(), dto.classname(), dto.xml()])?;
            }
        }
        write_model_version(&tx, repo.current_version())?;
        tx.commit()?;
        repo.clear_changes();
        info!(
            "event=project_save module=store status=ok format=sqlite mode=full objects={}",
            repo.len()
        );
        Ok(())
    }

    /// Stored model version, `None` for a database never written to.
    pub fn stored_version(&self) -> StoreResult<Option<u32>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM project_meta WHERE key = ?1;",
                [MODEL_VERSION_KEY],
                |row| row.get(0),
            )
            .optional()?;
        value
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| {
                    StoreError::InvalidData(format!("stored model version `{raw}` is not a number"))
                })
            })
            .transpose()
    }

    fn project_folder(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

impl ProjectStore for SqliteProjectStore {
    fn load(&self, hierarchy: ClassHierarchy) -> StoreResult<MemoryRepository> {
        let started_at = Instant::now();
        let version = self
            .stored_version()?
            .ok_or_else(|| StoreError::InvalidData("database holds no project".to_string()))?;

        let mut stmt = self
            .conn
            .prepare("SELECT content FROM objects ORDER BY guid;")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut dtos = Vec::new();
        for content in rows {
            dtos.push(DomainObjectDto::from_xml(content?)?);
        }

        let repo = MemoryRepository::load(hierarchy, version, self.project_folder(), dtos)?;
        info!(
            "event=project_load module=store status=ok format=sqlite version={} objects={} duration_ms={}",
            version,
            repo.len(),
            started_at.elapsed().as_millis()
        );
        Ok(repo)
    }

    fn save(&mut self, repo: &mut MemoryRepository) -> StoreResult<()> {
        let started_at = Instant::now();
        let changes = repo.changes().clone();
        let tx = self.conn.transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO objects (guid, class, content) VALUES (?1, ?2, ?3)
                 ON CONFLICT(guid) DO UPDATE SET class = excluded.class, content = excluded.content;",
            )?;
            for guid in changes.added().iter().chain(changes.modified().iter()) {
                let dto = repo.get(*guid)?;
                upsert.execute(params![guid.to_string(), dto.classname(), dto.xml()])?;
            }
            let mut delete = tx.prepare("DELETE FROM objects WHERE guid = ?1;")?;
            for guid in changes.removed() {
                delete.execute([guid.to_string()])?;
            }
        }
        write_model_version(&tx, repo.current_version())?;
        tx.commit()?;
        repo.clear_changes();

        info!(
            "event=project_save module=store status=ok format=sqlite mode=incremental added={} modified={} removed={} duration_ms={}",
            changes.added().len(),
            changes.modified().len(),
            changes.removed().len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

fn write_model_version(tx: &Transaction<'_>, version: u32) -> StoreResult<()> {
    tx.execute(
        "INSERT INTO project_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![MODEL_VERSION_KEY, version.to_string()],
    )?;
    Ok(())
}
