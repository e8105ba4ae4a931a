//! Storage-schema migrations for the SQLite project store.
//!
//! # Invariants
//! - `version` values are strictly increasing.
//! - The applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaMigration {
    version: u32,
    sql: &'static str,
}

const SCHEMA_MIGRATIONS: &[SchemaMigration] = &[SchemaMigration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Latest storage-schema version this binary writes.
pub fn latest_schema_version() -> u32 {
    SCHEMA_MIGRATIONS
        .last()
        .map_or(0, |migration| migration.version)
}

/// Applies pending storage-schema migrations in one transaction.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    let latest = latest_schema_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in SCHEMA_MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current)
    {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;
    Ok(())
}

pub(crate) fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
