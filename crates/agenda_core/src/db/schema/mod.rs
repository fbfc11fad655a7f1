//! SQLite schema bootstrap.
//!
//! # Responsibility
//! - Create the `contacts` table on a fresh database.
//! - Refuse databases written by a newer build.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - `contacts.phone_mobile` carries a `UNIQUE` constraint.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

const SCHEMA_VERSION: u32 = 1;
const SCHEMA_SQL: &str = include_str!("0001_contacts.sql");

/// Returns the schema version written by this binary.
pub fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Creates the schema when missing and stamps `user_version`.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    if current_version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
