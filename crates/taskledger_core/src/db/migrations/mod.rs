//! Schema registry and destructive reset.
//!
//! # Responsibility
//! - Register schema steps in strictly increasing order.
//! - Apply pending steps atomically.
//! - Drop and recreate every ledger table on demand.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied version is mirrored to `PRAGMA user_version`.
//! - `reset_schema` leaves the database at `latest_version()` with empty tables.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Tables owned by the schema, children first so drops respect foreign keys.
pub const LEDGER_TABLES: &[&str] = &["tasks", "users"];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending schema steps on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    info!(
        "event=schema_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

/// Drops every ledger table and recreates the schema from scratch.
///
/// # Side effects
/// - Deletes all persisted users and tasks. Not migration-safe.
pub fn reset_schema(conn: &mut Connection) -> DbResult<()> {
    warn!("event=schema_reset module=db status=start");

    let tx = conn.transaction()?;
    for table in LEDGER_TABLES {
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table};"))?;
    }
    tx.execute_batch("PRAGMA user_version = 0;")?;
    tx.commit()?;

    apply_migrations(conn)?;
    info!(
        "event=schema_reset module=db status=ok version={}",
        latest_version()
    );
    Ok(())
}

/// Reads `PRAGMA user_version` from the connection.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
