//! Versioned migrations tracked in `schema_version`.

mod v001_documents;
mod v002_backup_log;

use rusqlite::{params, Connection};
use tracing::info;

use mender_core::errors::MenderResult;

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> MenderResult<()>;

const MIGRATIONS: [(u32, &str, MigrationFn); 2] = [
    (1, "documents", v001_documents::migrate),
    (2, "backup_log", v002_backup_log::migrate),
];

/// Latest schema version.
pub const LATEST_VERSION: u32 = MIGRATIONS.len() as u32;

/// Current schema version, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> MenderResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every pending migration, each in its own transaction.
/// Returns the number applied.
pub fn run_migrations(conn: &mut Connection) -> MenderResult<usize> {
    let current = current_version(conn)?;
    let mut applied = 0;
    for (version, name, migrate) in MIGRATIONS.iter() {
        if *version <= current {
            continue;
        }
        let tx = conn
            .transaction()
            .map_err(|e| to_storage_err(e.to_string()))?;
        migrate(&tx)?;
        tx.execute(
            "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
            params![version, name],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
        info!(event = "migration_applied", version, name, "applied migration");
        applied += 1;
    }
    Ok(applied)
}
