//! v002: log of file-level backups.

use rusqlite::Connection;

use mender_core::errors::MenderResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MenderResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS backup_log (
            id          TEXT PRIMARY KEY,
            created_at  TEXT NOT NULL,
            path        TEXT NOT NULL,
            size_bytes  INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_backup_log_created ON backup_log(created_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
