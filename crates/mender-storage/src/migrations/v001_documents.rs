//! v001: the documents table.

use rusqlite::Connection;

use mender_core::errors::MenderResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> MenderResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            key        TEXT NOT NULL,
            body       TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
            PRIMARY KEY (collection, key)
        ) WITHOUT ROWID;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
