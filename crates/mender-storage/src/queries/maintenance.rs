//! Integrity check and size accounting.

use rusqlite::Connection;

use mender_core::errors::MenderResult;

use crate::to_storage_err;

/// Run `PRAGMA integrity_check`. Returns true if the database is healthy.
pub fn integrity_check(conn: &Connection) -> MenderResult<bool> {
    let result: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(result == "ok")
}

/// page_count * page_size.
pub fn database_size_bytes(conn: &Connection) -> MenderResult<u64> {
    let page_count: u64 = conn
        .pragma_query_value(None, "page_count", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let page_size: u64 = conn
        .pragma_query_value(None, "page_size", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(page_count * page_size)
}

