//! Row-level operations on the `documents` table.

use rusqlite::{params, Connection, OptionalExtension};

use mender_core::errors::{MenderError, MenderResult};
use mender_core::record::Record;

use crate::{classify_sqlite_err, to_storage_err};

fn parse_body(collection: &str, key: &str, body: &str) -> MenderResult<Record> {
    serde_json::from_str(body).map_err(|e| MenderError::Serialization {
        reason: format!("{collection}/{key}: {e}"),
    })
}

/// All records of a collection, in key order.
pub fn select_all(conn: &Connection, collection: &str) -> MenderResult<Vec<Record>> {
    let mut stmt = conn
        .prepare_cached("SELECT key, body FROM documents WHERE collection = ?1 ORDER BY key")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (key, body) = row.map_err(|e| to_storage_err(e.to_string()))?;
        records.push(parse_body(collection, &key, &body)?);
    }
    Ok(records)
}

pub fn select_one(conn: &Connection, collection: &str, key: &str) -> MenderResult<Option<Record>> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection, key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    body.map(|b| parse_body(collection, key, &b)).transpose()
}

pub fn upsert(conn: &Connection, collection: &str, key: &str, record: &Record) -> MenderResult<()> {
    let body = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO documents (collection, key, body, updated_at)
         VALUES (?1, ?2, ?3, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         ON CONFLICT (collection, key) DO UPDATE SET
             body = excluded.body,
             updated_at = excluded.updated_at",
        params![collection, key, body],
    )
    .map_err(|e| classify_sqlite_err(e, collection))?;
    Ok(())
}

pub fn remove(conn: &Connection, collection: &str, key: &str) -> MenderResult<bool> {
    let n = conn
        .execute(
            "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection, key],
        )
        .map_err(|e| classify_sqlite_err(e, collection))?;
    Ok(n > 0)
}

pub fn count_all(conn: &Connection) -> MenderResult<usize> {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(n.max(0) as usize)
}
