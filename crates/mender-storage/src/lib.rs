//! # mender-storage
//!
//! Document stores behind the `DocumentStore` trait: an in-process [`MemoryStore`]
//! and a rusqlite-backed [`SqliteStore`] with pragmas and versioned migrations.
//! Also owns snapshot backups ([`BackupManager`]); both stores implement `StorageHealthProbe`.

pub mod backup;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod queries;
mod scope;
mod sqlite;

pub use backup::BackupManager;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use mender_core::errors::{MenderError, StoreError};

/// Convert a rusqlite failure message into a store error.
pub fn to_storage_err(message: String) -> MenderError {
    MenderError::Store(StoreError::Sqlite { message })
}

/// Classify a rusqlite error; constraint and full-disk failures are not retryable.
pub(crate) fn classify_sqlite_err(err: rusqlite::Error, collection: &str) -> MenderError {
    use rusqlite::ErrorCode;
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => MenderError::Store(StoreError::ConstraintViolation {
            collection: collection.to_string(),
            reason: err.to_string(),
        }),
        Some(ErrorCode::DiskFull) => MenderError::Store(StoreError::QuotaExceeded {
            used_bytes: 0,
            quota_bytes: 0,
        }),
        _ => to_storage_err(err.to_string()),
    }
}
