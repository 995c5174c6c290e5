use serde::{Deserialize, Serialize};

use super::defaults;

/// Storage subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Storage quota reported by the health probe.
    pub quota_bytes: u64,
    /// Number of in-memory backups retained by the backup manager.
    pub backup_retention: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            quota_bytes: defaults::DEFAULT_QUOTA_BYTES,
            backup_retention: defaults::DEFAULT_BACKUP_RETENTION,
        }
    }
}
