//! SqliteStore: every collection lives in one `documents(collection, key, body)` table.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rusqlite::backup::Progress;
use rusqlite::{params, DatabaseName};
use tracing::{debug, info};

use mender_core::config::StorageConfig;
use mender_core::errors::{MenderResult, StoreError};
use mender_core::models::StorageHealth;
use mender_core::record::Record;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, StorageHealthProbe, TransactionMode, WriteOp};

use crate::migrations;
use crate::pool::WriteConnection;
use crate::queries::{document_ops, maintenance};
use crate::scope::{resolve_ops, validate_ops};
use crate::to_storage_err;

/// File-backed (or in-memory) SQLite document store.
pub struct SqliteStore {
    writer: WriteConnection,
    registry: Arc<SchemaRegistry>,
    quota_bytes: u64,
}

impl SqliteStore {
    /// Open a store backed by a file on disk, running pending migrations.
    pub fn open_path(
        path: &Path,
        registry: Arc<SchemaRegistry>,
        config: &StorageConfig,
    ) -> MenderResult<Self> {
        let writer = WriteConnection::open(path, config.busy_timeout_ms)?;
        let store = Self {
            writer,
            registry,
            quota_bytes: config.quota_bytes,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(
        registry: Arc<SchemaRegistry>,
        config: &StorageConfig,
    ) -> MenderResult<Self> {
        let writer = WriteConnection::open_in_memory(config.busy_timeout_ms)?;
        let store = Self {
            writer,
            registry,
            quota_bytes: config.quota_bytes,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> MenderResult<()> {
        self.writer.with_conn_sync(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub async fn schema_version(&self) -> MenderResult<u32> {
        self.writer
            .with_conn(|conn| migrations::current_version(conn))
            .await
    }

    /// `PRAGMA integrity_check`; true when the file is healthy.
    pub async fn integrity_check(&self) -> MenderResult<bool> {
        self.writer
            .with_conn(|conn| maintenance::integrity_check(conn))
            .await
    }

    /// Drop the connection. Calls fail with a connectivity error until `open()`.
    pub async fn close(&self) {
        self.writer.close().await;
        info!(event = "store_closed", "sqlite store closed");
    }

    /// Copy the live database to `dest` through the online backup API.
    /// Returns the backup id recorded in `backup_log`.
    pub async fn backup_to_file(&self, dest: &Path) -> MenderResult<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let dest_display = dest.display().to_string();
        self.writer
            .with_conn(|conn| {
                conn.backup(DatabaseName::Main, dest, None::<fn(Progress)>)
                    .map_err(|e| to_storage_err(format!("file backup failed: {e}")))?;
                let size = std::fs::metadata(dest).map(|m| m.len()).unwrap_or(0);
                conn.execute(
                    "INSERT INTO backup_log (id, created_at, path, size_bytes)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![id, Utc::now().to_rfc3339(), dest_display, size as i64],
                )
                .map_err(|e| to_storage_err(e.to_string()))?;
                Ok(())
            })
            .await?;
        info!(event = "file_backup_created", backup_id = %id, path = %dest.display(), "file backup written");
        Ok(id)
    }

    /// Replace the live database with the contents of a file backup.
    pub async fn restore_from_file(&self, src: &Path) -> MenderResult<()> {
        if !src.exists() {
            return Err(StoreError::Connectivity {
                reason: format!("backup file {} not found", src.display()),
            }
            .into());
        }
        self.writer
            .with_conn(|conn| {
                conn.restore(DatabaseName::Main, src, None::<fn(Progress)>)
                    .map_err(|e| to_storage_err(format!("file restore failed: {e}")))?;
                migrations::run_migrations(conn)?;
                Ok(())
            })
            .await?;
        info!(event = "file_backup_restored", path = %src.display(), "database restored from file");
        Ok(())
    }

    /// `(id, path)` of every file backup, oldest first.
    pub async fn file_backups(&self) -> MenderResult<Vec<(String, String)>> {
        self.writer
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare("SELECT id, path FROM backup_log ORDER BY created_at, id")
                    .map_err(|e| to_storage_err(e.to_string()))?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
                    .map_err(|e| to_storage_err(e.to_string()))?;
                let backups = rows
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| to_storage_err(e.to_string()))?;
                Ok(backups)
            })
            .await
    }

    fn require_collection(&self, collection: &str) -> MenderResult<()> {
        self.registry.require(collection).map(|_| ())
    }

    fn check_quota(&self, conn: &rusqlite::Connection) -> MenderResult<()> {
        if self.quota_bytes == 0 {
            return Ok(());
        }
        let used = maintenance::database_size_bytes(conn)?;
        if used >= self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                used_bytes: used,
                quota_bytes: self.quota_bytes,
            }
            .into());
        }
        Ok(())
    }

    async fn write_all(&self, ops: Vec<WriteOp>) -> MenderResult<()> {
        let resolved = resolve_ops(&self.registry, ops)?;
        let count = resolved.len();
        self.writer
            .with_conn(|conn| {
                self.check_quota(conn)?;
                let tx = conn
                    .transaction()
                    .map_err(|e| to_storage_err(e.to_string()))?;
                for op in &resolved {
                    match &op.record {
                        Some(record) => document_ops::upsert(&tx, &op.collection, &op.key, record)?,
                        None => {
                            document_ops::remove(&tx, &op.collection, &op.key)?;
                        }
                    }
                }
                tx.commit().map_err(|e| to_storage_err(e.to_string()))
            })
            .await?;
        debug!(ops = count, "sqlite transaction committed");
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    async fn open(&self) -> MenderResult<()> {
        if self.writer.reopen().await? {
            self.writer
                .with_conn(|conn| migrations::run_migrations(conn).map(|_| ()))
                .await?;
            info!(event = "store_reopened", "sqlite store reopened");
        }
        Ok(())
    }

    fn collections(&self) -> Vec<String> {
        self.registry.collections()
    }

    async fn get_all(&self, collection: &str) -> MenderResult<Vec<Record>> {
        self.require_collection(collection)?;
        self.writer
            .with_conn(|conn| document_ops::select_all(conn, collection))
            .await
    }

    async fn get(&self, collection: &str, key: &str) -> MenderResult<Option<Record>> {
        self.require_collection(collection)?;
        self.writer
            .with_conn(|conn| document_ops::select_one(conn, collection, key))
            .await
    }

    async fn put(&self, collection: &str, record: Record) -> MenderResult<()> {
        self.write_all(vec![WriteOp::put(collection, record)]).await
    }

    async fn delete(&self, collection: &str, key: &str) -> MenderResult<bool> {
        self.require_collection(collection)?;
        self.writer
            .with_conn(|conn| document_ops::remove(conn, collection, key))
            .await
    }

    async fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> MenderResult<()> {
        validate_ops(scope, mode, &ops)?;
        if ops.is_empty() {
            return Ok(());
        }
        self.write_all(ops).await
    }
}

impl StorageHealthProbe for SqliteStore {
    async fn probe(&self) -> MenderResult<StorageHealth> {
        let start = Instant::now();
        let (usage_bytes, record_count) = self
            .writer
            .with_conn(|conn| {
                Ok((
                    maintenance::database_size_bytes(conn)?,
                    document_ops::count_all(conn)?,
                ))
            })
            .await?;
        Ok(StorageHealth {
            usage_bytes,
            quota_bytes: self.quota_bytes,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            record_count,
        })
    }
}
