//! Snapshot backups taken before destructive operations.
//!
//! A backup is the full record list of each collection in scope. Restoring
//! rewrites those collections to exactly the snapshot in one transaction,
//! so records created after the backup are removed.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use mender_core::errors::{MenderError, MenderResult};
use mender_core::models::{Backup, BackupSummary};
use mender_core::record::extract_key;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, TransactionMode, WriteOp};

/// Keeps the most recent `retention` snapshots in memory.
pub struct BackupManager<S: DocumentStore> {
    store: Arc<S>,
    registry: Arc<SchemaRegistry>,
    retention: usize,
    backups: Mutex<VecDeque<Backup>>,
}

impl<S: DocumentStore> BackupManager<S> {
    pub fn new(store: Arc<S>, registry: Arc<SchemaRegistry>, retention: usize) -> Self {
        Self {
            store,
            registry,
            retention: retention.max(1),
            backups: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot every collection in `scope`. Returns the backup id.
    pub async fn create_backup(&self, scope: &[&str], reason: &str) -> MenderResult<String> {
        let mut snapshot = BTreeMap::new();
        for collection in scope {
            self.registry.require(collection)?;
            let records = self.store.get_all(collection).await?;
            snapshot.insert(collection.to_string(), records);
        }
        let backup = Backup {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            reason: reason.to_string(),
            collections_included: scope.iter().map(|c| c.to_string()).collect(),
            snapshot,
        };
        let id = backup.id.clone();
        info!(
            event = "backup_created",
            backup_id = %id,
            collections = scope.len(),
            records = backup.record_count(),
            reason,
            "backup created"
        );

        let mut backups = self.backups.lock().unwrap_or_else(|e| e.into_inner());
        backups.push_back(backup);
        while backups.len() > self.retention {
            if let Some(evicted) = backups.pop_front() {
                warn!(event = "backup_evicted", backup_id = %evicted.id, "retention limit reached");
            }
        }
        Ok(id)
    }

    /// Rewrite every included collection to its snapshot contents.
    /// Returns the number of records written.
    pub async fn restore(&self, backup_id: &str) -> MenderResult<usize> {
        let backup = self.get(backup_id).ok_or_else(|| MenderError::BackupNotFound {
            id: backup_id.to_string(),
        })?;

        let mut ops = Vec::new();
        let mut written = 0;
        for (collection, records) in &backup.snapshot {
            let schema = self.registry.require(collection)?;
            let mut keep = BTreeSet::new();
            for record in records {
                keep.insert(extract_key(collection, &schema.key_path, record)?);
            }
            for current in self.store.get_all(collection).await? {
                let key = extract_key(collection, &schema.key_path, &current)?;
                if !keep.contains(&key) {
                    ops.push(WriteOp::delete(collection, &key));
                }
            }
            for record in records {
                ops.push(WriteOp::put(collection, record.clone()));
                written += 1;
            }
        }

        let scope: Vec<&str> = backup
            .collections_included
            .iter()
            .map(String::as_str)
            .collect();
        self.store
            .transaction(&scope, TransactionMode::ReadWrite, ops)
            .await?;
        info!(event = "backup_restored", backup_id, records = written, "backup restored");
        Ok(written)
    }

    pub fn get(&self, backup_id: &str) -> Option<Backup> {
        let backups = self.backups.lock().unwrap_or_else(|e| e.into_inner());
        backups.iter().find(|b| b.id == backup_id).cloned()
    }

    /// Newest first.
    pub fn list(&self) -> Vec<BackupSummary> {
        let backups = self.backups.lock().unwrap_or_else(|e| e.into_inner());
        backups.iter().rev().map(Backup::summary).collect()
    }

    pub fn latest(&self) -> Option<BackupSummary> {
        self.list().into_iter().next()
    }
}
