//! In-process document store: one keyed `BTreeMap` per registered collection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use mender_core::errors::{MenderError, MenderResult, StoreError};
use mender_core::models::StorageHealth;
use mender_core::record::{extract_key, Record};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, StorageHealthProbe, TransactionMode, WriteOp};

use crate::scope::{resolve_ops, validate_ops};

type Collections = BTreeMap<String, BTreeMap<String, Record>>;

/// Volatile store, also the reference implementation for tests.
///
/// `close()` makes every call fail with a connectivity error until `open()`.
pub struct MemoryStore {
    registry: Arc<SchemaRegistry>,
    data: RwLock<Collections>,
    closed: AtomicBool,
    quota_bytes: u64,
}

impl MemoryStore {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        let data = registry
            .collections()
            .into_iter()
            .map(|name| (name, BTreeMap::new()))
            .collect();
        Self {
            registry,
            data: RwLock::new(data),
            closed: AtomicBool::new(false),
            quota_bytes: 0,
        }
    }

    /// Enforce a byte quota on serialized record size (0 = unlimited).
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Seed records directly, bypassing quota and scope checks.
    pub fn seed(&self, collection: &str, records: Vec<Record>) -> MenderResult<()> {
        let key_path = self.key_path(collection)?;
        let mut data = self.write_guard()?;
        let bucket = data.entry(collection.to_string()).or_default();
        for record in records {
            let key = extract_key(collection, &key_path, &record)?;
            bucket.insert(key, record);
        }
        Ok(())
    }

    /// Serialized size of every stored record.
    pub fn usage_bytes(&self) -> MenderResult<u64> {
        Ok(usage_of(&*self.read_guard()?))
    }

    pub fn record_count(&self) -> MenderResult<usize> {
        Ok(self.read_guard()?.values().map(BTreeMap::len).sum())
    }

    fn ensure_open(&self) -> MenderResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Connectivity {
                reason: "memory store is closed".to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn key_path(&self, collection: &str) -> MenderResult<String> {
        self.registry
            .key_path(collection)
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::UnknownCollection {
                    collection: collection.to_string(),
                }
                .into()
            })
    }

    fn read_guard(&self) -> MenderResult<std::sync::RwLockReadGuard<'_, Collections>> {
        self.data.read().map_err(|e| lock_err(e.to_string()))
    }

    fn write_guard(&self) -> MenderResult<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.data.write().map_err(|e| lock_err(e.to_string()))
    }

    fn check_quota(&self, staged: &Collections) -> MenderResult<()> {
        if self.quota_bytes == 0 {
            return Ok(());
        }
        let used = usage_of(staged);
        if used > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                used_bytes: used,
                quota_bytes: self.quota_bytes,
            }
            .into());
        }
        Ok(())
    }

    /// Apply ops to a staged copy, check quota, then swap in. All or nothing.
    fn apply(&self, ops: Vec<WriteOp>) -> MenderResult<()> {
        let resolved = resolve_ops(&self.registry, ops)?;
        let mut data = self.write_guard()?;
        let mut staged = data.clone();
        for op in resolved {
            let bucket = staged.entry(op.collection).or_default();
            match op.record {
                Some(r) => {
                    bucket.insert(op.key, r);
                }
                None => {
                    bucket.remove(&op.key);
                }
            }
        }
        self.check_quota(&staged)?;
        *data = staged;
        Ok(())
    }
}

fn usage_of(data: &Collections) -> u64 {
    data.values()
        .flat_map(BTreeMap::values)
        .map(|r| r.to_string().len() as u64)
        .sum()
}

fn lock_err(reason: String) -> MenderError {
    StoreError::Connectivity {
        reason: format!("memory store lock poisoned: {reason}"),
    }
    .into()
}

impl DocumentStore for MemoryStore {
    async fn open(&self) -> MenderResult<()> {
        self.closed.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn collections(&self) -> Vec<String> {
        self.registry.collections()
    }

    async fn get_all(&self, collection: &str) -> MenderResult<Vec<Record>> {
        self.ensure_open()?;
        self.key_path(collection)?;
        let data = self.read_guard()?;
        Ok(data
            .get(collection)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, key: &str) -> MenderResult<Option<Record>> {
        self.ensure_open()?;
        self.key_path(collection)?;
        let data = self.read_guard()?;
        Ok(data.get(collection).and_then(|b| b.get(key)).cloned())
    }

    async fn put(&self, collection: &str, record: Record) -> MenderResult<()> {
        self.ensure_open()?;
        self.apply(vec![WriteOp::put(collection, record)])
    }

    async fn delete(&self, collection: &str, key: &str) -> MenderResult<bool> {
        self.ensure_open()?;
        self.key_path(collection)?;
        let mut data = self.write_guard()?;
        Ok(data
            .get_mut(collection)
            .and_then(|b| b.remove(key))
            .is_some())
    }

    async fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> MenderResult<()> {
        self.ensure_open()?;
        validate_ops(scope, mode, &ops)?;
        if ops.is_empty() {
            return Ok(());
        }
        self.apply(ops)
    }
}

impl StorageHealthProbe for MemoryStore {
    async fn probe(&self) -> MenderResult<StorageHealth> {
        self.ensure_open()?;
        let start = Instant::now();
        let data = self.read_guard()?;
        let usage_bytes = usage_of(&data);
        let record_count = data.values().map(BTreeMap::len).sum();
        drop(data);
        Ok(StorageHealth {
            usage_bytes,
            quota_bytes: self.quota_bytes,
            latency_ms: start.elapsed().as_secs_f64() * 1000.0,
            record_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(SchemaRegistry::default_catalog()))
    }

    #[tokio::test]
    async fn put_get_delete() {
        let s = store();
        s.put("problems", json!({"id": "p1", "title": "Two Sum"}))
            .await
            .unwrap();
        let got = s.get("problems", "p1").await.unwrap().unwrap();
        assert_eq!(got["title"], "Two Sum");
        assert!(s.delete("problems", "p1").await.unwrap());
        assert!(!s.delete("problems", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn unknown_collection_rejected() {
        let err = store().get_all("nope").await.unwrap_err();
        assert!(matches!(
            err,
            MenderError::Store(StoreError::UnknownCollection { .. })
        ));
    }

    #[tokio::test]
    async fn failed_transaction_leaves_no_trace() {
        let s = store();
        let ops = vec![
            WriteOp::put("problems", json!({"id": "p1"})),
            WriteOp::put("problems", json!({"title": "no key"})),
        ];
        assert!(s
            .transaction(&["problems"], TransactionMode::ReadWrite, ops)
            .await
            .is_err());
        assert!(s.get_all("problems").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn quota_exceeded_is_not_retryable() {
        let s = store().with_quota(20);
        let err = s
            .put("problems", json!({"id": "p1", "title": "a long enough title"}))
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(s.get_all("problems").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_fails_with_connectivity() {
        let s = store();
        s.close();
        let err = s.get_all("problems").await.unwrap_err();
        assert!(err.is_retryable());
        s.open().await.unwrap();
        assert!(s.get_all("problems").await.is_ok());
    }
}
