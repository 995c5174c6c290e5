//! `DocumentStore` decorator that routes every call through a `RetryExecutor`.
//!
//! Reads are deduplicated on `"{op}:{collection}[:{key}]"`. Writes never are.

use std::sync::Arc;

use mender_core::errors::MenderResult;
use mender_core::models::{Priority, StorageHealth};
use mender_core::record::Record;
use mender_core::traits::{DocumentStore, StorageHealthProbe, TransactionMode, WriteOp};

use crate::executor::{RetryExecutor, RetryOptions};

pub struct ResilientStore<S> {
    store: Arc<S>,
    executor: Arc<RetryExecutor>,
    priority: Priority,
}

impl<S> Clone for ResilientStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            executor: Arc::clone(&self.executor),
            priority: self.priority,
        }
    }
}

impl<S: DocumentStore> ResilientStore<S> {
    pub fn new(store: Arc<S>, executor: Arc<RetryExecutor>) -> Self {
        Self {
            store,
            executor,
            priority: Priority::Normal,
        }
    }

    /// Same store and executor, different backoff priority.
    pub fn with_priority(&self, priority: Priority) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }

    pub fn executor(&self) -> &Arc<RetryExecutor> {
        &self.executor
    }

    fn options(&self, operation: &str) -> RetryOptions {
        RetryOptions::named(operation).priority(self.priority)
    }
}

impl<S: DocumentStore> DocumentStore for ResilientStore<S> {
    async fn open(&self) -> MenderResult<()> {
        let store = &self.store;
        self.executor
            .execute_with_retry(move || store.open(), self.options("open"))
            .await
    }

    fn collections(&self) -> Vec<String> {
        self.store.collections()
    }

    async fn get_all(&self, collection: &str) -> MenderResult<Vec<Record>> {
        let store = &self.store;
        let options = self
            .options("get_all")
            .dedup(format!("get_all:{collection}"));
        self.executor
            .execute_with_retry(move || store.get_all(collection), options)
            .await
    }

    async fn get(&self, collection: &str, key: &str) -> MenderResult<Option<Record>> {
        let store = &self.store;
        let options = self
            .options("get")
            .dedup(format!("get:{collection}:{key}"));
        self.executor
            .execute_with_retry(move || store.get(collection, key), options)
            .await
    }

    async fn put(&self, collection: &str, record: Record) -> MenderResult<()> {
        let store = &self.store;
        self.executor
            .execute_with_retry(
                move || store.put(collection, record.clone()),
                self.options("put"),
            )
            .await
    }

    async fn delete(&self, collection: &str, key: &str) -> MenderResult<bool> {
        let store = &self.store;
        self.executor
            .execute_with_retry(move || store.delete(collection, key), self.options("delete"))
            .await
    }

    async fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> MenderResult<()> {
        let store = &self.store;
        self.executor
            .execute_with_retry(
                move || store.transaction(scope, mode, ops.clone()),
                self.options("transaction"),
            )
            .await
    }
}

impl<S: DocumentStore + StorageHealthProbe> StorageHealthProbe for ResilientStore<S> {
    async fn probe(&self) -> MenderResult<StorageHealth> {
        let store = &self.store;
        self.executor
            .execute_with_retry(move || store.probe(), self.options("probe").dedup("probe"))
            .await
    }
}
