use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::MenderResult;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    ReadOnly,
    ReadWrite,
}

/// One mutation inside a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    Put { collection: String, record: Record },
    Delete { collection: String, key: String },
}

impl WriteOp {
    pub fn put(collection: &str, record: Record) -> Self {
        Self::Put {
            collection: collection.to_string(),
            record,
        }
    }

    pub fn delete(collection: &str, key: &str) -> Self {
        Self::Delete {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Self::Put { collection, .. } | Self::Delete { collection, .. } => collection,
        }
    }
}

/// Transactional document store.
///
/// Every collection is keyed by its declared key path. `get_all` returns records
/// in key order. A transaction applies all of its ops or none of them.
pub trait DocumentStore: Send + Sync {
    fn open(&self) -> impl Future<Output = MenderResult<()>> + Send;

    fn collections(&self) -> Vec<String>;

    fn get_all(&self, collection: &str) -> impl Future<Output = MenderResult<Vec<Record>>> + Send;

    fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = MenderResult<Option<Record>>> + Send;

    fn put(&self, collection: &str, record: Record) -> impl Future<Output = MenderResult<()>> + Send;

    /// Returns whether a record was removed.
    fn delete(&self, collection: &str, key: &str)
        -> impl Future<Output = MenderResult<bool>> + Send;

    /// Every op must target a collection in `scope`; writes require `ReadWrite`.
    fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> impl Future<Output = MenderResult<()>> + Send;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    fn open(&self) -> impl Future<Output = MenderResult<()>> + Send {
        (**self).open()
    }

    fn collections(&self) -> Vec<String> {
        (**self).collections()
    }

    fn get_all(&self, collection: &str) -> impl Future<Output = MenderResult<Vec<Record>>> + Send {
        (**self).get_all(collection)
    }

    fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = MenderResult<Option<Record>>> + Send {
        (**self).get(collection, key)
    }

    fn put(&self, collection: &str, record: Record) -> impl Future<Output = MenderResult<()>> + Send {
        (**self).put(collection, record)
    }

    fn delete(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = MenderResult<bool>> + Send {
        (**self).delete(collection, key)
    }

    fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> impl Future<Output = MenderResult<()>> + Send {
        (**self).transaction(scope, mode, ops)
    }
}
