use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use mender_core::errors::{MenderError, MenderResult, StoreError};
use mender_core::models::StorageHealth;
use mender_core::record::Record;
use mender_core::traits::{DocumentStore, StorageHealthProbe, TransactionMode, WriteOp};

/// Store wrapper that fails the next `n` calls, optionally after a delay.
///
/// Every call counts towards [`calls`](Self::calls), failed or not.
pub struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicU32,
    error: Mutex<MenderError>,
    latency: Duration,
    calls: AtomicUsize,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(0),
            error: Mutex::new(
                StoreError::Connectivity {
                    reason: "injected fault".to_string(),
                }
                .into(),
            ),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the first `n` calls with a connectivity error.
    pub fn failing(self, n: u32) -> Self {
        self.fail_next(n);
        self
    }

    /// Fail the first `n` calls with `error`.
    pub fn failing_with(self, n: u32, error: MenderError) -> Self {
        *self.error.lock().unwrap_or_else(|e| e.into_inner()) = error;
        self.failing(n)
    }

    pub fn always_failing(self) -> Self {
        self.failing(u32::MAX)
    }

    /// Sleep this long (tokio time) before answering each call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fail_next(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_next(0);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn before(&self) -> MenderResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(self.error.lock().unwrap_or_else(|e| e.into_inner()).clone());
        }
        Ok(())
    }
}

impl<S: DocumentStore> DocumentStore for FlakyStore<S> {
    async fn open(&self) -> MenderResult<()> {
        self.before().await?;
        self.inner.open().await
    }

    fn collections(&self) -> Vec<String> {
        self.inner.collections()
    }

    async fn get_all(&self, collection: &str) -> MenderResult<Vec<Record>> {
        self.before().await?;
        self.inner.get_all(collection).await
    }

    async fn get(&self, collection: &str, key: &str) -> MenderResult<Option<Record>> {
        self.before().await?;
        self.inner.get(collection, key).await
    }

    async fn put(&self, collection: &str, record: Record) -> MenderResult<()> {
        self.before().await?;
        self.inner.put(collection, record).await
    }

    async fn delete(&self, collection: &str, key: &str) -> MenderResult<bool> {
        self.before().await?;
        self.inner.delete(collection, key).await
    }

    async fn transaction(
        &self,
        scope: &[&str],
        mode: TransactionMode,
        ops: Vec<WriteOp>,
    ) -> MenderResult<()> {
        self.before().await?;
        self.inner.transaction(scope, mode, ops).await
    }
}

impl<S: StorageHealthProbe> StorageHealthProbe for FlakyStore<S> {
    async fn probe(&self) -> MenderResult<StorageHealth> {
        self.before().await?;
        self.inner.probe().await
    }
}
