//! In-flight request deduplication.
//!
//! Calls sharing a key share one `OnceCell`; the first to poll it runs the
//! operation and every other caller receives a clone of the result.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct InFlight {
    slots: DashMap<String, Slot>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join (or start) the in-flight call for `key`.
    ///
    /// Returns `None` when the key is already in flight with a different result type.
    pub fn join<T>(&self, key: &str) -> Option<Arc<OnceCell<T>>>
    where
        T: Send + Sync + 'static,
    {
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::<T>::new()) as Slot)
            .value()
            .clone();
        slot.downcast::<OnceCell<T>>().ok()
    }

    /// Release `key` if it still maps to `cell`. Safe to call from every waiter.
    pub fn release<T>(&self, key: &str, cell: &Arc<OnceCell<T>>)
    where
        T: Send + Sync + 'static,
    {
        self.slots.remove_if(key, |_, slot| {
            slot.clone()
                .downcast::<OnceCell<T>>()
                .map(|c| Arc::ptr_eq(&c, cell))
                .unwrap_or(false)
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_cell() {
        let inflight = InFlight::new();
        let a = inflight.join::<u32>("k").unwrap();
        let b = inflight.join::<u32>("k").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        inflight.release("k", &a);
        assert!(inflight.is_empty());
        inflight.release("k", &b);
    }

    #[test]
    fn type_mismatch_opts_out() {
        let inflight = InFlight::new();
        let _a = inflight.join::<u32>("k").unwrap();
        assert!(inflight.join::<String>("k").is_none());
    }

    #[test]
    fn stale_release_keeps_new_generation() {
        let inflight = InFlight::new();
        let old = inflight.join::<u32>("k").unwrap();
        inflight.release("k", &old);
        let new = inflight.join::<u32>("k").unwrap();
        inflight.release("k", &old);
        assert_eq!(inflight.len(), 1);
        inflight.release("k", &new);
        assert!(inflight.is_empty());
    }
}
