use std::collections::HashMap;
use std::sync::Arc;

use mender_core::errors::MenderResult;
use mender_core::record::Record;
use mender_core::traits::DocumentStore;

/// Collection snapshots memoised for the duration of one pass.
pub(crate) struct Snapshots<'a, S> {
    store: &'a S,
    loaded: HashMap<String, Arc<Vec<Record>>>,
}

impl<'a, S: DocumentStore> Snapshots<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
        }
    }

    pub(crate) async fn load(&mut self, collection: &str) -> MenderResult<Arc<Vec<Record>>> {
        if let Some(records) = self.loaded.get(collection) {
            return Ok(Arc::clone(records));
        }
        let records = Arc::new(self.store.get_all(collection).await?);
        self.loaded
            .insert(collection.to_string(), Arc::clone(&records));
        Ok(records)
    }

    pub(crate) fn reads(&self) -> usize {
        self.loaded.len()
    }
}
