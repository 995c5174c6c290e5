use std::collections::HashMap;
use std::sync::Arc;

use mender_core::errors::{MenderResult, ReconstructionError};
use mender_core::record::Record;
use mender_core::traits::DocumentStore;

/// Source snapshots shared across the types of one `reconstruct_data` call.
/// Collections a type writes are dropped so later types re-read them.
#[derive(Default)]
pub(crate) struct Sources {
    loaded: HashMap<String, Arc<Vec<Record>>>,
}

impl Sources {
    pub(crate) async fn ensure<S: DocumentStore>(
        &mut self,
        store: &S,
        collections: &[&str],
    ) -> MenderResult<()> {
        for collection in collections {
            if self.loaded.contains_key(*collection) {
                continue;
            }
            let records = store.get_all(collection).await.map_err(|e| {
                ReconstructionError::SourceUnavailable {
                    collection: collection.to_string(),
                    reason: e.to_string(),
                }
            })?;
            self.loaded
                .insert(collection.to_string(), Arc::new(records));
        }
        Ok(())
    }

    pub(crate) fn invalidate(&mut self, collections: &[&str]) {
        for collection in collections {
            self.loaded.remove(*collection);
        }
    }

    pub(crate) fn get(&self, collection: &str) -> &[Record] {
        self.loaded
            .get(collection)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }
}
