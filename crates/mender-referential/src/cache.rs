//! Per-collection scan cache.
//!
//! Keys are `"{collection}:{options digest}"`. Entries expire after the
//! configured TTL and are dropped wholesale after a successful repair.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use mender_core::config::ReferentialConfig;
use mender_core::models::{CheckAllOptions, Violation};

/// What one collection's scan produced.
#[derive(Debug, Clone, Default)]
pub struct CollectionScan {
    pub violations: Vec<Violation>,
    pub constraints_checked: usize,
}

pub struct ScanCache {
    cache: Cache<String, Arc<CollectionScan>>,
}

impl ScanCache {
    pub fn new(config: &ReferentialConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(Duration::from_secs(config.cache_ttl_secs))
            .build();
        Self { cache }
    }

    pub fn get(&self, collection: &str, options: &CheckAllOptions) -> Option<Arc<CollectionScan>> {
        self.cache.get(&cache_key(collection, options))
    }

    pub fn insert(&self, collection: &str, options: &CheckAllOptions, scan: Arc<CollectionScan>) {
        self.cache.insert(cache_key(collection, options), scan);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

/// Only the options that change what a scan finds take part in the key.
pub fn options_digest(options: &CheckAllOptions) -> String {
    let flags = [
        options.include_missing,
        options.include_orphans,
        options.deep_check,
    ];
    let bytes: Vec<u8> = flags.iter().map(|f| u8::from(*f)).collect();
    blake3::hash(&bytes).to_hex()[..12].to_string()
}

fn cache_key(collection: &str, options: &CheckAllOptions) -> String {
    format!("{collection}:{}", options_digest(options))
}
