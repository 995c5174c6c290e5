//! Shared test support for the mender workspace: golden scenario loader,
//! record builders, a fault-injecting store and a recording error sink.

pub mod builders;
mod flaky;
mod sink;

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use mender_core::schema::SchemaRegistry;
use mender_storage::memory::MemoryStore;

pub use flaky::FlakyStore;
pub use sink::RecordingErrorSink;

/// Root directory of the golden fixtures.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON Value.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

/// List all JSON files in a fixture subdirectory, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension()
                .is_some_and(|ext| ext == "json")
                .then_some(path)
        })
        .collect();
    paths.sort();
    paths
}

/// Empty `MemoryStore` over the default catalog.
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(Arc::new(SchemaRegistry::default_catalog())))
}

/// `MemoryStore` seeded from a scenario's `collections` object.
///
/// Scenario layout: `{"description": .., "collections": {name: [records]}, "expected": {..}}`.
pub fn scenario_store(relative_path: &str) -> (Arc<MemoryStore>, serde_json::Value) {
    let scenario = load_fixture_value(relative_path);
    let store = memory_store();
    if let Some(collections) = scenario["collections"].as_object() {
        for (name, records) in collections {
            let records = records.as_array().cloned().unwrap_or_default();
            store
                .seed(name, records)
                .unwrap_or_else(|e| panic!("Failed to seed {name} from {relative_path}: {e}"));
        }
    }
    (store, scenario)
}
