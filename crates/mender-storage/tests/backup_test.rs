//! Snapshot backup/restore round trips against both stores.

use std::sync::Arc;

use mender_core::config::StorageConfig;
use mender_core::errors::MenderError;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::DocumentStore;
use mender_storage::{BackupManager, MemoryStore, SqliteStore};
use serde_json::json;

async fn round_trip<S: DocumentStore>(store: Arc<S>, registry: Arc<SchemaRegistry>) {
    store.put("problems", json!({"id": "p1", "title": "a"})).await.unwrap();
    store.put("problems", json!({"id": "p2", "title": "b"})).await.unwrap();

    let manager = BackupManager::new(store.clone(), registry, 5);
    let id = manager.create_backup(&["problems"], "test").await.unwrap();

    store.put("problems", json!({"id": "p1", "title": "changed"})).await.unwrap();
    store.delete("problems", "p2").await.unwrap();
    store.put("problems", json!({"id": "p3", "title": "new"})).await.unwrap();

    let written = manager.restore(&id).await.unwrap();
    assert_eq!(written, 2);

    let all = store.get_all("problems").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["title"], "a");
    assert_eq!(all[1]["id"], "p2");
}

#[tokio::test]
async fn memory_store_round_trip() {
    let registry = Arc::new(SchemaRegistry::default_catalog());
    let store = Arc::new(MemoryStore::new(registry.clone()));
    round_trip(store, registry).await;
}

#[tokio::test]
async fn sqlite_store_round_trip() {
    let registry = Arc::new(SchemaRegistry::default_catalog());
    let store =
        Arc::new(SqliteStore::open_in_memory(registry.clone(), &StorageConfig::default()).unwrap());
    round_trip(store, registry).await;
}

#[tokio::test]
async fn retention_evicts_oldest() {
    let registry = Arc::new(SchemaRegistry::default_catalog());
    let store = Arc::new(MemoryStore::new(registry.clone()));
    let manager = BackupManager::new(store, registry, 2);

    let first = manager.create_backup(&["problems"], "1").await.unwrap();
    manager.create_backup(&["problems"], "2").await.unwrap();
    let third = manager.create_backup(&["problems"], "3").await.unwrap();

    assert!(manager.get(&first).is_none());
    assert_eq!(manager.list().len(), 2);
    assert_eq!(manager.latest().unwrap().id, third);
}

#[tokio::test]
async fn unknown_backup_id() {
    let registry = Arc::new(SchemaRegistry::default_catalog());
    let store = Arc::new(MemoryStore::new(registry.clone()));
    let manager = BackupManager::new(store, registry, 2);
    assert!(matches!(
        manager.restore("missing").await,
        Err(MenderError::BackupNotFound { .. })
    ));
}
