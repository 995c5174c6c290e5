//! File-backed SqliteStore tests: restart survival, atomic transactions,
//! quota, close/reopen, and file-level backups.

use std::sync::Arc;

use mender_core::config::StorageConfig;
use mender_core::errors::{MenderError, StoreError};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, StorageHealthProbe, TransactionMode, WriteOp};
use mender_storage::migrations::LATEST_VERSION;
use mender_storage::SqliteStore;
use serde_json::json;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::default_catalog())
}

#[tokio::test]
async fn records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("survive.db");
    let config = StorageConfig::default();

    {
        let store = SqliteStore::open_path(&db_path, registry(), &config).unwrap();
        store
            .put("problems", json!({"id": "p1", "title": "Two Sum"}))
            .await
            .unwrap();
        store
            .put("problems", json!({"id": "p2", "title": "Three Sum"}))
            .await
            .unwrap();
    }

    let store = SqliteStore::open_path(&db_path, registry(), &config).unwrap();
    let all = store.get_all("problems").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["id"], "p1");
    assert_eq!(store.schema_version().await.unwrap(), LATEST_VERSION);
    assert!(store.integrity_check().await.unwrap());
}

#[tokio::test]
async fn failing_transaction_rolls_back() {
    let store = SqliteStore::open_in_memory(registry(), &StorageConfig::default()).unwrap();
    store.put("problems", json!({"id": "p1"})).await.unwrap();

    let ops = vec![
        WriteOp::delete("problems", "p1"),
        WriteOp::put("problems", json!({"no_id": true})),
    ];
    let err = store
        .transaction(&["problems"], TransactionMode::ReadWrite, ops)
        .await
        .unwrap_err();
    assert!(matches!(err, MenderError::Store(StoreError::InvalidKey { .. })));
    assert!(store.get("problems", "p1").await.unwrap().is_some());
}

#[tokio::test]
async fn read_only_transaction_rejects_writes() {
    let store = SqliteStore::open_in_memory(registry(), &StorageConfig::default()).unwrap();
    let err = store
        .transaction(
            &["problems"],
            TransactionMode::ReadOnly,
            vec![WriteOp::put("problems", json!({"id": "p1"}))],
        )
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn closed_store_is_a_connectivity_error_until_reopened() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SqliteStore::open_path(&dir.path().join("c.db"), registry(), &StorageConfig::default())
            .unwrap();
    store
        .put(
            "sessions",
            json!({"id": "s1", "date": "2024-03-01T10:00:00Z", "status": "completed"}),
        )
        .await
        .unwrap();
    store.close().await;
    let err = store.get_all("sessions").await.unwrap_err();
    assert!(err.is_retryable());

    store.open().await.unwrap();
    assert_eq!(store.get_all("sessions").await.unwrap().len(), 1);
}

#[tokio::test]
async fn tiny_quota_rejects_writes() {
    let config = StorageConfig {
        quota_bytes: 1,
        ..Default::default()
    };
    let store = SqliteStore::open_in_memory(registry(), &config).unwrap();
    let err = store.put("problems", json!({"id": "p1"})).await.unwrap_err();
    assert!(matches!(err, MenderError::Store(StoreError::QuotaExceeded { .. })));
}

#[tokio::test]
async fn file_backup_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let store =
        SqliteStore::open_path(&dir.path().join("live.db"), registry(), &StorageConfig::default())
            .unwrap();
    store.put("problems", json!({"id": "p1"})).await.unwrap();

    let backup_path = dir.path().join("backup.db");
    let id = store.backup_to_file(&backup_path).await.unwrap();
    assert!(backup_path.exists());

    store.put("problems", json!({"id": "p2"})).await.unwrap();
    store.delete("problems", "p1").await.unwrap();

    store.restore_from_file(&backup_path).await.unwrap();
    let keys: Vec<String> = store
        .get_all("problems")
        .await
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["p1"]);
    assert!(!id.is_empty());
}

#[tokio::test]
async fn health_probe_reports_size_and_count() {
    let store = SqliteStore::open_in_memory(registry(), &StorageConfig::default()).unwrap();
    store.put("problems", json!({"id": "p1"})).await.unwrap();
    let health = store.probe().await.unwrap();
    assert_eq!(health.record_count, 1);
    assert!(health.usage_bytes > 0);
    assert_eq!(health.quota_bytes, StorageConfig::default().quota_bytes);
}
