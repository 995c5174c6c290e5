use std::collections::BTreeMap;
use std::sync::Arc;

use mender_core::config::StorageConfig;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, TransactionMode, WriteOp};
use mender_storage::{MemoryStore, SqliteStore};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Put(String, i64),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        ("[a-e]", any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        "[a-e]".prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn both_stores_agree_with_a_model(ops in prop::collection::vec(op_strategy(), 0..20)) {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async {
            let registry = Arc::new(SchemaRegistry::default_catalog());
            let memory = MemoryStore::new(registry.clone());
            let sqlite = SqliteStore::open_in_memory(registry, &StorageConfig::default()).unwrap();
            let mut model = BTreeMap::new();

            for op in &ops {
                let write = match op {
                    Op::Put(k, v) => {
                        model.insert(k.clone(), *v);
                        WriteOp::put("problems", json!({"id": k, "v": v}))
                    }
                    Op::Delete(k) => {
                        model.remove(k);
                        WriteOp::delete("problems", k)
                    }
                };
                memory.transaction(&["problems"], TransactionMode::ReadWrite, vec![write.clone()]).await.unwrap();
                sqlite.transaction(&["problems"], TransactionMode::ReadWrite, vec![write]).await.unwrap();
            }

            let expected: Vec<_> = model.iter().map(|(k, v)| json!({"id": k, "v": v})).collect();
            assert_eq!(memory.get_all("problems").await.unwrap(), expected);
            assert_eq!(sqlite.get_all("problems").await.unwrap(), expected);
        });
    }
}
