use mender_core::errors::{MenderResult, StoreError};
use mender_core::record::{extract_key, Record};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{TransactionMode, WriteOp};

/// A write op with its key resolved; `record: None` is a delete.
pub(crate) struct ResolvedOp {
    pub collection: String,
    pub key: String,
    pub record: Option<Record>,
}

/// Reject ops outside `scope` and writes in read-only mode before touching data.
pub(crate) fn validate_ops(
    scope: &[&str],
    mode: TransactionMode,
    ops: &[WriteOp],
) -> MenderResult<()> {
    for op in ops {
        let collection = op.collection();
        if !scope.contains(&collection) {
            return Err(StoreError::OutOfScope {
                collection: collection.to_string(),
            }
            .into());
        }
        if mode == TransactionMode::ReadOnly {
            return Err(StoreError::ReadOnlyTransaction {
                collection: collection.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Resolve keys and reject unknown collections before any write happens.
pub(crate) fn resolve_ops(
    registry: &SchemaRegistry,
    ops: Vec<WriteOp>,
) -> MenderResult<Vec<ResolvedOp>> {
    ops.into_iter()
        .map(|op| match op {
            WriteOp::Put { collection, record } => {
                let schema = registry.require(&collection)?;
                let key = extract_key(&collection, &schema.key_path, &record)?;
                Ok(ResolvedOp {
                    collection,
                    key,
                    record: Some(record),
                })
            }
            WriteOp::Delete { collection, key } => {
                registry.require(&collection)?;
                Ok(ResolvedOp {
                    collection,
                    key,
                    record: None,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn out_of_scope_op_rejected() {
        let ops = vec![WriteOp::put("attempts", json!({"id": "a1"}))];
        let err = validate_ops(&["problems"], TransactionMode::ReadWrite, &ops).unwrap_err();
        assert!(err.to_string().contains("outside the transaction scope"));
    }

    #[test]
    fn resolve_rejects_unknown_collection_and_keyless_records() {
        let registry = SchemaRegistry::default_catalog();
        assert!(resolve_ops(&registry, vec![WriteOp::delete("nope", "x")]).is_err());
        assert!(resolve_ops(&registry, vec![WriteOp::put("problems", json!({"t": 1}))]).is_err());
        let ok = resolve_ops(&registry, vec![WriteOp::put("tag_mastery", json!({"tag": "dp"}))])
            .unwrap();
        assert_eq!(ok[0].key, "dp");
    }

    #[test]
    fn read_only_rejects_writes_but_allows_empty() {
        let ops = vec![WriteOp::delete("problems", "p1")];
        assert!(validate_ops(&["problems"], TransactionMode::ReadOnly, &ops).is_err());
        assert!(validate_ops(&["problems"], TransactionMode::ReadOnly, &[]).is_ok());
    }
}
