//! Applying repair actions. Each action runs as its own transaction scoped to
//! the collections it touches.

use std::collections::BTreeSet;

use serde_json::Value;

use mender_core::errors::{MenderResult, RepairError};
use mender_core::models::{RepairAction, RepairOptions, RepairStrategy, RepairSuggestion};
use mender_core::record::{get_path, referenced_keys, set_path};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, TransactionMode, WriteOp};

use crate::scans::record_key;

/// Suggestions eligible under `options`, plus how many were skipped.
///
/// Manual-review suggestions are never eligible.
pub fn select<'a>(
    suggestions: &'a [RepairSuggestion],
    options: &RepairOptions,
    limit: usize,
) -> (Vec<&'a RepairSuggestion>, usize) {
    let mut selected = Vec::new();
    let mut skipped = 0;
    for suggestion in suggestions {
        let eligible = suggestion.strategy != RepairStrategy::ManualReview
            && !matches!(suggestion.action, RepairAction::ManualReview { .. })
            && (!options.automated_only || suggestion.automated)
            && suggestion.risk <= options.max_risk;
        if eligible && selected.len() < limit {
            selected.push(suggestion);
        } else {
            skipped += 1;
        }
    }
    (selected, skipped)
}

/// Every collection the selected actions may write, cascade dependents included.
pub fn collections_touched(registry: &SchemaRegistry, selected: &[&RepairSuggestion]) -> Vec<String> {
    let mut touched = BTreeSet::new();
    for suggestion in selected {
        if let Some(collection) = suggestion.action.target_collection() {
            touched.insert(collection.to_string());
            if matches!(suggestion.action, RepairAction::CascadeDelete { .. }) {
                for (source, _) in registry.referencing(collection) {
                    touched.insert(source.to_string());
                }
            }
        }
    }
    touched.into_iter().collect()
}

/// Apply one action. Returns a description of what was written.
pub async fn apply_action<S: DocumentStore>(
    store: &S,
    registry: &SchemaRegistry,
    action: &RepairAction,
) -> MenderResult<String> {
    match action {
        RepairAction::SetNull {
            collection,
            key,
            field,
        } => {
            let mut record = require_record(store, collection, key).await?;
            if !set_path(&mut record, field, Value::Null) {
                return Err(RepairError::NotExecutable {
                    reason: format!("cannot set {field} on {collection}/{key}"),
                }
                .into());
            }
            store
                .transaction(
                    &[collection.as_str()],
                    TransactionMode::ReadWrite,
                    vec![WriteOp::put(collection, record)],
                )
                .await?;
            Ok(action.describe())
        }
        RepairAction::RemoveReference {
            collection,
            key,
            field,
            value,
        } => {
            let mut record = require_record(store, collection, key).await?;
            let kept = match get_path(&record, field) {
                Some(Value::Array(items)) => {
                    let kept: Vec<Value> = items
                        .iter()
                        .filter(|item| !referenced_keys(item).iter().any(|k| k == value))
                        .cloned()
                        .collect();
                    (kept.len() < items.len()).then_some(Value::Array(kept))
                }
                Some(single) if referenced_keys(single).iter().any(|k| k == value) => {
                    Some(Value::Null)
                }
                _ => None,
            };
            let Some(kept) = kept else {
                return Err(RepairError::NotExecutable {
                    reason: format!("{collection}/{key}.{field} no longer references {value}"),
                }
                .into());
            };
            if !set_path(&mut record, field, kept) {
                return Err(RepairError::NotExecutable {
                    reason: format!("cannot rewrite {field} on {collection}/{key}"),
                }
                .into());
            }
            store
                .transaction(
                    &[collection.as_str()],
                    TransactionMode::ReadWrite,
                    vec![WriteOp::put(collection, record)],
                )
                .await?;
            Ok(action.describe())
        }
        RepairAction::DeleteRecord { collection, key } => {
            require_record(store, collection, key).await?;
            store
                .transaction(
                    &[collection.as_str()],
                    TransactionMode::ReadWrite,
                    vec![WriteOp::delete(collection, key)],
                )
                .await?;
            Ok(action.describe())
        }
        RepairAction::CascadeDelete { collection, key } => {
            require_record(store, collection, key).await?;
            let mut scope: BTreeSet<String> = BTreeSet::from([collection.clone()]);
            let mut ops = Vec::new();
            for (source, fk) in registry.referencing(collection) {
                let source_schema = registry.require(source)?;
                for record in store.get_all(source).await? {
                    let points_here = get_path(&record, &fk.field)
                        .map(referenced_keys)
                        .is_some_and(|keys| keys.iter().any(|k| k == key));
                    if points_here {
                        ops.push(WriteOp::delete(
                            source,
                            &record_key(&record, &source_schema.key_path),
                        ));
                        scope.insert(source.to_string());
                    }
                }
            }
            let dependents = ops.len();
            ops.push(WriteOp::delete(collection, key));
            let scope: Vec<&str> = scope.iter().map(String::as_str).collect();
            store
                .transaction(&scope, TransactionMode::ReadWrite, ops)
                .await?;
            Ok(format!("{} ({dependents} dependents)", action.describe()))
        }
        RepairAction::ManualReview { note } => Err(RepairError::NotExecutable {
            reason: format!("manual review required: {note}"),
        }
        .into()),
    }
}

async fn require_record<S: DocumentStore>(
    store: &S,
    collection: &str,
    key: &str,
) -> MenderResult<serde_json::Value> {
    store.get(collection, key).await?.ok_or_else(|| {
        RepairError::TargetMissing {
            collection: collection.to_string(),
            key: key.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mender_core::models::RiskLevel;

    fn suggestion(strategy: RepairStrategy, automated: bool, risk: RiskLevel) -> RepairSuggestion {
        let action = match strategy {
            RepairStrategy::ManualReview => RepairAction::ManualReview { note: "n".into() },
            _ => RepairAction::DeleteRecord {
                collection: "sessions".into(),
                key: "s1".into(),
            },
        };
        RepairSuggestion {
            violation_id: "v".into(),
            strategy,
            automated,
            risk,
            action,
        }
    }

    #[test]
    fn manual_review_is_always_skipped() {
        let all = vec![suggestion(RepairStrategy::ManualReview, true, RiskLevel::Low)];
        let options = RepairOptions {
            automated_only: false,
            ..Default::default()
        };
        let (selected, skipped) = select(&all, &options, 10);
        assert!(selected.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn risk_ceiling_and_limit_apply() {
        let all = vec![
            suggestion(RepairStrategy::DeleteOrphan, true, RiskLevel::Medium),
            suggestion(RepairStrategy::SetNull, true, RiskLevel::Low),
            suggestion(RepairStrategy::SetNull, true, RiskLevel::Low),
        ];
        let options = RepairOptions {
            max_risk: RiskLevel::Low,
            ..Default::default()
        };
        let (selected, skipped) = select(&all, &options, 1);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].strategy, RepairStrategy::SetNull);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn cascade_touches_referencing_collections() {
        let registry = SchemaRegistry::default_catalog();
        let cascade = RepairSuggestion {
            violation_id: "v".into(),
            strategy: RepairStrategy::CascadeDelete,
            automated: true,
            risk: RiskLevel::High,
            action: RepairAction::CascadeDelete {
                collection: "sessions".into(),
                key: "s1".into(),
            },
        };
        let touched = collections_touched(&registry, &[&cascade]);
        assert_eq!(touched, vec!["attempts", "session_analytics", "sessions"]);
    }
}
