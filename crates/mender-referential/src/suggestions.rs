use mender_core::models::{
    RepairAction, RepairStrategy, RepairSuggestion, RiskLevel, Severity, Violation, ViolationType,
};
use mender_core::schema::SchemaRegistry;

/// Map each violation to a repair.
///
/// | violation | strategy | automated | risk |
/// |---|---|---|---|
/// | missing, required | manual_review | no | high |
/// | missing, optional | set_null | yes | low |
/// | missing, optional, array-valued | remove_reference | yes | low |
/// | orphan | delete_orphan | yes | medium |
/// | cycle | manual_review | no | high |
pub fn generate_repair_suggestions(
    violations: &[Violation],
    registry: &SchemaRegistry,
) -> Vec<RepairSuggestion> {
    violations.iter().map(|v| suggest(v, registry)).collect()
}

/// The violating field is declared as an array of keys.
fn is_many(registry: &SchemaRegistry, v: &Violation) -> bool {
    registry.get(&v.collection).is_some_and(|schema| {
        schema
            .foreign_keys
            .iter()
            .any(|fk| fk.many && fk.field == v.field)
    })
}

fn suggest(v: &Violation, registry: &SchemaRegistry) -> RepairSuggestion {
    let manual = |note: String| RepairSuggestion {
        violation_id: v.id.clone(),
        strategy: RepairStrategy::ManualReview,
        automated: false,
        risk: RiskLevel::High,
        action: RepairAction::ManualReview { note },
    };

    match (v.violation_type, v.severity) {
        (ViolationType::MissingReference, Severity::Critical) => manual(v.message.clone()),
        (ViolationType::MissingReference, Severity::Warning) if is_many(registry, v) => {
            RepairSuggestion {
                violation_id: v.id.clone(),
                strategy: RepairStrategy::RemoveReference,
                automated: true,
                risk: RiskLevel::Low,
                action: RepairAction::RemoveReference {
                    collection: v.collection.clone(),
                    key: v.record_id.clone(),
                    field: v.field.clone(),
                    value: v.value.as_str().map_or_else(|| v.value.to_string(), str::to_string),
                },
            }
        }
        (ViolationType::MissingReference, Severity::Warning) => RepairSuggestion {
            violation_id: v.id.clone(),
            strategy: RepairStrategy::SetNull,
            automated: true,
            risk: RiskLevel::Low,
            action: RepairAction::SetNull {
                collection: v.collection.clone(),
                key: v.record_id.clone(),
                field: v.field.clone(),
            },
        },
        (ViolationType::OrphanedRecord, _) => RepairSuggestion {
            violation_id: v.id.clone(),
            strategy: RepairStrategy::DeleteOrphan,
            automated: true,
            risk: RiskLevel::Medium,
            action: RepairAction::DeleteRecord {
                collection: v.collection.clone(),
                key: v.record_id.clone(),
            },
        },
        (ViolationType::CircularReference, _) => {
            let path = v.path.as_ref().map(|p| p.join(" -> ")).unwrap_or_default();
            manual(format!("break the cycle {path} in {}", v.collection))
        }
    }
}
