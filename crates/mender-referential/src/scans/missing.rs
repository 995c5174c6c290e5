use std::collections::HashSet;

use serde_json::Value;

use mender_core::models::{Severity, Violation, ViolationType};
use mender_core::record::{get_path, referenced_keys, Record};
use mender_core::schema::ForeignKey;

use super::record_key;

/// Foreign-key values in `records` with no matching key in `target_keys`.
///
/// A required key that is absent or null is itself a critical missing
/// reference; an optional one is skipped.
pub fn scan_missing(
    collection: &str,
    key_path: &str,
    fk: &ForeignKey,
    records: &[Record],
    target_keys: &HashSet<String>,
) -> Vec<Violation> {
    let severity = if fk.required {
        Severity::Critical
    } else {
        Severity::Warning
    };
    let mut violations = Vec::new();

    for record in records {
        let record_id = record_key(record, key_path);
        let value = match get_path(record, &fk.field) {
            None | Some(Value::Null) => {
                if fk.required {
                    violations.push(Violation::new(
                        ViolationType::MissingReference,
                        collection,
                        &record_id,
                        &fk.field,
                        Value::Null,
                        Severity::Critical,
                        format!(
                            "{collection}/{record_id}: required reference `{}` to {} is missing",
                            fk.field, fk.collection
                        ),
                    ));
                }
                continue;
            }
            Some(value) => value,
        };

        for key in referenced_keys(value) {
            if target_keys.contains(&key) {
                continue;
            }
            violations.push(Violation::new(
                ViolationType::MissingReference,
                collection,
                &record_id,
                &fk.field,
                Value::String(key.clone()),
                severity,
                format!(
                    "{collection}/{record_id}.{} references {}.{} = {key}, which does not exist",
                    fk.field, fk.collection, fk.target_field
                ),
            ));
        }
    }
    violations
}
