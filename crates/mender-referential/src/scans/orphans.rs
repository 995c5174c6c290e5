use std::collections::HashSet;

use serde_json::Value;

use mender_core::models::{Severity, Violation, ViolationType};
use mender_core::record::Record;
use mender_core::schema::ReverseConstraint;

use super::{key_set, record_key};

/// Records of `collection` that no record of the constraint's source references.
pub fn scan_orphans(
    collection: &str,
    key_path: &str,
    constraint: &ReverseConstraint,
    records: &[Record],
    source_records: &[Record],
) -> Vec<Violation> {
    let referenced: HashSet<String> = key_set(source_records, &constraint.source_field);
    let field = format!("{}.{}", constraint.source_collection, constraint.source_field);

    records
        .iter()
        .map(|r| record_key(r, key_path))
        .filter(|key| !referenced.contains(key))
        .map(|key| {
            Violation::new(
                ViolationType::OrphanedRecord,
                collection,
                &key,
                &field,
                Value::String(key.clone()),
                Severity::Warning,
                format!("{collection}/{key} is not referenced by any {field}"),
            )
        })
        .collect()
}
