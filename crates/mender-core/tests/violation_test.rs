use mender_core::models::*;
use serde_json::json;

#[test]
fn same_defect_yields_same_id() {
    let a = Violation::new(
        ViolationType::MissingReference,
        "attempts",
        "a1",
        "problem_id",
        json!("p404"),
        Severity::Critical,
        "first".into(),
    );
    let b = Violation::new(
        ViolationType::MissingReference,
        "attempts",
        "a1",
        "problem_id",
        json!("p404"),
        Severity::Critical,
        "second sighting".into(),
    );
    assert_eq!(a.id, b.id);
    assert_eq!(a.id.len(), 16);
}

#[test]
fn different_value_yields_different_id() {
    let a = Violation::compute_id(
        ViolationType::MissingReference,
        "attempts",
        "a1",
        "problem_id",
        &json!("p1"),
    );
    let b = Violation::compute_id(
        ViolationType::MissingReference,
        "attempts",
        "a1",
        "problem_id",
        &json!("p2"),
    );
    assert_ne!(a, b);
}

#[test]
fn violation_serializes_type_field() {
    let v = Violation::new(
        ViolationType::OrphanedRecord,
        "sessions",
        "s1",
        "id",
        json!("s1"),
        Severity::Warning,
        "orphan".into(),
    );
    let value = serde_json::to_value(&v).unwrap();
    assert_eq!(value["type"], "orphaned_record");
    assert_eq!(value["severity"], "warning");
    assert!(value.get("path").is_none());
}

#[test]
fn summary_counts_by_type_and_severity() {
    let mk = |t, s| Violation::new(t, "c", "r", "f", json!(1), s, String::new());
    let summary = ViolationSummary::from_violations(&[
        mk(ViolationType::MissingReference, Severity::Critical),
        mk(ViolationType::MissingReference, Severity::Warning),
        mk(ViolationType::CircularReference, Severity::Warning),
    ]);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.count_type(ViolationType::MissingReference), 2);
    assert_eq!(summary.critical(), 1);
    assert_eq!(summary.warnings(), 2);
}
