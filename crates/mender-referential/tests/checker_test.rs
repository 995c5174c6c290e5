use std::sync::Arc;

use serde_json::json;

use mender_core::models::{
    CheckAllOptions, RepairAction, RepairOptions, RepairStrategy, RepairSuggestion, RiskLevel,
    Severity, ViolationType,
};
use mender_core::schema::{CollectionSchema, FieldType, SchemaRegistry};
use mender_core::traits::DocumentStore;
use mender_referential::ReferentialChecker;
use mender_storage::memory::MemoryStore;
use test_fixtures::builders::{attempt, completed_session, day, problem, session_analytics};
use test_fixtures::{memory_store, scenario_store, FlakyStore};

fn deep() -> CheckAllOptions {
    CheckAllOptions {
        deep_check: true,
        ..Default::default()
    }
}

fn checker(store: &Arc<MemoryStore>) -> ReferentialChecker<MemoryStore> {
    ReferentialChecker::with_defaults(
        Arc::clone(store),
        Arc::new(SchemaRegistry::default_catalog()),
    )
}

#[tokio::test]
async fn golden_scenario_finds_one_defect_of_each_kind() {
    let (store, scenario) = scenario_store("scenarios/broken_references.json");
    let report = checker(&store).check_all(&[], &deep()).await.unwrap();

    assert_eq!(report.violations.len(), 4);
    assert_eq!(report.summary.count_type(ViolationType::MissingReference), 2);
    assert_eq!(report.summary.count_type(ViolationType::OrphanedRecord), 1);
    assert_eq!(report.summary.count_type(ViolationType::CircularReference), 1);

    let critical = report
        .violations
        .iter()
        .find(|v| v.severity == Severity::Critical)
        .unwrap();
    let expected = &scenario["expected"]["missing_critical"][0];
    assert_eq!(critical.collection, expected[0]);
    assert_eq!(critical.record_id, expected[1]);
    assert_eq!(critical.field, expected[2]);
    assert_eq!(critical.value, expected[3]);

    let cycle = report
        .violations
        .iter()
        .find(|v| v.violation_type == ViolationType::CircularReference)
        .unwrap();
    let expected_path: Vec<String> =
        serde_json::from_value(scenario["expected"]["cycle_path"].clone()).unwrap();
    assert_eq!(cycle.path.as_ref(), Some(&expected_path));

    // 6 foreign keys + 1 reverse constraint + 2 graphs; weighted 3 + 1 + 1 + 1
    assert_eq!(report.constraints_checked, 9);
    assert!((report.score - 100.0 * (1.0 - 6.0 / 27.0)).abs() < 1e-9);
    assert_eq!(report.suggestions.len(), 4);
}

#[tokio::test]
async fn cycles_are_only_checked_on_deep_passes() {
    let (store, _) = scenario_store("scenarios/broken_references.json");
    let report = checker(&store)
        .check_all(&["problem_relationships"], &CheckAllOptions::default())
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(report.constraints_checked, 2);
}

#[tokio::test]
async fn repaired_optional_reference_disappears_from_the_next_check() {
    let store = memory_store();
    store.seed("problems", vec![problem("p1", "Easy", &["array"])]).unwrap();
    store
        .seed(
            "attempts",
            vec![attempt("a1", "p1", Some("s-gone"), true, 60.0, day(2026, 1, 10))],
        )
        .unwrap();
    let checker = checker(&store);

    let before = checker.check_all(&["attempts"], &CheckAllOptions::default()).await.unwrap();
    assert_eq!(before.violations.len(), 1);
    assert_eq!(before.suggestions[0].strategy, RepairStrategy::SetNull);

    let result = checker
        .execute_repairs(&before.suggestions, &RepairOptions::default())
        .await
        .unwrap();
    assert_eq!(result.successful, 1);
    assert!(result.backup_id.is_some());

    let after = checker.check_all(&["attempts"], &CheckAllOptions::default()).await.unwrap();
    assert!(after.is_clean());
    assert!(!after.from_cache);
    let a1 = store.get("attempts", "a1").await.unwrap().unwrap();
    assert!(a1["session_id"].is_null());
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let (store, _) = scenario_store("scenarios/broken_references.json");
    let checker = checker(&store);
    let report = checker.check_all(&[], &deep()).await.unwrap();
    let before = store.usage_bytes().unwrap();

    let result = checker
        .execute_repairs(
            &report.suggestions,
            &RepairOptions {
                dry_run: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(result.dry_run);
    assert_eq!(result.attempted, 2);
    assert!(result.backup_id.is_none());
    assert!(result.outcomes.iter().all(|o| o.description.starts_with("would ")));
    assert_eq!(store.usage_bytes().unwrap(), before);
    assert!(checker.backups().list().is_empty());
}

#[tokio::test]
async fn manual_review_suggestions_are_skipped() {
    let (store, _) = scenario_store("scenarios/broken_references.json");
    let checker = checker(&store);
    let report = checker.check_all(&[], &deep()).await.unwrap();

    let result = checker
        .execute_repairs(&report.suggestions, &RepairOptions::default())
        .await
        .unwrap();

    // set_null on problems/p2 and delete of the orphan session
    assert_eq!(result.attempted, 2);
    assert_eq!(result.successful, 2);
    assert_eq!(result.skipped, 2);
    assert!(store.get("sessions", "s-orphan").await.unwrap().is_none());
}

#[tokio::test]
async fn backup_restores_what_a_repair_deleted() {
    let (store, _) = scenario_store("scenarios/broken_references.json");
    let checker = checker(&store);
    let report = checker.check_all(&["sessions"], &CheckAllOptions::default()).await.unwrap();
    let result = checker
        .execute_repairs(&report.suggestions, &RepairOptions::default())
        .await
        .unwrap();
    assert!(store.get("sessions", "s-orphan").await.unwrap().is_none());

    checker
        .backups()
        .restore(result.backup_id.as_deref().unwrap())
        .await
        .unwrap();
    assert!(store.get("sessions", "s-orphan").await.unwrap().is_some());
}

#[tokio::test]
async fn repeated_checks_are_served_from_cache() {
    let (store, _) = scenario_store("scenarios/broken_references.json");
    let checker = checker(&store);
    let first = checker.check_all(&[], &deep()).await.unwrap();
    let second = checker.check_all(&[], &deep()).await.unwrap();
    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(first.violations, second.violations);

    let uncached = checker
        .check_all(
            &[],
            &CheckAllOptions {
                use_cache: false,
                ..deep()
            },
        )
        .await
        .unwrap();
    assert!(!uncached.from_cache);

    checker.invalidate_cache();
    assert!(!checker.check_all(&[], &deep()).await.unwrap().from_cache);
}

#[tokio::test]
async fn each_collection_is_read_once_per_pass() {
    let flaky = Arc::new(FlakyStore::new(memory_store()));
    let checker = ReferentialChecker::with_defaults(
        Arc::clone(&flaky),
        Arc::new(SchemaRegistry::default_catalog()),
    );
    checker
        .check_all(
            &["attempts"],
            &CheckAllOptions {
                include_orphans: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    // attempts, problems, sessions
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn cascade_delete_removes_dependents() {
    let store = memory_store();
    store.seed("problems", vec![problem("p1", "Easy", &["array"])]).unwrap();
    store.seed("sessions", vec![completed_session("s1", day(2026, 1, 10))]).unwrap();
    store
        .seed(
            "attempts",
            vec![
                attempt("a1", "p1", Some("s1"), true, 60.0, day(2026, 1, 10)),
                attempt("a2", "p1", None, true, 60.0, day(2026, 1, 10)),
            ],
        )
        .unwrap();
    store.seed("session_analytics", vec![session_analytics("s1")]).unwrap();
    let checker = checker(&store);

    let cascade = RepairSuggestion {
        violation_id: "manual".into(),
        strategy: RepairStrategy::CascadeDelete,
        automated: true,
        risk: RiskLevel::High,
        action: RepairAction::CascadeDelete {
            collection: "sessions".into(),
            key: "s1".into(),
        },
    };
    let result = checker
        .execute_repairs(&[cascade], &RepairOptions::default())
        .await
        .unwrap();

    assert_eq!(result.successful, 1);
    assert!(store.get("sessions", "s1").await.unwrap().is_none());
    assert!(store.get("attempts", "a1").await.unwrap().is_none());
    assert!(store.get("attempts", "a2").await.unwrap().is_some());
    assert!(store.get_all("session_analytics").await.unwrap().is_empty());
    let backup = checker.backups().latest().unwrap();
    assert_eq!(
        backup.collections_included,
        vec!["attempts", "session_analytics", "sessions"]
    );
}

#[tokio::test]
async fn failed_repair_does_not_abort_the_batch() {
    let store = memory_store();
    store.seed("sessions", vec![completed_session("s1", day(2026, 1, 10))]).unwrap();
    let checker = checker(&store);
    let delete = |key: &str| RepairSuggestion {
        violation_id: key.into(),
        strategy: RepairStrategy::DeleteOrphan,
        automated: true,
        risk: RiskLevel::Medium,
        action: RepairAction::DeleteRecord {
            collection: "sessions".into(),
            key: key.into(),
        },
    };
    let result = checker
        .execute_repairs(&[delete("gone"), delete("s1")], &RepairOptions::default())
        .await
        .unwrap();
    assert_eq!(result.attempted, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.successful, 1);
    assert!(result.outcomes[0].error.as_deref().unwrap().contains("no longer exists"));
}

#[tokio::test]
async fn dangling_key_in_an_array_reference_is_removed_alone() {
    let registry = Arc::new(
        SchemaRegistry::new()
            .with(CollectionSchema::new("problems", "id"))
            .with(
                CollectionSchema::new("ladders", "id")
                    .optional("problem_ids", FieldType::Array)
                    .foreign_key_many("problem_ids", "problems", "id"),
            ),
    );
    let store = Arc::new(MemoryStore::new(Arc::clone(&registry)));
    store
        .seed("problems", vec![json!({"id": "p1"}), json!({"id": "p2"})])
        .unwrap();
    store
        .seed("ladders", vec![json!({"id": "l1", "problem_ids": ["p1", "p2", "p9"]})])
        .unwrap();
    let checker = ReferentialChecker::with_defaults(Arc::clone(&store), registry);

    let before = checker.check_all(&[], &CheckAllOptions::default()).await.unwrap();
    assert_eq!(before.violations.len(), 1);
    assert_eq!(before.suggestions[0].strategy, RepairStrategy::RemoveReference);

    let result = checker
        .execute_repairs(&before.suggestions, &RepairOptions::default())
        .await
        .unwrap();
    assert_eq!(result.successful, 1);

    let l1 = store.get("ladders", "l1").await.unwrap().unwrap();
    assert_eq!(l1["problem_ids"], json!(["p1", "p2"]));
    let after = checker.check_all(&[], &CheckAllOptions::default()).await.unwrap();
    assert!(after.is_clean());
}
