use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;

use mender_core::models::{ReconstructionOptions, ReconstructionStrategy, ReconstructionType};
use mender_core::record::get_str;
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, TagSimilarity};
use mender_reconstruction::Reconstructor;
use mender_storage::memory::MemoryStore;
use test_fixtures::builders::{attempt, completed_session, day, problem};
use test_fixtures::{memory_store, scenario_store, FlakyStore};

fn reconstructor(store: &Arc<MemoryStore>) -> Reconstructor<MemoryStore> {
    Reconstructor::with_defaults(
        Arc::clone(store),
        Arc::new(SchemaRegistry::default_catalog()),
    )
}

fn only(types: &[ReconstructionType]) -> ReconstructionOptions {
    ReconstructionOptions {
        types: types.to_vec(),
        ..Default::default()
    }
}

async fn by_key(store: &MemoryStore, collection: &str, key_field: &str) -> Vec<(String, Value)> {
    let mut records: Vec<(String, Value)> = store
        .get_all(collection)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (get_str(&r, key_field).unwrap().to_string(), r))
        .collect();
    records.sort_by(|a, b| a.0.cmp(&b.0));
    records
}

#[tokio::test]
async fn practice_store_rebuilds_every_aggregate() {
    let (store, scenario) = scenario_store("scenarios/practice_store.json");
    let expected = &scenario["expected"];
    let report = reconstructor(&store)
        .reconstruct_data(&ReconstructionOptions::default())
        .await;

    assert!(report.success, "{report:?}");
    assert_eq!(report.results.len(), 6);
    let counts: Vec<usize> = report.results.iter().map(|r| r.records_reconstructed).collect();
    // recovery, stats, mastery, analytics, ladders, relationships
    assert_eq!(counts, [0, 3, 4, 2, 4, 3]);

    for (id, problem) in by_key(&store, "problems", "id").await {
        assert_eq!(problem["attempt_stats"], expected["attempt_stats"][&id]);
        assert!(problem["box_level"].is_u64());
    }

    let mastery = by_key(&store, "tag_mastery", "tag").await;
    for (tag, record) in &mastery {
        let totals = &expected["tag_totals"][tag];
        assert_eq!(record["total_attempts"], totals[0], "{tag}");
        assert_eq!(record["successful_attempts"], totals[1], "{tag}");
    }

    let analysed: Vec<String> = by_key(&store, "session_analytics", "session_id")
        .await
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(Value::from(analysed), expected["analytics_sessions"]);

    for (id, relationship) in by_key(&store, "problem_relationships", "id").await {
        assert_eq!(relationship["relationship_type"], expected["relationships"][&id]);
    }
}

#[tokio::test]
async fn second_run_reconstructs_nothing() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let reconstructor = reconstructor(&store);
    let first = reconstructor
        .reconstruct_data(&ReconstructionOptions::default())
        .await;
    assert!(first.total_reconstructed() > 0);

    let second = reconstructor
        .reconstruct_data(&ReconstructionOptions::default())
        .await;
    assert!(second.success);
    assert_eq!(second.total_reconstructed(), 0);
    assert!(second.backup_ids.is_empty());
}

#[tokio::test]
async fn problem_stats_and_schedule() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    reconstructor(&store)
        .reconstruct_data(&only(&[ReconstructionType::ProblemStats]))
        .await;

    let p1 = store.get("problems", "p1").await.unwrap().unwrap();
    assert_eq!(p1["attempt_stats"]["TotalAttempts"], 5);
    assert_eq!(p1["attempt_stats"]["SuccessfulAttempts"], 4);
    assert_eq!(p1["attempt_stats"]["UnsuccessfulAttempts"], 1);
    // latest attempt failed: back to box 1, review a day later
    assert_eq!(p1["box_level"], 1);
    assert_eq!(p1["next_review"], "2026-01-11T10:10:00.000Z");

    let p2 = store.get("problems", "p2").await.unwrap().unwrap();
    assert_eq!(p2["box_level"], 2);
    assert_eq!(p2["next_review"], "2026-01-14T09:10:00.000Z");
}

#[tokio::test]
async fn session_analytics_values() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    reconstructor(&store)
        .reconstruct_data(&only(&[ReconstructionType::SessionAnalytics]))
        .await;

    let s1 = store.get("session_analytics", "s1").await.unwrap().unwrap();
    assert_eq!(s1["accuracy"], 0.8);
    assert_eq!(s1["total_time"], 3000.0);
    assert_eq!(s1["avg_time"], 600.0);
    assert_eq!(s1["predominant_difficulty"], "Easy");
    assert_eq!(s1["efficiency"], 0.8);
    assert_eq!(s1["improvement_areas"], serde_json::json!([]));

    // one Medium and one Hard attempt: the tie goes to Hard
    let s2 = store.get("session_analytics", "s2").await.unwrap().unwrap();
    assert_eq!(s2["predominant_difficulty"], "Hard");
    assert_eq!(s2["accuracy"], 0.5);
    assert_eq!(s2["improvement_areas"], serde_json::json!(["accuracy"]));
}

#[tokio::test]
async fn completed_session_without_attempts_is_skipped_with_a_detail() {
    let store = memory_store();
    store
        .seed("sessions", vec![completed_session("s-empty", day(2026, 1, 5))])
        .unwrap();
    let report = reconstructor(&store)
        .reconstruct_data(&only(&[ReconstructionType::SessionAnalytics]))
        .await;

    let result = report.result_for(ReconstructionType::SessionAnalytics).unwrap();
    assert_eq!(result.records_reconstructed, 0);
    assert_eq!(result.records_skipped, 1);
    assert!(result.details.iter().any(|d| d.contains("s-empty")));
}

#[tokio::test]
async fn dry_run_counts_but_writes_nothing() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let before = store.usage_bytes().unwrap();
    let reconstructor = reconstructor(&store);
    let report = reconstructor
        .reconstruct_data(&ReconstructionOptions {
            dry_run: true,
            ..Default::default()
        })
        .await;

    assert!(report.success);
    assert_eq!(report.total_reconstructed(), 16);
    assert!(report.backup_ids.is_empty());
    assert!(reconstructor.backups().list().is_empty());
    assert_eq!(store.usage_bytes().unwrap(), before);
}

#[tokio::test]
async fn every_writing_type_is_preceded_by_a_backup() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let reconstructor = reconstructor(&store);
    let report = reconstructor
        .reconstruct_data(&ReconstructionOptions::default())
        .await;

    // session recovery has nothing to write
    assert_eq!(report.backup_ids.len(), 5);
    let stats = report.result_for(ReconstructionType::ProblemStats).unwrap();
    let backup = reconstructor
        .backups()
        .get(stats.backup_id.as_deref().unwrap())
        .unwrap();
    // the snapshot predates the write
    assert!(backup.snapshot["problems"]
        .iter()
        .all(|p| p.get("attempt_stats").is_none()));
}

#[tokio::test]
async fn orphaned_attempts_are_regrouped_by_day() {
    let store = memory_store();
    store
        .seed(
            "problems",
            vec![problem("p1", "Easy", &["array"])],
        )
        .unwrap();
    store
        .seed("sessions", vec![completed_session("s1", day(2026, 1, 9))])
        .unwrap();
    let at = |d: u32, h: i64| day(2026, 1, d) + Duration::hours(h);
    store
        .seed(
            "attempts",
            vec![
                attempt("a1", "p1", Some("s1"), true, 300.0, at(9, 10)),
                attempt("a2", "p1", None, true, 300.0, at(10, 9)),
                attempt("a3", "p1", Some("ghost"), false, 300.0, at(10, 15)),
                attempt("a4", "p1", None, true, 300.0, at(11, 8)),
            ],
        )
        .unwrap();

    let report = reconstructor(&store)
        .reconstruct_data(&only(&[ReconstructionType::SessionRecovery]))
        .await;
    let result = report.result_for(ReconstructionType::SessionRecovery).unwrap();
    // two sessions plus three patched attempts
    assert_eq!(result.records_reconstructed, 5);

    let sessions = store.get_all("sessions").await.unwrap();
    assert_eq!(sessions.len(), 3);
    let recovered: Vec<&Value> = sessions.iter().filter(|s| s["recovered"] == true).collect();
    assert_eq!(recovered.len(), 2);
    let mut counts: Vec<u64> = recovered
        .iter()
        .map(|s| s["attempt_count"].as_u64().unwrap())
        .collect();
    counts.sort();
    assert_eq!(counts, [1, 2]);

    let ids: HashSet<&str> = sessions.iter().filter_map(|s| get_str(s, "id")).collect();
    for attempt in store.get_all("attempts").await.unwrap() {
        assert!(ids.contains(get_str(&attempt, "session_id").unwrap()));
    }
    let a1 = store.get("attempts", "a1").await.unwrap().unwrap();
    assert_eq!(a1["session_id"], "s1");
}

#[tokio::test]
async fn incremental_only_touches_changed_tags() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let reconstructor = reconstructor(&store);
    let incremental = ReconstructionOptions {
        types: vec![ReconstructionType::TagMastery],
        strategy: ReconstructionStrategy::Incremental,
        preserve_existing: false,
        ..Default::default()
    };

    let first = reconstructor.reconstruct_data(&incremental).await;
    let result = &first.results[0];
    assert_eq!(result.records_reconstructed, 4);
    assert!(result.details.iter().any(|d| d.contains("in full")));

    let later = Utc::now() + Duration::days(1);
    store
        .put("attempts", attempt("a8", "p3", Some("s2"), true, 900.0, later))
        .await
        .unwrap();

    let second = reconstructor.reconstruct_data(&incremental).await;
    let result = &second.results[0];
    assert_eq!(result.records_reconstructed, 1);
    assert_eq!(result.records_skipped, 3);
    let graph = store.get("tag_mastery", "graph").await.unwrap().unwrap();
    assert_eq!(graph["total_attempts"], 2);
}

struct Weak;

impl TagSimilarity for Weak {
    fn similarity(&self, _: &[String], _: &[String]) -> f64 {
        0.1
    }
}

#[tokio::test]
async fn weak_relationships_are_not_materialized() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let report = reconstructor(&store)
        .with_similarity(Arc::new(Weak))
        .reconstruct_data(&only(&[ReconstructionType::Relationships]))
        .await;
    assert_eq!(report.total_reconstructed(), 0);
    assert!(store.get_all("problem_relationships").await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_newest_first() {
    let (store, _) = scenario_store("scenarios/practice_store.json");
    let reconstructor = reconstructor(&store);
    reconstructor
        .reconstruct_data(&only(&[ReconstructionType::TagMastery]))
        .await;
    reconstructor
        .reconstruct_data(&only(&[ReconstructionType::Relationships]))
        .await;
    let history = reconstructor.history(10);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].reconstruction_type, ReconstructionType::Relationships);
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_yields_an_invalid_report() {
    let flaky = Arc::new(FlakyStore::new(memory_store()).always_failing());
    let reconstructor = Reconstructor::with_defaults(
        Arc::clone(&flaky),
        Arc::new(SchemaRegistry::default_catalog()),
    );
    let report = reconstructor
        .reconstruct_data(&ReconstructionOptions::default())
        .await;
    assert!(!report.success);
    assert!(report.error.is_some());
    assert!(report.results.is_empty());
    assert_eq!(flaky.calls(), 4);
}
