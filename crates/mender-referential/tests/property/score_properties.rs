//! Property tests: integrity score bounds and monotonicity; cycle detection invariants.

use proptest::prelude::*;
use serde_json::json;

use mender_core::models::{Severity, Violation, ViolationType};
use mender_referential::calculate_integrity_score;
use mender_referential::scans::find_cycles;

fn violations(critical: usize, warnings: usize) -> Vec<Violation> {
    let make = |i: usize, severity| {
        Violation::new(
            ViolationType::MissingReference,
            "attempts",
            &format!("a{i}"),
            "problem_id",
            json!("p"),
            severity,
            String::new(),
        )
    };
    (0..critical)
        .map(|i| make(i, Severity::Critical))
        .chain((0..warnings).map(|i| make(critical + i, Severity::Warning)))
        .collect()
}

proptest! {
    #[test]
    fn prop_score_in_bounds(critical in 0usize..50, warnings in 0usize..50, constraints in 0usize..40) {
        let score = calculate_integrity_score(&violations(critical, warnings), constraints);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn prop_more_violations_never_raise_the_score(
        critical in 0usize..20,
        warnings in 0usize..20,
        constraints in 1usize..30,
    ) {
        let base = calculate_integrity_score(&violations(critical, warnings), constraints);
        let worse = calculate_integrity_score(&violations(critical, warnings + 1), constraints);
        prop_assert!(worse <= base);
    }

    #[test]
    fn prop_cycle_paths_are_closed_and_edges_exist(
        pairs in proptest::collection::vec((0u8..6, 0u8..6), 0..20)
    ) {
        let edges: Vec<(String, String)> = pairs
            .iter()
            .map(|(a, b)| (format!("n{a}"), format!("n{b}")))
            .collect();
        for path in find_cycles(&edges) {
            prop_assert!(path.len() >= 2);
            prop_assert_eq!(path.first(), path.last());
            for step in path.windows(2) {
                prop_assert!(edges.iter().any(|(a, b)| a == &step[0] && b == &step[1]));
            }
        }
    }

    #[test]
    fn prop_acyclic_chains_have_no_cycles(len in 1usize..15) {
        let edges: Vec<(String, String)> = (0..len)
            .map(|i| (format!("n{i:02}"), format!("n{:02}", i + 1)))
            .collect();
        prop_assert!(find_cycles(&edges).is_empty());
    }
}
