use mender_core::models::Violation;

/// `100 * (1 - weighted / (constraints * 3))`, clamped to [0, 100].
///
/// Critical violations weigh 3, warnings 1. No constraints means nothing can
/// be wrong, so the score is 100.
pub fn calculate_integrity_score(violations: &[Violation], constraints_checked: usize) -> f64 {
    if constraints_checked == 0 {
        return 100.0;
    }
    let weighted: f64 = violations.iter().map(|v| v.severity.weight()).sum();
    let max = constraints_checked as f64 * 3.0;
    (100.0 * (1.0 - weighted / max)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mender_core::models::{Severity, ViolationType};
    use serde_json::json;

    fn v(severity: Severity) -> Violation {
        Violation::new(
            ViolationType::MissingReference,
            "attempts",
            "a1",
            "problem_id",
            json!("p9"),
            severity,
            "missing".to_string(),
        )
    }

    #[test]
    fn no_constraints_is_perfect() {
        assert_eq!(calculate_integrity_score(&[v(Severity::Critical)], 0), 100.0);
    }

    #[test]
    fn critical_weighs_three_warnings() {
        let critical = calculate_integrity_score(&[v(Severity::Critical)], 4);
        let warnings = calculate_integrity_score(
            &[v(Severity::Warning), v(Severity::Warning), v(Severity::Warning)],
            4,
        );
        assert!((critical - 75.0).abs() < 1e-9);
        assert!((critical - warnings).abs() < 1e-9);
    }

    #[test]
    fn clamped_at_zero() {
        let many: Vec<_> = (0..10).map(|_| v(Severity::Critical)).collect();
        assert_eq!(calculate_integrity_score(&many, 1), 0.0);
    }
}
