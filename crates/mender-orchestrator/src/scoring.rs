//! Overall score and error/warning tallies across phase results.

use mender_core::models::{OverallResult, PhaseResults, Severity};

/// Mean of the phase scores that ran; 100 when none did.
pub fn overall_score(results: &PhaseResults) -> f64 {
    let scores = results.scores();
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// `(errors, warnings)`: invalid records, critical violations and business
/// errors are errors; warning violations, business warnings and storage
/// issues are warnings.
pub fn tally(results: &PhaseResults) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;
    if let Some(schema) = &results.schema {
        errors += schema.records_checked - schema.valid_records;
    }
    if let Some(referential) = &results.referential {
        for v in &referential.violations {
            match v.severity {
                Severity::Critical => errors += 1,
                Severity::Warning => warnings += 1,
            }
        }
    }
    if let Some(business) = &results.business_logic {
        errors += business.errors;
        warnings += business.warnings;
    }
    if let Some(storage) = &results.storage_health {
        warnings += storage.issues.len();
    }
    (errors, warnings)
}

pub fn overall(results: &PhaseResults) -> OverallResult {
    let (errors, warnings) = tally(results);
    OverallResult {
        valid: errors == 0,
        score: overall_score(results),
        errors,
        warnings,
    }
}
