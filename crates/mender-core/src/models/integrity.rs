use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{Priority, RepairSuggestion, Severity, Violation, ViolationType};

/// Options for a referential `check_all` pass.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CheckAllOptions {
    pub include_orphans: bool,
    pub include_missing: bool,
    /// Also walk graph collections for cycles.
    pub deep_check: bool,
    pub use_cache: bool,
    pub priority: Priority,
}

impl Default for CheckAllOptions {
    fn default() -> Self {
        Self {
            include_orphans: true,
            include_missing: true,
            deep_check: false,
            use_cache: true,
            priority: Priority::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ViolationSummary {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
}

impl ViolationSummary {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut summary = Self {
            total: violations.len(),
            ..Default::default()
        };
        for v in violations {
            *summary
                .by_type
                .entry(v.violation_type.as_str().to_string())
                .or_insert(0) += 1;
            let sev = match v.severity {
                Severity::Critical => "critical",
                Severity::Warning => "warning",
            };
            *summary.by_severity.entry(sev.to_string()).or_insert(0) += 1;
        }
        summary
    }

    pub fn count_type(&self, t: ViolationType) -> usize {
        self.by_type.get(t.as_str()).copied().unwrap_or(0)
    }

    pub fn critical(&self) -> usize {
        self.by_severity.get("critical").copied().unwrap_or(0)
    }

    pub fn warnings(&self) -> usize {
        self.by_severity.get("warning").copied().unwrap_or(0)
    }
}

/// Result of a referential integrity pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IntegrityReport {
    pub timestamp: DateTime<Utc>,
    pub collections_checked: Vec<String>,
    pub constraints_checked: usize,
    pub violations: Vec<Violation>,
    pub summary: ViolationSummary,
    /// 0–100.
    pub score: f64,
    pub suggestions: Vec<RepairSuggestion>,
    pub duration_ms: u64,
    pub from_cache: bool,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}
