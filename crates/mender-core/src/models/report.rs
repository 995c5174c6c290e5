use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{ErrorCategory, IntegrityReport, StorageHealth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Schema,
    Referential,
    BusinessLogic,
    Quick,
    Full,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Referential => "referential",
            Self::BusinessLogic => "business_logic",
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }

    pub fn runs_schema(&self) -> bool {
        matches!(self, Self::Schema | Self::Quick | Self::Full)
    }

    pub fn runs_referential(&self) -> bool {
        matches!(self, Self::Referential | Self::Full)
    }

    pub fn runs_business_logic(&self) -> bool {
        matches!(self, Self::BusinessLogic | Self::Full)
    }

    pub fn runs_storage_health(&self) -> bool {
        matches!(self, Self::Quick | Self::Full)
    }
}

/// Request priority. Scales retry backoff and gates the anomaly checks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Backoff multiplier.
    pub fn delay_multiplier(&self) -> f64 {
        match self {
            Self::High | Self::Critical => 0.5,
            Self::Normal => 1.0,
            Self::Low => 2.0,
        }
    }
}

/// Options for `perform_integrity_check`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CheckOptions {
    pub check_type: CheckType,
    /// Collections to check; empty means every registered collection.
    pub stores: Vec<String>,
    pub priority: Priority,
    pub save_to_history: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_type: CheckType::Full,
            stores: Vec::new(),
            priority: Priority::Normal,
            save_to_history: true,
        }
    }
}

impl CheckOptions {
    pub fn of_type(check_type: CheckType) -> Self {
        Self {
            check_type,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OverallResult {
    pub valid: bool,
    pub score: f64,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CollectionSchemaResult {
    pub collection: String,
    pub records_checked: usize,
    pub valid_records: usize,
    pub invalid_records: usize,
    /// First few error messages, `key: message`.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SchemaPhaseResult {
    pub collections: Vec<CollectionSchemaResult>,
    pub records_checked: usize,
    pub valid_records: usize,
    pub sampled: bool,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BusinessCheckKind {
    CounterMismatch,
    StaleSession,
    StaleMastery,
    SuspiciousSuccessRate,
    AbnormalDuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FindingLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessFinding {
    pub kind: BusinessCheckKind,
    pub level: FindingLevel,
    pub collection: String,
    pub record_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessLogicPhaseResult {
    pub findings: Vec<BusinessFinding>,
    pub errors: usize,
    pub warnings: usize,
    pub anomaly_checks_run: bool,
    pub score: f64,
}

impl BusinessLogicPhaseResult {
    pub fn from_findings(findings: Vec<BusinessFinding>, anomaly_checks_run: bool) -> Self {
        let errors = findings
            .iter()
            .filter(|f| f.level == FindingLevel::Error)
            .count();
        let warnings = findings.len() - errors;
        let score = (100.0 - 10.0 * errors as f64 - 2.0 * warnings as f64).clamp(0.0, 100.0);
        Self {
            findings,
            errors,
            warnings,
            anomaly_checks_run,
            score,
        }
    }

    pub fn count_kind(&self, kind: BusinessCheckKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StorageHealthPhaseResult {
    pub health: StorageHealth,
    pub issues: Vec<String>,
    pub score: f64,
}

/// Per-phase results; a phase that did not run is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PhaseResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaPhaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referential: Option<IntegrityReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_logic: Option<BusinessLogicPhaseResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_health: Option<StorageHealthPhaseResult>,
}

impl PhaseResults {
    pub fn scores(&self) -> Vec<f64> {
        let mut scores = Vec::with_capacity(4);
        if let Some(s) = &self.schema {
            scores.push(s.score);
        }
        if let Some(r) = &self.referential {
            scores.push(r.score);
        }
        if let Some(b) = &self.business_logic {
            scores.push(b.score);
        }
        if let Some(h) = &self.storage_health {
            scores.push(h.score);
        }
        scores
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PerformanceMetrics {
    pub total_ms: u64,
    pub schema_ms: u64,
    pub referential_ms: u64,
    pub business_logic_ms: u64,
    pub storage_health_ms: u64,
}

/// A failure that prevented the check from running, attached instead of thrown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SystemErrorInfo {
    pub message: String,
    pub category: ErrorCategory,
    /// Messages from the outermost error inwards.
    pub chain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckReport {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub check_type: CheckType,
    pub overall: OverallResult,
    pub results: PhaseResults,
    pub recommendations: Vec<Recommendation>,
    pub performance_metrics: PerformanceMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SystemErrorInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthTrend {
    pub direction: TrendDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_average: Option<f64>,
    pub reports_considered: usize,
}
