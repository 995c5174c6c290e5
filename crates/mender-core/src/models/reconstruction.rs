use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Derived aggregate that can be rebuilt from primary records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionType {
    TagMastery,
    ProblemStats,
    SessionAnalytics,
    SessionRecovery,
    PatternLadders,
    Relationships,
}

impl ReconstructionType {
    pub const ALL: [ReconstructionType; 6] = [
        Self::SessionRecovery,
        Self::ProblemStats,
        Self::TagMastery,
        Self::SessionAnalytics,
        Self::PatternLadders,
        Self::Relationships,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TagMastery => "tag_mastery",
            Self::ProblemStats => "problem_stats",
            Self::SessionAnalytics => "session_analytics",
            Self::SessionRecovery => "session_recovery",
            Self::PatternLadders => "pattern_ladders",
            Self::Relationships => "relationships",
        }
    }

    /// Collection written by this reconstruction.
    pub fn target_collection(&self) -> &'static str {
        match self {
            Self::TagMastery => "tag_mastery",
            Self::ProblemStats => "problems",
            Self::SessionAnalytics => "session_analytics",
            Self::SessionRecovery => "sessions",
            Self::PatternLadders => "pattern_ladders",
            Self::Relationships => "problem_relationships",
        }
    }

    /// Every collection the write transaction touches.
    pub fn write_scope(&self) -> &'static [&'static str] {
        match self {
            Self::SessionRecovery => &["sessions", "attempts"],
            Self::TagMastery => &["tag_mastery"],
            Self::ProblemStats => &["problems"],
            Self::SessionAnalytics => &["session_analytics"],
            Self::PatternLadders => &["pattern_ladders"],
            Self::Relationships => &["problem_relationships"],
        }
    }
}

impl std::fmt::Display for ReconstructionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ReconstructionStrategy {
    #[default]
    Full,
    /// Only entities whose sources changed since the last successful run.
    Incremental,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ReconstructionOptions {
    pub types: Vec<ReconstructionType>,
    pub strategy: ReconstructionStrategy,
    pub dry_run: bool,
    pub create_backup: bool,
    pub preserve_existing: bool,
}

impl Default for ReconstructionOptions {
    fn default() -> Self {
        Self {
            types: ReconstructionType::ALL.to_vec(),
            strategy: ReconstructionStrategy::Full,
            dry_run: false,
            create_backup: true,
            preserve_existing: true,
        }
    }
}

/// Outcome of one reconstruction type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconstructionResult {
    #[serde(rename = "type")]
    pub reconstruction_type: ReconstructionType,
    pub strategy: ReconstructionStrategy,
    pub dry_run: bool,
    pub preserve_existing: bool,
    pub records_reconstructed: usize,
    pub records_skipped: usize,
    pub errors: Vec<String>,
    pub details: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ReconstructionResult {
    pub fn new(
        reconstruction_type: ReconstructionType,
        strategy: ReconstructionStrategy,
        dry_run: bool,
        preserve_existing: bool,
    ) -> Self {
        Self {
            reconstruction_type,
            strategy,
            dry_run,
            preserve_existing,
            records_reconstructed: 0,
            records_skipped: 0,
            errors: Vec::new(),
            details: Vec::new(),
            backup_id: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate of one `reconstruct_data` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconstructionReport {
    pub results: Vec<ReconstructionResult>,
    pub success: bool,
    pub backup_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ReconstructionReport {
    pub fn total_reconstructed(&self) -> usize {
        self.results.iter().map(|r| r.records_reconstructed).sum()
    }

    pub fn result_for(&self, t: ReconstructionType) -> Option<&ReconstructionResult> {
        self.results.iter().find(|r| r.reconstruction_type == t)
    }
}
