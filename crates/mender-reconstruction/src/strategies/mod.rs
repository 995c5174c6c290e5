//! One planner per reconstruction type. Planners are pure: they read source
//! snapshots and return the writes they would make.

pub mod common;
pub mod mastery;
pub mod pattern_ladders;
pub mod problem_stats;
pub mod relationships;
pub mod session_analytics;
pub mod session_recovery;

use chrono::{DateTime, Utc};

use mender_core::config::ReconstructionConfig;
use mender_core::models::ReconstructionType;
use mender_core::record::Record;
use mender_core::traits::{ReviewScheduler, TagSimilarity, WriteOp};

use crate::sources::Sources;

/// What a planner decided.
#[derive(Debug, Default)]
pub struct Plan {
    pub writes: Vec<WriteOp>,
    pub skipped: usize,
    pub details: Vec<String>,
    /// Per-record problems; they never abort the plan.
    pub errors: Vec<String>,
}

impl Plan {
    pub fn detail(&mut self, line: impl Into<String>) {
        self.details.push(line.into());
    }
}

/// Everything a planner may look at.
pub struct PlanContext<'a> {
    pub sources: &'a Sources,
    pub config: &'a ReconstructionConfig,
    pub now: DateTime<Utc>,
    pub preserve_existing: bool,
    /// Incremental runs only consider entities with attempts after this instant.
    pub since: Option<DateTime<Utc>>,
    pub scheduler: &'a dyn ReviewScheduler,
    pub similarity: &'a dyn TagSimilarity,
}

impl<'a> PlanContext<'a> {
    pub fn records(&self, collection: &str) -> &'a [Record] {
        self.sources.get(collection)
    }
}

/// Collections each type reads.
pub fn sources_of(t: ReconstructionType) -> &'static [&'static str] {
    match t {
        ReconstructionType::SessionRecovery => &["sessions", "attempts"],
        ReconstructionType::ProblemStats => &["problems", "attempts"],
        ReconstructionType::TagMastery => &["problems", "attempts", "tag_mastery"],
        ReconstructionType::SessionAnalytics => {
            &["sessions", "attempts", "problems", "session_analytics"]
        }
        ReconstructionType::PatternLadders => {
            &["tag_mastery", "standard_problems", "pattern_ladders"]
        }
        ReconstructionType::Relationships => &["standard_problems", "problem_relationships"],
    }
}

pub fn plan(t: ReconstructionType, ctx: &PlanContext<'_>) -> Plan {
    match t {
        ReconstructionType::SessionRecovery => session_recovery::plan(ctx),
        ReconstructionType::ProblemStats => problem_stats::plan(ctx),
        ReconstructionType::TagMastery => mastery::plan(ctx),
        ReconstructionType::SessionAnalytics => session_analytics::plan(ctx),
        ReconstructionType::PatternLadders => pattern_ladders::plan(ctx),
        ReconstructionType::Relationships => relationships::plan(ctx),
    }
}
