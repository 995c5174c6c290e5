use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use mender_core::models::{ReconstructionResult, ReconstructionType};

/// Bounded, newest-last log of reconstruction results.
pub(crate) struct History {
    limit: usize,
    entries: Mutex<VecDeque<ReconstructionResult>>,
}

impl History {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, result: ReconstructionResult) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_back(result);
        while entries.len() > self.limit {
            entries.pop_front();
        }
    }

    /// Newest first.
    pub(crate) fn recent(&self, limit: usize) -> Vec<ReconstructionResult> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Start time of the latest successful, non-dry-run result of `t`.
    pub(crate) fn last_success(&self, t: ReconstructionType) -> Option<DateTime<Utc>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .rev()
            .find(|r| r.reconstruction_type == t && !r.dry_run && r.success())
            .map(|r| r.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mender_core::models::ReconstructionStrategy;

    fn result(t: ReconstructionType, dry_run: bool) -> ReconstructionResult {
        ReconstructionResult::new(t, ReconstructionStrategy::Full, dry_run, true)
    }

    #[test]
    fn bounded_and_newest_first() {
        let history = History::new(2);
        history.push(result(ReconstructionType::TagMastery, false));
        history.push(result(ReconstructionType::ProblemStats, false));
        history.push(result(ReconstructionType::Relationships, false));
        let recent = history.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].reconstruction_type, ReconstructionType::Relationships);
    }

    #[test]
    fn dry_runs_do_not_count_as_success() {
        let history = History::new(5);
        history.push(result(ReconstructionType::TagMastery, true));
        assert!(history.last_success(ReconstructionType::TagMastery).is_none());
        history.push(result(ReconstructionType::TagMastery, false));
        assert!(history.last_success(ReconstructionType::TagMastery).is_some());
    }
}
