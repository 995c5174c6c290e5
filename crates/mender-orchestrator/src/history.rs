use std::collections::VecDeque;
use std::sync::Mutex;

use mender_core::models::CheckReport;

/// Bounded check history, oldest first.
pub(crate) struct CheckHistory {
    limit: usize,
    reports: Mutex<VecDeque<CheckReport>>,
}

impl CheckHistory {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            reports: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, report: CheckReport) {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.push_back(report);
        while reports.len() > self.limit {
            reports.pop_front();
        }
    }

    /// Newest first.
    pub(crate) fn recent(&self, limit: usize) -> Vec<CheckReport> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.iter().rev().take(limit).cloned().collect()
    }

    /// Overall scores, oldest first.
    pub(crate) fn scores(&self) -> Vec<f64> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        reports.iter().map(|r| r.overall.score).collect()
    }
}
