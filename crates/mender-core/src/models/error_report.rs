use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Connectivity,
    Quota,
    Storage,
    Cancellation,
    Validation,
    Serialization,
    Repair,
    Reconstruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// What gets handed to an `ErrorSink`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorReport {
    pub id: String,
    pub message: String,
    /// Error chain rendered outermost first, one per line.
    pub stack: String,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub context: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(message: String, category: ErrorCategory, severity: ErrorSeverity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            stack: message.clone(),
            message,
            category,
            severity,
            context: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_stack(mut self, stack: String) -> Self {
        self.stack = stack;
        self
    }
}
