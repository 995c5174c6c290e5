use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::defaults;

/// How a violation should be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    DeleteOrphan,
    SetNull,
    RemoveReference,
    CascadeDelete,
    ManualReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Concrete mutation a repair performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RepairAction {
    /// Null out one field of one record.
    SetNull {
        collection: String,
        key: String,
        field: String,
    },
    /// Drop one dangling key from an array-valued reference, keeping the rest.
    RemoveReference {
        collection: String,
        key: String,
        field: String,
        value: String,
    },
    /// Remove one record.
    DeleteRecord { collection: String, key: String },
    /// Remove a record and every record whose foreign keys point at it.
    CascadeDelete { collection: String, key: String },
    ManualReview { note: String },
}

impl RepairAction {
    /// Collections touched by this action, used to scope its transaction.
    pub fn target_collection(&self) -> Option<&str> {
        match self {
            Self::SetNull { collection, .. }
            | Self::RemoveReference { collection, .. }
            | Self::DeleteRecord { collection, .. }
            | Self::CascadeDelete { collection, .. } => Some(collection),
            Self::ManualReview { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::SetNull {
                collection,
                key,
                field,
            } => format!("set {collection}/{key}.{field} to null"),
            Self::RemoveReference {
                collection,
                key,
                field,
                value,
            } => format!("remove {value} from {collection}/{key}.{field}"),
            Self::DeleteRecord { collection, key } => format!("delete {collection}/{key}"),
            Self::CascadeDelete { collection, key } => {
                format!("cascade delete {collection}/{key} and its dependents")
            }
            Self::ManualReview { note } => format!("manual review: {note}"),
        }
    }
}

/// A proposed fix for one violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RepairSuggestion {
    pub violation_id: String,
    pub strategy: RepairStrategy,
    /// Safe to apply without a human in the loop.
    pub automated: bool,
    pub risk: RiskLevel,
    pub action: RepairAction,
}

/// Options for `execute_repairs`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct RepairOptions {
    pub dry_run: bool,
    pub automated_only: bool,
    pub max_repairs: usize,
    pub create_backup: bool,
    /// Only apply suggestions at or below this risk.
    pub max_risk: RiskLevel,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            automated_only: true,
            max_repairs: defaults::DEFAULT_MAX_REPAIRS,
            create_backup: true,
            max_risk: RiskLevel::High,
        }
    }
}

/// Result of applying (or simulating) one suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RepairOutcome {
    pub violation_id: String,
    pub action: RepairAction,
    pub success: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a repair batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RepairResult {
    pub attempted: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    pub outcomes: Vec<RepairOutcome>,
    pub duration_ms: u64,
}
