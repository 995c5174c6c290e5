use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Kind of referential defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    MissingReference,
    OrphanedRecord,
    CircularReference,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingReference => "missing_reference",
            Self::OrphanedRecord => "orphaned_record",
            Self::CircularReference => "circular_reference",
        }
    }
}

/// Violation severity. Critical outweighs warning 3:1 in the integrity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn weight(&self) -> f64 {
        match self {
            Self::Critical => 3.0,
            Self::Warning => 1.0,
        }
    }
}

/// A structured finding. Not an error: violations are report entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Violation {
    /// Stable digest of the defect; the same defect found twice has the same id.
    pub id: String,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    pub collection: String,
    pub record_id: String,
    pub field: String,
    pub value: serde_json::Value,
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Node path for circular references, first node repeated at the end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
}

impl Violation {
    pub fn new(
        violation_type: ViolationType,
        collection: &str,
        record_id: &str,
        field: &str,
        value: serde_json::Value,
        severity: Severity,
        message: String,
    ) -> Self {
        let id = Self::compute_id(violation_type, collection, record_id, field, &value);
        Self {
            id,
            violation_type,
            collection: collection.to_string(),
            record_id: record_id.to_string(),
            field: field.to_string(),
            value,
            severity,
            message,
            timestamp: Utc::now(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = Some(path);
        self
    }

    /// blake3 over the identifying fields, truncated to 16 hex chars.
    pub fn compute_id(
        violation_type: ViolationType,
        collection: &str,
        record_id: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [violation_type.as_str(), collection, record_id, field] {
            hasher.update(part.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(value.to_string().as_bytes());
        let hex = hasher.finalize().to_hex();
        hex[..16].to_string()
    }
}
