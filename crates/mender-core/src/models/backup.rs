use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Full snapshot of the collections in scope, taken before a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub collections_included: Vec<String>,
    pub snapshot: BTreeMap<String, Vec<Record>>,
}

impl Backup {
    pub fn record_count(&self) -> usize {
        self.snapshot.values().map(Vec::len).sum()
    }

    pub fn summary(&self) -> BackupSummary {
        BackupSummary {
            id: self.id.clone(),
            timestamp: self.timestamp,
            reason: self.reason.clone(),
            collections_included: self.collections_included.clone(),
            record_count: self.record_count(),
        }
    }
}

/// Listing entry without the snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub collections_included: Vec<String>,
    pub record_count: usize,
}
