use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::MenderResult;
use crate::models::{ErrorReport, StorageHealth};
use crate::record::Record;
use crate::schema::SchemaValidation;

/// Validates one record against its collection's schema.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, collection: &str, record: &Record) -> SchemaValidation;
}

/// Receives errors that exhausted every retry.
pub trait ErrorSink: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Reports storage usage and responsiveness.
pub trait StorageHealthProbe: Send + Sync {
    fn probe(&self) -> impl Future<Output = MenderResult<StorageHealth>> + Send;
}

impl<P: StorageHealthProbe> StorageHealthProbe for Arc<P> {
    fn probe(&self) -> impl Future<Output = MenderResult<StorageHealth>> + Send {
        (**self).probe()
    }
}

/// What a scheduler sees about one problem.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingInput {
    pub problem_id: String,
    pub current_box: Option<u32>,
    pub total_attempts: u32,
    pub last_attempt_date: DateTime<Utc>,
    pub last_success: bool,
    /// Successes in a row, counted back from the latest attempt.
    pub consecutive_successes: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleUpdate {
    pub box_level: u32,
    pub next_review: DateTime<Utc>,
}

/// Decides box level and next review for a problem.
pub trait ReviewScheduler: Send + Sync {
    fn schedule(&self, input: &SchedulingInput) -> ScheduleUpdate;
}

/// Similarity in [0, 1] between two tag sets.
pub trait TagSimilarity: Send + Sync {
    fn similarity(&self, tags1: &[String], tags2: &[String]) -> f64;
}
