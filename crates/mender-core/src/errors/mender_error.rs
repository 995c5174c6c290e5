use crate::models::ErrorCategory;

use super::{ReconstructionError, RepairError, StoreError};

/// Top-level error for every mender crate.
///
/// `Clone` so that a deduplicated in-flight result can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MenderError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("circuit breaker open, retry after {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    #[error("operation `{operation}` cancelled")]
    Cancelled { operation: String },

    #[error("schema error in {collection}: {reason}")]
    Schema { collection: String, reason: String },

    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("serialization error: {reason}")]
    Serialization { reason: String },

    #[error("repair error: {0}")]
    Repair(#[from] RepairError),

    #[error("reconstruction error: {0}")]
    Reconstruction(#[from] ReconstructionError),

    #[error("backup not found: {id}")]
    BackupNotFound { id: String },

    #[error("record not found: {collection}/{key}")]
    RecordNotFound { collection: String, key: String },
}

impl From<serde_json::Error> for MenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

impl MenderError {
    /// Whether the retry executor may try the operation again.
    ///
    /// Quota, constraint, key and cancellation failures surface immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Coarse category used by the error sink.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(StoreError::Connectivity { .. })
            | Self::Store(StoreError::Timeout { .. })
            | Self::CircuitOpen { .. } => ErrorCategory::Connectivity,
            Self::Store(StoreError::QuotaExceeded { .. }) => ErrorCategory::Quota,
            Self::Store(_) => ErrorCategory::Storage,
            Self::Cancelled { .. } => ErrorCategory::Cancellation,
            Self::Schema { .. } | Self::Config { .. } => ErrorCategory::Validation,
            Self::Serialization { .. } => ErrorCategory::Serialization,
            Self::Repair(_) | Self::BackupNotFound { .. } => ErrorCategory::Repair,
            Self::Reconstruction(_) => ErrorCategory::Reconstruction,
            Self::RecordNotFound { .. } => ErrorCategory::Storage,
        }
    }
}
