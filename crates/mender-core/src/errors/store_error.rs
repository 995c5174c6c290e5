/// Document-store errors.
///
/// `Connectivity`, `Timeout` and `Sqlite` are transient; everything else is a
/// constraint-class error that retrying cannot fix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("store unreachable: {reason}")]
    Connectivity { reason: String },

    #[error("operation `{operation}` timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("SQLite error: {message}")]
    Sqlite { message: String },

    #[error("constraint violation in {collection}: {reason}")]
    ConstraintViolation { collection: String, reason: String },

    #[error("quota exceeded: {used_bytes}/{quota_bytes} bytes")]
    QuotaExceeded { used_bytes: u64, quota_bytes: u64 },

    #[error("invalid key in {collection}: {reason}")]
    InvalidKey { collection: String, reason: String },

    #[error("unknown collection: {collection}")]
    UnknownCollection { collection: String },

    #[error("write to {collection} attempted in a read-only transaction")]
    ReadOnlyTransaction { collection: String },

    #[error("collection {collection} is outside the transaction scope")]
    OutOfScope { collection: String },
}

impl StoreError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connectivity { .. } | Self::Timeout { .. } | Self::Sqlite { .. }
        )
    }
}
