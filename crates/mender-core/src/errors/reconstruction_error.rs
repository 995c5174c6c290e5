/// Reconstruction subsystem errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconstructionError {
    #[error("source collection {collection} unavailable: {reason}")]
    SourceUnavailable { collection: String, reason: String },

    #[error("malformed source record {collection}/{key}: {reason}")]
    MalformedSource {
        collection: String,
        key: String,
        reason: String,
    },

    #[error("write phase failed for {reconstruction_type}: {reason}")]
    WriteFailed {
        reconstruction_type: String,
        reason: String,
    },
}
