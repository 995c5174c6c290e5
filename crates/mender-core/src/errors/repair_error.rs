/// Repair subsystem errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepairError {
    #[error("no violation with id {violation_id} in this batch")]
    UnknownViolation { violation_id: String },

    #[error("record {collection}/{key} no longer exists")]
    TargetMissing { collection: String, key: String },

    #[error("repair action not executable: {reason}")]
    NotExecutable { reason: String },

    #[error("backup failed before repair: {reason}")]
    BackupFailed { reason: String },
}
