mod backup;
mod breaker;
mod error_report;
mod integrity;
mod reconstruction;
mod repair;
mod report;
mod storage_health;
mod violation;

pub use backup::{Backup, BackupSummary};
pub use breaker::{CircuitBreakerState, CircuitStateKind};
pub use error_report::{ErrorCategory, ErrorReport, ErrorSeverity};
pub use integrity::{CheckAllOptions, IntegrityReport, ViolationSummary};
pub use reconstruction::{
    ReconstructionOptions, ReconstructionReport, ReconstructionResult, ReconstructionStrategy,
    ReconstructionType,
};
pub use repair::{
    RepairAction, RepairOptions, RepairOutcome, RepairResult, RepairStrategy, RepairSuggestion,
    RiskLevel,
};
pub use report::{
    BusinessCheckKind, BusinessFinding, BusinessLogicPhaseResult, CheckOptions, CheckReport,
    CheckType, CollectionSchemaResult, FindingLevel, HealthTrend, OverallResult,
    PerformanceMetrics, PhaseResults, Priority, Recommendation, RecommendationPriority,
    SchemaPhaseResult, StorageHealthPhaseResult, SystemErrorInfo, TrendDirection,
};
pub use storage_health::StorageHealth;
pub use violation::{Severity, Violation, ViolationType};
