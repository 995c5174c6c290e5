//! Span definitions per operation: integrity check, repair, reconstruction.

/// Create an integrity check span.
#[macro_export]
macro_rules! integrity_check_span {
    ($check_type:expr) => {
        $crate::tracing::info_span!("mender.integrity_check", check_type = %$check_type)
    };
}

/// Create a repair span.
#[macro_export]
macro_rules! repair_span {
    ($suggestions:expr, $dry_run:expr) => {
        $crate::tracing::info_span!("mender.repair", suggestions = $suggestions, dry_run = $dry_run)
    };
}

/// Create a reconstruction span.
#[macro_export]
macro_rules! reconstruction_span {
    ($types:expr, $dry_run:expr) => {
        $crate::tracing::info_span!("mender.reconstruction", types = $types, dry_run = $dry_run)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const INTEGRITY_CHECK: &str = "mender.integrity_check";
    pub const REPAIR: &str = "mender.repair";
    pub const RECONSTRUCTION: &str = "mender.reconstruction";
}
