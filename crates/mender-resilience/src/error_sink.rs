//! Default error sink: one structured `tracing` event per report.

use mender_core::models::{ErrorReport, ErrorSeverity};
use mender_core::traits::ErrorSink;
use tracing::{error, warn};

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, report: ErrorReport) {
        match report.severity {
            ErrorSeverity::High | ErrorSeverity::Critical => error!(
                event = "error_reported",
                report_id = %report.id,
                category = ?report.category,
                severity = ?report.severity,
                context = ?report.context,
                "{}",
                report.message
            ),
            ErrorSeverity::Low | ErrorSeverity::Medium => warn!(
                event = "error_reported",
                report_id = %report.id,
                category = ?report.category,
                severity = ?report.severity,
                context = ?report.context,
                "{}",
                report.message
            ),
        }
    }
}
