//! # mender-orchestrator
//!
//! Runs phased integrity checks (schema, referential, business logic, storage
//! health) over a document store, scores them, keeps a bounded history with a
//! health trend, generates recommendations, and schedules periodic monitoring.
//! Repairs and reconstruction are delegated to the referential checker and the
//! reconstructor sharing the same resilient store and backup manager.

pub mod engine;
mod history;
mod monitoring;
pub mod phases;
pub mod recommendations;
pub mod scoring;
pub mod tracing_setup;
pub mod trend;

pub use engine::IntegrityOrchestrator;
#[doc(hidden)]
pub use tracing;
pub use trend::health_trend;
