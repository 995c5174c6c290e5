//! # mender-reconstruction
//!
//! Rebuilds derived aggregates from the primary records (problems, attempts,
//! sessions, standard problems). Each reconstruction type plans its writes
//! from a snapshot of its sources, then commits them in one transaction
//! scoped to the collections it owns, behind a backup.

pub mod defaults;
pub mod engine;
mod history;
mod sources;
mod strategies;

pub use defaults::{FixedIntervalScheduler, SharedTagRatio};
pub use engine::Reconstructor;
pub use strategies::mastery::{decay_score, meets_mastery};
