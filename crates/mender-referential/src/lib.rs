//! # mender-referential
//!
//! Referential integrity checking and repair over a `DocumentStore`.
//!
//! A pass loads each collection once, scans declared foreign keys for missing
//! targets, reverse constraints for orphans and (on deep checks) graph
//! collections for cycles. Violations map to repair suggestions; automated
//! ones can be applied behind a backup.

pub mod cache;
pub mod engine;
pub mod repair;
pub mod scans;
pub mod score;
mod snapshot;
pub mod suggestions;

pub use engine::ReferentialChecker;
pub use score::calculate_integrity_score;
pub use suggestions::generate_repair_suggestions;
