//! # mender-core
//!
//! Foundation crate for the mender consistency engine.
//! Defines records, schema declarations, models, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod record;
pub mod schema;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::MenderConfig;
pub use errors::{MenderError, MenderResult, StoreError};
pub use record::Record;
pub use schema::{CollectionSchema, SchemaRegistry};
pub use traits::{DocumentStore, TransactionMode, WriteOp};
