//! Error taxonomy: one top-level [`MenderError`] with per-subsystem enums folded in via `#[from]`.

mod mender_error;
mod reconstruction_error;
mod repair_error;
mod store_error;

pub use mender_error::MenderError;
pub use reconstruction_error::ReconstructionError;
pub use repair_error::RepairError;
pub use store_error::StoreError;

/// Result alias used across the workspace.
pub type MenderResult<T> = Result<T, MenderError>;
