//! Storage-health phase.

use mender_core::errors::MenderResult;
use mender_core::models::{StorageHealth, StorageHealthPhaseResult};
use mender_core::traits::StorageHealthProbe;

pub fn evaluate(health: StorageHealth) -> StorageHealthPhaseResult {
    StorageHealthPhaseResult {
        issues: health.issues(),
        score: health.score(),
        health,
    }
}

pub async fn run<P: StorageHealthProbe>(probe: &P) -> MenderResult<StorageHealthPhaseResult> {
    Ok(evaluate(probe.probe().await?))
}
