//! Periodic quick and full checks as independent tokio tasks.

use std::sync::{Mutex, Weak};

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use mender_core::config::MonitoringConfig;
use mender_core::models::{CheckOptions, CheckType, RepairOptions, RiskLevel};
use mender_core::traits::{DocumentStore, StorageHealthProbe};

use crate::engine::IntegrityOrchestrator;
use crate::tracing_setup::events;

/// Handles of the running monitor tasks. Dropping it aborts them.
#[derive(Default)]
pub(crate) struct Monitor {
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Swap in new tasks, aborting the old ones. Returns how many were aborted.
    pub(crate) fn replace(&self, tasks: Vec<JoinHandle<()>>) -> usize {
        let mut current = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let old = std::mem::replace(&mut *current, tasks);
        abort_all(old)
    }

    pub(crate) fn stop(&self) -> usize {
        self.replace(Vec::new())
    }

    pub(crate) fn is_running(&self) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.iter().any(|t| !t.is_finished())
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn abort_all(tasks: Vec<JoinHandle<()>>) -> usize {
    let count = tasks.len();
    for task in tasks {
        task.abort();
    }
    count
}

/// One task per check kind. Each first fires one interval after start and
/// exits once the orchestrator is gone.
pub(crate) fn spawn<S>(
    orchestrator: Weak<IntegrityOrchestrator<S>>,
    config: &MonitoringConfig,
) -> Vec<JoinHandle<()>>
where
    S: DocumentStore + StorageHealthProbe + 'static,
{
    vec![
        spawn_loop(
            orchestrator.clone(),
            config.quick_interval(),
            CheckType::Quick,
            false,
        ),
        spawn_loop(
            orchestrator,
            config.full_interval(),
            CheckType::Full,
            config.auto_repair,
        ),
    ]
}

fn spawn_loop<S>(
    orchestrator: Weak<IntegrityOrchestrator<S>>,
    period: Duration,
    check_type: CheckType,
    auto_repair: bool,
) -> JoinHandle<()>
where
    S: DocumentStore + StorageHealthProbe + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(orchestrator) = orchestrator.upgrade() else {
                break;
            };
            let report = orchestrator
                .perform_integrity_check(&CheckOptions::of_type(check_type))
                .await;
            if !auto_repair || report.error.is_some() {
                continue;
            }
            let Some(referential) = &report.results.referential else {
                continue;
            };
            let eligible: Vec<_> = referential
                .suggestions
                .iter()
                .filter(|s| s.automated && s.risk == RiskLevel::Low)
                .cloned()
                .collect();
            if eligible.is_empty() {
                continue;
            }
            let options = RepairOptions {
                automated_only: true,
                max_risk: RiskLevel::Low,
                ..Default::default()
            };
            match orchestrator.execute_repairs(&eligible, &options).await {
                Ok(result) => events::auto_repair_applied(result.attempted, result.successful),
                Err(err) => tracing::warn!(event = "auto_repair_failed", error = %err, "automated repair failed"),
            }
        }
    })
}
