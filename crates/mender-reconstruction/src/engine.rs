//! Reconstructor: plans each requested type against shared source snapshots
//! and commits its writes in one transaction behind a backup.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use mender_core::config::{ReconstructionConfig, StorageConfig};
use mender_core::errors::ReconstructionError;
use mender_core::models::{
    ReconstructionOptions, ReconstructionReport, ReconstructionResult, ReconstructionStrategy,
    ReconstructionType,
};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::{DocumentStore, ReviewScheduler, TagSimilarity, TransactionMode};
use mender_resilience::{ResilientStore, RetryExecutor};
use mender_storage::backup::BackupManager;

use crate::defaults::{FixedIntervalScheduler, SharedTagRatio};
use crate::history::History;
use crate::sources::Sources;
use crate::strategies::{self, PlanContext};

pub struct Reconstructor<S: DocumentStore> {
    store: ResilientStore<S>,
    config: ReconstructionConfig,
    backups: Arc<BackupManager<ResilientStore<S>>>,
    scheduler: Arc<dyn ReviewScheduler>,
    similarity: Arc<dyn TagSimilarity>,
    history: History,
}

impl<S: DocumentStore> Reconstructor<S> {
    pub fn new(
        store: ResilientStore<S>,
        config: ReconstructionConfig,
        backups: Arc<BackupManager<ResilientStore<S>>>,
    ) -> Self {
        Self {
            history: History::new(config.history_limit),
            store,
            config,
            backups,
            scheduler: Arc::new(FixedIntervalScheduler),
            similarity: Arc::new(SharedTagRatio),
        }
    }

    /// Default executor, config and backup retention.
    pub fn with_defaults(store: Arc<S>, registry: Arc<SchemaRegistry>) -> Self {
        let store = ResilientStore::new(store, Arc::new(RetryExecutor::with_defaults()));
        let backups = Arc::new(BackupManager::new(
            Arc::new(store.clone()),
            registry,
            StorageConfig::default().backup_retention,
        ));
        Self::new(store, ReconstructionConfig::default(), backups)
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn ReviewScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn TagSimilarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    pub fn backups(&self) -> &Arc<BackupManager<ResilientStore<S>>> {
        &self.backups
    }

    /// Most recent results, newest first.
    pub fn history(&self, limit: usize) -> Vec<ReconstructionResult> {
        self.history.recent(limit)
    }

    /// Run every requested type in dependency order. Never fails: a store
    /// that cannot be opened yields an unsuccessful report carrying the error.
    pub async fn reconstruct_data(&self, options: &ReconstructionOptions) -> ReconstructionReport {
        let start = Instant::now();
        let mut report = ReconstructionReport {
            results: Vec::new(),
            success: false,
            backup_ids: Vec::new(),
            error: None,
            duration_ms: 0,
        };

        if let Err(err) = self.store.open().await {
            warn!(event = "reconstruction_aborted", error = %err, "store could not be opened");
            report.error = Some(err.to_string());
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }

        let mut sources = Sources::default();
        for t in ReconstructionType::ALL {
            if !options.types.contains(&t) {
                continue;
            }
            let result = self.reconstruct_one(t, options, &mut sources).await;
            if let Some(id) = &result.backup_id {
                report.backup_ids.push(id.clone());
            }
            self.history.push(result.clone());
            report.results.push(result);
        }

        report.success = report.results.iter().all(ReconstructionResult::success);
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            event = "reconstruction_complete",
            types = report.results.len(),
            reconstructed = report.total_reconstructed(),
            dry_run = options.dry_run,
            success = report.success,
            "reconstruction pass complete"
        );
        report
    }

    async fn reconstruct_one(
        &self,
        t: ReconstructionType,
        options: &ReconstructionOptions,
        sources: &mut Sources,
    ) -> ReconstructionResult {
        let start = Instant::now();
        let mut result =
            ReconstructionResult::new(t, options.strategy, options.dry_run, options.preserve_existing);

        if let Err(err) = sources.ensure(&self.store, strategies::sources_of(t)).await {
            result.errors.push(err.to_string());
            result.duration_ms = start.elapsed().as_millis() as u64;
            return result;
        }

        let since = match options.strategy {
            ReconstructionStrategy::Full => None,
            ReconstructionStrategy::Incremental => {
                let last = self.history.last_success(t);
                if last.is_none() {
                    result
                        .details
                        .push("no previous successful run, reconstructing in full".to_string());
                }
                last
            }
        };

        let ctx = PlanContext {
            sources,
            config: &self.config,
            now: Utc::now(),
            preserve_existing: options.preserve_existing,
            since,
            scheduler: self.scheduler.as_ref(),
            similarity: self.similarity.as_ref(),
        };
        let plan = strategies::plan(t, &ctx);
        result.records_reconstructed = plan.writes.len();
        result.records_skipped = plan.skipped;
        result.details.extend(plan.details);
        result.errors.extend(plan.errors);
        debug!(
            event = "reconstruction_planned",
            reconstruction_type = %t,
            writes = result.records_reconstructed,
            skipped = result.records_skipped,
        );

        if options.dry_run || plan.writes.is_empty() {
            result.duration_ms = start.elapsed().as_millis() as u64;
            return result;
        }

        let scope = t.write_scope();
        if options.create_backup {
            match self
                .backups
                .create_backup(scope, &format!("pre-reconstruction:{t}"))
                .await
            {
                Ok(id) => result.backup_id = Some(id),
                Err(err) => {
                    result.records_reconstructed = 0;
                    result.errors.push(format!("backup failed: {err}"));
                    result.duration_ms = start.elapsed().as_millis() as u64;
                    return result;
                }
            }
        }

        match self
            .store
            .transaction(scope, TransactionMode::ReadWrite, plan.writes)
            .await
        {
            Ok(()) => {
                sources.invalidate(scope);
                info!(
                    event = "reconstruction_written",
                    reconstruction_type = %t,
                    records = result.records_reconstructed,
                    backup_id = ?result.backup_id,
                    "reconstruction committed"
                );
            }
            Err(err) => {
                let failure = ReconstructionError::WriteFailed {
                    reconstruction_type: t.to_string(),
                    reason: err.to_string(),
                };
                warn!(event = "reconstruction_write_failed", error = %failure);
                result.records_reconstructed = 0;
                result.errors.push(failure.to_string());
            }
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }
}
