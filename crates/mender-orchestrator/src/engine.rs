//! [`IntegrityOrchestrator`]: owns the resilient store, the referential checker,
//! the reconstructor, check history and periodic monitoring.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::Utc;
use tracing::Instrument;

use mender_core::config::{MenderConfig, MonitoringConfig};
use mender_core::errors::{MenderError, MenderResult};
use mender_core::models::{
    CheckAllOptions, CheckOptions, CheckReport, CheckType, HealthTrend, IntegrityReport,
    OverallResult, PerformanceMetrics, PhaseResults, Priority, ReconstructionOptions,
    ReconstructionReport, ReconstructionResult, RepairOptions, RepairResult, RepairSuggestion,
    SystemErrorInfo, TrendDirection,
};
use mender_core::schema::{DeclaredSchemaValidator, SchemaRegistry};
use mender_core::traits::{
    DocumentStore, ErrorSink, ReviewScheduler, SchemaValidator, StorageHealthProbe, TagSimilarity,
};
use mender_reconstruction::Reconstructor;
use mender_referential::ReferentialChecker;
use mender_resilience::{ResilientStore, RetryExecutor, TracingErrorSink};
use mender_storage::backup::BackupManager;

use crate::history::CheckHistory;
use crate::monitoring::{self, Monitor};
use crate::phases::{business, schema, storage};
use crate::tracing_setup::events;
use crate::{recommendations, scoring, trend};

pub struct IntegrityOrchestrator<S: DocumentStore + StorageHealthProbe + 'static> {
    store: ResilientStore<S>,
    registry: Arc<SchemaRegistry>,
    validator: Arc<dyn SchemaValidator>,
    config: MenderConfig,
    checker: ReferentialChecker<S>,
    reconstructor: Reconstructor<S>,
    backups: Arc<BackupManager<ResilientStore<S>>>,
    history: CheckHistory,
    last_trend: Mutex<TrendDirection>,
    monitor: Monitor,
}

impl<S: DocumentStore + StorageHealthProbe + 'static> IntegrityOrchestrator<S> {
    /// Exhausted retries are logged through `tracing`.
    pub fn new(store: Arc<S>, registry: Arc<SchemaRegistry>, config: MenderConfig) -> Self {
        Self::with_error_sink(store, registry, config, Arc::new(TracingErrorSink))
    }

    pub fn with_defaults(store: Arc<S>, registry: Arc<SchemaRegistry>) -> Self {
        Self::new(store, registry, MenderConfig::default())
    }

    pub fn with_error_sink(
        store: Arc<S>,
        registry: Arc<SchemaRegistry>,
        config: MenderConfig,
        sink: Arc<dyn ErrorSink>,
    ) -> Self {
        let executor = Arc::new(RetryExecutor::new(config.resilience.clone(), sink));
        let store = ResilientStore::new(store, executor);
        let backups = Arc::new(BackupManager::new(
            Arc::new(store.clone()),
            Arc::clone(&registry),
            config.storage.backup_retention,
        ));
        let checker = ReferentialChecker::new(
            store.clone(),
            Arc::clone(&registry),
            config.referential.clone(),
            Arc::clone(&backups),
        );
        let reconstructor = Reconstructor::new(
            store.clone(),
            config.reconstruction.clone(),
            Arc::clone(&backups),
        );
        Self {
            validator: Arc::new(DeclaredSchemaValidator::new(Arc::clone(&registry))),
            history: CheckHistory::new(config.monitoring.history_limit),
            last_trend: Mutex::new(TrendDirection::InsufficientData),
            monitor: Monitor::default(),
            store,
            registry,
            config,
            checker,
            reconstructor,
            backups,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn ReviewScheduler>) -> Self {
        self.reconstructor = self.reconstructor.with_scheduler(scheduler);
        self
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn TagSimilarity>) -> Self {
        self.reconstructor = self.reconstructor.with_similarity(similarity);
        self
    }

    pub fn config(&self) -> &MenderConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &Arc<RetryExecutor> {
        self.store.executor()
    }

    pub fn backups(&self) -> &Arc<BackupManager<ResilientStore<S>>> {
        &self.backups
    }

    /// Run the phases `options.check_type` selects. Never fails: a check that
    /// cannot run returns an invalid report with the error attached.
    pub async fn perform_integrity_check(&self, options: &CheckOptions) -> CheckReport {
        let span = crate::integrity_check_span!(options.check_type.as_str());
        self.run_check(options).instrument(span).await
    }

    /// On-demand check at high priority.
    pub async fn trigger_manual_check(&self, check_type: CheckType) -> CheckReport {
        let options = CheckOptions {
            check_type,
            priority: Priority::High,
            ..Default::default()
        };
        self.perform_integrity_check(&options).await
    }

    pub async fn check_all_referential_integrity(
        &self,
        options: &CheckAllOptions,
    ) -> MenderResult<IntegrityReport> {
        self.checker.check_all(&[], options).await
    }

    pub async fn execute_repairs(
        &self,
        suggestions: &[RepairSuggestion],
        options: &RepairOptions,
    ) -> MenderResult<RepairResult> {
        let span = crate::repair_span!(suggestions.len(), options.dry_run);
        self.checker
            .execute_repairs(suggestions, options)
            .instrument(span)
            .await
    }

    pub async fn reconstruct_data(&self, options: &ReconstructionOptions) -> ReconstructionReport {
        let span = crate::reconstruction_span!(options.types.len(), options.dry_run);
        let report = self
            .reconstructor
            .reconstruct_data(options)
            .instrument(span)
            .await;
        if !options.dry_run && report.total_reconstructed() > 0 {
            self.checker.invalidate_cache();
        }
        report
    }

    /// Newest first.
    pub fn get_check_history(&self, limit: usize) -> Vec<CheckReport> {
        self.history.recent(limit)
    }

    /// Newest first.
    pub fn get_reconstruction_history(&self, limit: usize) -> Vec<ReconstructionResult> {
        self.reconstructor.history(limit)
    }

    pub fn health_trend(&self) -> HealthTrend {
        let monitoring = &self.config.monitoring;
        trend::health_trend(
            &self.history.scores(),
            monitoring.trend_window,
            monitoring.trend_threshold,
        )
    }

    /// Spawn the quick and full monitors on the current tokio runtime,
    /// replacing any that are already running.
    pub fn start_periodic_monitoring(self: &Arc<Self>, config: MonitoringConfig) -> MenderResult<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(MenderError::Config {
                reason: "periodic monitoring needs a running tokio runtime".to_string(),
            });
        }
        let tasks = monitoring::spawn(Arc::downgrade(self), &config);
        let replaced = self.monitor.replace(tasks);
        if replaced > 0 {
            events::monitoring_stopped(replaced);
        }
        events::monitoring_started(
            config.quick_interval_secs,
            config.full_interval_secs,
            config.auto_repair,
        );
        Ok(())
    }

    pub fn stop_periodic_monitoring(&self) {
        let stopped = self.monitor.stop();
        if stopped > 0 {
            events::monitoring_stopped(stopped);
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_running()
    }

    async fn run_check(&self, options: &CheckOptions) -> CheckReport {
        let start = Instant::now();
        let mut results = PhaseResults::default();
        let mut metrics = PerformanceMetrics::default();

        let outcome = self.run_phases(options, &mut results, &mut metrics).await;
        metrics.total_ms = start.elapsed().as_millis() as u64;

        let report = match outcome {
            Ok(()) => {
                let overall = scoring::overall(&results);
                events::check_completed(
                    options.check_type,
                    overall.score,
                    overall.errors,
                    overall.warnings,
                    metrics.total_ms,
                );
                CheckReport {
                    id: uuid::Uuid::new_v4().to_string(),
                    timestamp: Utc::now(),
                    check_type: options.check_type,
                    overall,
                    recommendations: recommendations::generate(&results),
                    results,
                    performance_metrics: metrics,
                    error: None,
                }
            }
            Err(err) => {
                let error = system_error(&err);
                events::check_failed(options.check_type, &error);
                let (errors, warnings) = scoring::tally(&results);
                CheckReport {
                    id: uuid::Uuid::new_v4().to_string(),
                    timestamp: Utc::now(),
                    check_type: options.check_type,
                    overall: OverallResult {
                        valid: false,
                        score: 0.0,
                        errors: errors + 1,
                        warnings,
                    },
                    recommendations: recommendations::generate(&results),
                    results,
                    performance_metrics: metrics,
                    error: Some(error),
                }
            }
        };

        if options.save_to_history {
            self.history.push(report.clone());
            self.note_trend();
        }
        report
    }

    async fn run_phases(
        &self,
        options: &CheckOptions,
        results: &mut PhaseResults,
        metrics: &mut PerformanceMetrics,
    ) -> MenderResult<()> {
        let store = self.store.with_priority(options.priority);
        store.open().await?;
        let scope = self.resolve_scope(&options.stores)?;
        let check_type = options.check_type;

        if check_type.runs_schema() {
            let t = Instant::now();
            let sample = (check_type == CheckType::Quick)
                .then_some(self.config.monitoring.quick_sample_size);
            let phase =
                schema::run(&store, self.validator.as_ref(), &self.registry, &scope, sample).await?;
            results.schema = Some(phase);
            metrics.schema_ms = t.elapsed().as_millis() as u64;
        }

        if check_type.runs_referential() {
            let t = Instant::now();
            let collections: Vec<&str> = scope.iter().map(String::as_str).collect();
            let check = CheckAllOptions {
                deep_check: true,
                priority: options.priority,
                ..Default::default()
            };
            results.referential = Some(self.checker.check_all(&collections, &check).await?);
            metrics.referential_ms = t.elapsed().as_millis() as u64;
        }

        if check_type.runs_business_logic() {
            let t = Instant::now();
            let anomalies = options.priority == Priority::Critical;
            let phase = business::run(&store, &self.registry, &scope, anomalies).await?;
            results.business_logic = Some(phase);
            metrics.business_logic_ms = t.elapsed().as_millis() as u64;
        }

        if check_type.runs_storage_health() {
            let t = Instant::now();
            results.storage_health = Some(storage::run(&store).await?);
            metrics.storage_health_ms = t.elapsed().as_millis() as u64;
        }
        Ok(())
    }

    fn resolve_scope(&self, stores: &[String]) -> MenderResult<Vec<String>> {
        if stores.is_empty() {
            return Ok(self.registry.collections());
        }
        for collection in stores {
            self.registry.require(collection)?;
        }
        Ok(stores.to_vec())
    }

    fn note_trend(&self) {
        let current = self.health_trend();
        let mut last = self.last_trend.lock().unwrap_or_else(|e| e.into_inner());
        if current.direction != *last {
            if let (TrendDirection::Improving | TrendDirection::Declining, Some(recent), Some(previous)) =
                (current.direction, current.recent_average, current.previous_average)
            {
                events::trend_changed(current.direction, recent, previous);
            }
            *last = current.direction;
        }
    }
}

/// Flatten an error and its sources, outermost first.
pub fn system_error(err: &MenderError) -> SystemErrorInfo {
    let mut chain = vec![err.to_string()];
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        chain.push(inner.to_string());
        source = std::error::Error::source(inner);
    }
    SystemErrorInfo {
        message: err.to_string(),
        category: err.category(),
        chain,
    }
}
