//! ReferentialChecker: loads snapshots, runs scans, scores, suggests, repairs.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use mender_core::config::{ReferentialConfig, StorageConfig};
use mender_core::errors::{MenderResult, RepairError};
use mender_core::models::{
    CheckAllOptions, IntegrityReport, RepairOptions, RepairOutcome, RepairResult,
    RepairSuggestion, Violation, ViolationSummary,
};
use mender_core::schema::SchemaRegistry;
use mender_core::traits::DocumentStore;
use mender_resilience::{ResilientStore, RetryExecutor};
use mender_storage::backup::BackupManager;

use crate::cache::{CollectionScan, ScanCache};
use crate::repair;
use crate::scans::{key_set, scan_cycles, scan_missing, scan_orphans};
use crate::score::calculate_integrity_score;
use crate::snapshot::Snapshots;
use crate::suggestions::generate_repair_suggestions;

pub struct ReferentialChecker<S: DocumentStore> {
    store: ResilientStore<S>,
    registry: Arc<SchemaRegistry>,
    config: ReferentialConfig,
    cache: ScanCache,
    backups: Arc<BackupManager<ResilientStore<S>>>,
}

impl<S: DocumentStore> ReferentialChecker<S> {
    pub fn new(
        store: ResilientStore<S>,
        registry: Arc<SchemaRegistry>,
        config: ReferentialConfig,
        backups: Arc<BackupManager<ResilientStore<S>>>,
    ) -> Self {
        Self {
            cache: ScanCache::new(&config),
            store,
            registry,
            config,
            backups,
        }
    }

    /// Default executor, config and backup retention.
    pub fn with_defaults(store: Arc<S>, registry: Arc<SchemaRegistry>) -> Self {
        let store = ResilientStore::new(store, Arc::new(RetryExecutor::with_defaults()));
        let backups = Arc::new(BackupManager::new(
            Arc::new(store.clone()),
            Arc::clone(&registry),
            StorageConfig::default().backup_retention,
        ));
        Self::new(store, registry, ReferentialConfig::default(), backups)
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn backups(&self) -> &Arc<BackupManager<ResilientStore<S>>> {
        &self.backups
    }

    /// Drop every cached scan.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }

    /// Scan `collections` (every registered collection when empty).
    pub async fn check_all(
        &self,
        collections: &[&str],
        options: &CheckAllOptions,
    ) -> MenderResult<IntegrityReport> {
        let start = Instant::now();
        let scope = self.resolve_scope(collections)?;
        let store = self.store.with_priority(options.priority);
        let mut snapshots = Snapshots::new(&store);

        let mut violations: Vec<Violation> = Vec::new();
        let mut constraints_checked = 0;
        let mut cached = 0;

        for collection in &scope {
            let scan = match self.cached_scan(collection, options) {
                Some(hit) => {
                    cached += 1;
                    hit
                }
                None => {
                    let scan = Arc::new(self.scan_collection(collection, options, &mut snapshots).await?);
                    self.cache.insert(collection, options, Arc::clone(&scan));
                    scan
                }
            };
            constraints_checked += scan.constraints_checked;
            violations.extend(scan.violations.iter().cloned());
        }

        let mut seen = HashSet::new();
        violations.retain(|v| seen.insert(v.id.clone()));

        let score = calculate_integrity_score(&violations, constraints_checked);
        let summary = ViolationSummary::from_violations(&violations);
        let suggestions = generate_repair_suggestions(&violations, &self.registry);
        let from_cache = !scope.is_empty() && cached == scope.len();

        info!(
            event = "integrity_checked",
            collections = scope.len(),
            constraints = constraints_checked,
            violations = violations.len(),
            critical = summary.critical(),
            score,
            reads = snapshots.reads(),
            from_cache,
            "referential integrity pass complete"
        );

        Ok(IntegrityReport {
            timestamp: Utc::now(),
            collections_checked: scope,
            constraints_checked,
            violations,
            summary,
            score,
            suggestions,
            duration_ms: start.elapsed().as_millis() as u64,
            from_cache,
        })
    }

    /// Apply eligible suggestions, one transaction per record, behind a backup.
    ///
    /// Per-record failures are recorded in the result and do not stop the batch.
    pub async fn execute_repairs(
        &self,
        suggestions: &[RepairSuggestion],
        options: &RepairOptions,
    ) -> MenderResult<RepairResult> {
        let start = Instant::now();
        let limit = options.max_repairs.min(self.config.max_repairs);
        let (selected, skipped) = repair::select(suggestions, options, limit);
        let mut result = RepairResult {
            dry_run: options.dry_run,
            skipped,
            ..Default::default()
        };

        if !options.dry_run && options.create_backup && !selected.is_empty() {
            let touched = repair::collections_touched(&self.registry, &selected);
            let scope: Vec<&str> = touched.iter().map(String::as_str).collect();
            let backup_id = self
                .backups
                .create_backup(&scope, "pre-repair")
                .await
                .map_err(|e| RepairError::BackupFailed {
                    reason: e.to_string(),
                })?;
            result.backup_id = Some(backup_id);
        }

        for suggestion in selected {
            result.attempted += 1;
            if options.dry_run {
                result.successful += 1;
                result.outcomes.push(RepairOutcome {
                    violation_id: suggestion.violation_id.clone(),
                    action: suggestion.action.clone(),
                    success: true,
                    description: format!("would {}", suggestion.action.describe()),
                    error: None,
                });
                continue;
            }

            match repair::apply_action(&self.store, &self.registry, &suggestion.action).await {
                Ok(description) => {
                    result.successful += 1;
                    debug!(event = "repair_applied", violation_id = %suggestion.violation_id, %description);
                    result.outcomes.push(RepairOutcome {
                        violation_id: suggestion.violation_id.clone(),
                        action: suggestion.action.clone(),
                        success: true,
                        description,
                        error: None,
                    });
                }
                Err(err) => {
                    result.failed += 1;
                    warn!(
                        event = "repair_failed",
                        violation_id = %suggestion.violation_id,
                        error = %err,
                        "repair failed"
                    );
                    result.outcomes.push(RepairOutcome {
                        violation_id: suggestion.violation_id.clone(),
                        action: suggestion.action.clone(),
                        success: false,
                        description: suggestion.action.describe(),
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        if !options.dry_run && result.successful > 0 {
            self.cache.invalidate_all();
        }
        result.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            event = "repairs_executed",
            attempted = result.attempted,
            successful = result.successful,
            failed = result.failed,
            skipped = result.skipped,
            dry_run = result.dry_run,
            backup_id = ?result.backup_id,
            "repair batch complete"
        );
        Ok(result)
    }

    fn resolve_scope(&self, collections: &[&str]) -> MenderResult<Vec<String>> {
        if collections.is_empty() {
            return Ok(self.registry.collections());
        }
        let mut scope = Vec::new();
        for collection in collections {
            self.registry.require(collection)?;
            if !scope.iter().any(|c: &String| c == collection) {
                scope.push(collection.to_string());
            }
        }
        Ok(scope)
    }

    fn cached_scan(&self, collection: &str, options: &CheckAllOptions) -> Option<Arc<CollectionScan>> {
        if options.use_cache {
            self.cache.get(collection, options)
        } else {
            None
        }
    }

    async fn scan_collection(
        &self,
        collection: &str,
        options: &CheckAllOptions,
        snapshots: &mut Snapshots<'_, ResilientStore<S>>,
    ) -> MenderResult<CollectionScan> {
        let schema = self.registry.require(collection)?;
        let mut scan = CollectionScan::default();

        if options.include_missing {
            for fk in &schema.foreign_keys {
                let records = snapshots.load(collection).await?;
                let targets = snapshots.load(&fk.collection).await?;
                let target_keys = key_set(&targets, &fk.target_field);
                scan.violations.extend(scan_missing(
                    collection,
                    &schema.key_path,
                    fk,
                    &records,
                    &target_keys,
                ));
                scan.constraints_checked += 1;
            }
        }

        if options.include_orphans {
            for constraint in &schema.reverse_constraints {
                let records = snapshots.load(collection).await?;
                let sources = snapshots.load(&constraint.source_collection).await?;
                scan.violations.extend(scan_orphans(
                    collection,
                    &schema.key_path,
                    constraint,
                    &records,
                    &sources,
                ));
                scan.constraints_checked += 1;
            }
        }

        if options.deep_check {
            if let Some(extractor) = &schema.graph {
                let records = snapshots.load(collection).await?;
                scan.violations
                    .extend(scan_cycles(collection, &schema.key_path, extractor, &records));
                scan.constraints_checked += 1;
            }
        }

        Ok(scan)
    }
}
