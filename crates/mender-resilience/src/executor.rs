//! RetryExecutor: the single path for fallible store I/O.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use mender_core::config::ResilienceConfig;
use mender_core::errors::{MenderError, MenderResult, StoreError};
use mender_core::models::{
    CircuitBreakerState, ErrorCategory, ErrorReport, ErrorSeverity, Priority,
};
use mender_core::traits::ErrorSink;

use crate::backoff::BackoffPolicy;
use crate::cancellation::{wait_cancelled, CancellationToken};
use crate::circuit_breaker::CircuitBreaker;
use crate::dedup::InFlight;
use crate::error_sink::TracingErrorSink;

/// Per-call options. Unset timeout/retries fall back to the executor's config.
#[derive(Debug, Clone, Default)]
pub struct RetryOptions {
    pub operation_name: String,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub dedup_key: Option<String>,
    pub priority: Priority,
    pub cancellation: Option<CancellationToken>,
}

impl RetryOptions {
    pub fn named(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn dedup(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Result plus the retry trail.
#[derive(Debug, Clone)]
pub struct RetryOutcome<T> {
    pub result: MenderResult<T>,
    /// Times the operation was invoked by this call (the leader's count for deduplicated calls).
    pub attempts: u32,
    /// Backoff delays slept between attempts.
    pub delays: Vec<Duration>,
    pub elapsed: Duration,
    /// The result was shared from another in-flight call.
    pub deduplicated: bool,
}

pub struct RetryExecutor {
    config: ResilienceConfig,
    backoff: BackoffPolicy,
    breaker: CircuitBreaker,
    inflight: InFlight,
    sink: Arc<dyn ErrorSink>,
}

impl RetryExecutor {
    pub fn new(config: ResilienceConfig, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            backoff: BackoffPolicy::from_config(&config),
            breaker: CircuitBreaker::from_config(&config),
            inflight: InFlight::new(),
            config,
            sink,
        }
    }

    /// Default config, errors logged through `tracing`.
    pub fn with_defaults() -> Self {
        Self::new(ResilienceConfig::default(), Arc::new(TracingErrorSink))
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    pub fn breaker_state(&self) -> CircuitBreakerState {
        self.breaker.snapshot()
    }

    /// Force-close the breaker.
    pub fn reset(&self) {
        self.breaker.reset();
    }

    /// Keys currently in flight.
    pub fn in_flight_count(&self) -> usize {
        self.inflight.len()
    }

    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation: F,
        options: RetryOptions,
    ) -> MenderResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = MenderResult<T>> + Send,
        T: Clone + Send + Sync + 'static,
    {
        self.execute_with_retry_outcome(operation, options)
            .await
            .result
    }

    pub async fn execute_with_retry_outcome<T, F, Fut>(
        &self,
        operation: F,
        options: RetryOptions,
    ) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = MenderResult<T>> + Send,
        T: Clone + Send + Sync + 'static,
    {
        let Some(key) = options.dedup_key.clone() else {
            return self.run(operation, &options).await;
        };
        let Some(cell) = self.inflight.join::<RetryOutcome<T>>(&key) else {
            return self.run(operation, &options).await;
        };

        // The shared run ignores every caller's token; each waiter races the
        // cell against its own.
        let shared = RetryOptions {
            cancellation: None,
            ..options.clone()
        };
        let start = Instant::now();
        let led = AtomicBool::new(false);
        let joined = tokio::select! {
            biased;
            _ = wait_cancelled(options.cancellation.as_ref()) => None,
            outcome = cell.get_or_init(|| {
                led.store(true, Ordering::SeqCst);
                self.run(operation, &shared)
            }) => Some(outcome.clone()),
        };

        let Some(mut outcome) = joined else {
            // Last waiter out drops the key; the map holds the other reference.
            if Arc::strong_count(&cell) <= 2 {
                self.inflight.release(&key, &cell);
            }
            return RetryOutcome {
                result: Err(MenderError::Cancelled {
                    operation: options.operation_name.clone(),
                }),
                attempts: 0,
                delays: Vec::new(),
                elapsed: start.elapsed(),
                deduplicated: !led.load(Ordering::SeqCst),
            };
        };
        self.inflight.release(&key, &cell);

        if !led.load(Ordering::SeqCst) {
            outcome.deduplicated = true;
            debug!(
                event = "request_deduplicated",
                key = %key,
                operation = %options.operation_name,
                "joined in-flight call"
            );
        }
        outcome
    }

    async fn run<T, F, Fut>(&self, mut operation: F, options: &RetryOptions) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = MenderResult<T>> + Send,
    {
        let start = Instant::now();
        let retries = options.retries.unwrap_or(self.config.retries);
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let token = options.cancellation.as_ref();

        let mut attempts = 0u32;
        let mut delays = Vec::new();
        let mut last_delay = Duration::ZERO;
        let mut exhausted = false;

        let result = loop {
            if token.is_some_and(CancellationToken::is_cancelled) {
                break Err(MenderError::Cancelled {
                    operation: options.operation_name.clone(),
                });
            }
            if let Err(retry_after) = self.breaker.try_acquire() {
                break Err(MenderError::CircuitOpen {
                    retry_after_ms: retry_after.as_millis() as u64,
                });
            }

            attempts += 1;
            let attempt = operation();
            let attempt_result = tokio::select! {
                r = attempt => r,
                _ = tokio::time::sleep(timeout) => Err(StoreError::Timeout {
                    operation: options.operation_name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }.into()),
                _ = wait_cancelled(token) => Err(MenderError::Cancelled {
                    operation: options.operation_name.clone(),
                }),
            };

            match attempt_result {
                Ok(value) => {
                    self.breaker.record_success();
                    break Ok(value);
                }
                Err(err) if !err.is_retryable() => {
                    self.breaker.release_trial();
                    break Err(err);
                }
                Err(err) => {
                    let opened = self.breaker.record_failure();
                    if attempts > retries {
                        exhausted = true;
                        break Err(err);
                    }
                    if opened || self.breaker.is_open() {
                        exhausted = true;
                        break Err(MenderError::CircuitOpen {
                            retry_after_ms: self.config.reset_timeout_ms,
                        });
                    }

                    let delay = self
                        .backoff
                        .delay_for(attempts - 1, options.priority)
                        .max(last_delay);
                    last_delay = delay;
                    delays.push(delay);
                    warn!(
                        event = "retry_scheduled",
                        operation = %options.operation_name,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );

                    let interrupted = tokio::select! {
                        _ = tokio::time::sleep(delay) => false,
                        _ = wait_cancelled(token) => true,
                    };
                    if interrupted {
                        break Err(MenderError::Cancelled {
                            operation: options.operation_name.clone(),
                        });
                    }
                }
            }
        };

        if exhausted {
            if let Err(err) = &result {
                self.report_exhausted(err, attempts, &options.operation_name);
            }
        }

        RetryOutcome {
            result,
            attempts,
            delays,
            elapsed: start.elapsed(),
            deduplicated: false,
        }
    }

    fn report_exhausted(&self, err: &MenderError, attempts: u32, operation: &str) {
        let category = err.category();
        let severity = match category {
            ErrorCategory::Quota => ErrorSeverity::Critical,
            ErrorCategory::Connectivity => ErrorSeverity::High,
            _ => ErrorSeverity::Medium,
        };
        let breaker = self.breaker.snapshot();
        let report = ErrorReport::new(err.to_string(), category, severity)
            .with_context("operation", operation)
            .with_context("attempts", attempts)
            .with_context("breaker_state", format!("{:?}", breaker.state))
            .with_context("breaker_failures", breaker.failures);
        self.sink.report(report);
    }
}
