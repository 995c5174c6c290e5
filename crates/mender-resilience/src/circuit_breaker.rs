//! Circuit breaker guarding every store call.
//!
//! CLOSED → (threshold consecutive failures) → OPEN → (reset timeout) →
//! HALF_OPEN → one success closes, one failure reopens. HALF_OPEN admits at
//! most `half_open_max_attempts` concurrent trials.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{info, warn};

use mender_core::config::ResilienceConfig;
use mender_core::models::{CircuitBreakerState, CircuitStateKind};

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open { opened_at: Instant },
    HalfOpen { trials: u32 },
}

#[derive(Debug)]
struct Inner {
    state: State,
    failures: u32,
    last_failure_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    reset_timeout: Duration,
    half_open_max: u32,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, reset_timeout: Duration, half_open_max: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            reset_timeout,
            half_open_max: half_open_max.max(1),
            inner: Mutex::new(Inner {
                state: State::Closed,
                failures: 0,
                last_failure_time: None,
            }),
        }
    }

    pub fn from_config(config: &ResilienceConfig) -> Self {
        Self::new(
            config.failure_threshold,
            config.reset_timeout(),
            config.half_open_max_attempts,
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admit a call, or return how long until the breaker may admit one.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut inner = self.lock();
        match inner.state {
            State::Closed => Ok(()),
            State::Open { opened_at } => {
                let elapsed = opened_at.elapsed();
                if elapsed >= self.reset_timeout {
                    inner.state = State::HalfOpen { trials: 1 };
                    info!(event = "circuit_half_open", "circuit breaker admitting trial call");
                    Ok(())
                } else {
                    Err(self.reset_timeout - elapsed)
                }
            }
            State::HalfOpen { trials } => {
                if trials < self.half_open_max {
                    inner.state = State::HalfOpen { trials: trials + 1 };
                    Ok(())
                } else {
                    Err(self.reset_timeout)
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.lock();
        if !matches!(inner.state, State::Closed) {
            info!(event = "circuit_closed", "circuit breaker closed after successful trial");
        }
        inner.state = State::Closed;
        inner.failures = 0;
    }

    /// Count one failed attempt. Returns true when this failure opened the breaker.
    pub fn record_failure(&self) -> bool {
        let mut inner = self.lock();
        inner.failures += 1;
        inner.last_failure_time = Some(Utc::now());
        match inner.state {
            State::Closed if inner.failures >= self.threshold => {
                inner.state = State::Open {
                    opened_at: Instant::now(),
                };
                warn!(
                    event = "circuit_opened",
                    failures = inner.failures,
                    threshold = self.threshold,
                    "circuit breaker opened"
                );
                true
            }
            State::HalfOpen { .. } => {
                inner.state = State::Open {
                    opened_at: Instant::now(),
                };
                warn!(event = "circuit_reopened", "half-open trial failed");
                true
            }
            _ => false,
        }
    }

    /// Give back a half-open trial slot for a call that neither succeeded nor
    /// failed in a way that says anything about the store.
    pub fn release_trial(&self) {
        let mut inner = self.lock();
        if let State::HalfOpen { trials } = inner.state {
            inner.state = State::HalfOpen {
                trials: trials.saturating_sub(1),
            };
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.lock().state, State::Open { .. })
    }

    /// Force-close and forget failures.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = State::Closed;
        inner.failures = 0;
        inner.last_failure_time = None;
    }

    pub fn snapshot(&self) -> CircuitBreakerState {
        let inner = self.lock();
        let (state, half_open_attempts) = match inner.state {
            State::Closed => (CircuitStateKind::Closed, 0),
            State::Open { .. } => (CircuitStateKind::Open, 0),
            State::HalfOpen { trials } => (CircuitStateKind::HalfOpen, trials),
        };
        CircuitBreakerState {
            state,
            failures: inner.failures,
            threshold: self.threshold,
            is_open: state == CircuitStateKind::Open,
            last_failure_time: inner.last_failure_time,
            reset_timeout_ms: self.reset_timeout.as_millis() as u64,
            half_open_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_secs(60), 1)
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_consecutive_failures() {
        let b = breaker();
        assert!(!b.record_failure());
        assert!(!b.record_failure());
        assert!(b.record_failure());
        assert!(b.try_acquire().is_err());
        assert!(b.snapshot().is_open);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_the_streak() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        b.record_success();
        assert!(!b.record_failure());
        assert_eq!(b.snapshot().failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_after_cooldown_then_close() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(b.try_acquire().is_ok());
        assert_eq!(b.snapshot().state, CircuitStateKind::HalfOpen);
        // only one trial admitted
        assert!(b.try_acquire().is_err());
        b.record_success();
        let snap = b.snapshot();
        assert_eq!(snap.state, CircuitStateKind::Closed);
        assert_eq!(snap.failures, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_failure_reopens() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        b.try_acquire().unwrap();
        assert!(b.record_failure());
        assert!(b.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn released_trial_can_be_reused() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        b.try_acquire().unwrap();
        b.release_trial();
        assert!(b.try_acquire().is_ok());
    }
}
