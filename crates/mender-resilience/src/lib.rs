//! # mender-resilience
//!
//! Every store call made by the engine goes through a [`RetryExecutor`]:
//! per-attempt timeout, exponential backoff with jitter, request deduplication,
//! a circuit breaker, and cooperative cancellation. [`ResilientStore`] wraps any
//! `DocumentStore` so that its calls are routed through an executor.

pub mod backoff;
pub mod cancellation;
pub mod circuit_breaker;
pub mod dedup;
pub mod error_sink;
pub mod executor;
pub mod resilient_store;

pub use backoff::BackoffPolicy;
pub use cancellation::CancellationToken;
pub use circuit_breaker::CircuitBreaker;
pub use error_sink::TracingErrorSink;
pub use executor::{RetryExecutor, RetryOptions, RetryOutcome};
pub use resilient_store::ResilientStore;
