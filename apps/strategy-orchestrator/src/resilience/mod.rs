//! Resilience patterns for calls to collaborator services.
//!
//! Each dependency is reached through the same stack:
//!
//! ```text
//! CircuitBreaker → with_retry → RpcClient → transport
//! ```
//!
//! - [`CircuitBreaker`]: fails fast while a dependency is unhealthy
//! - [`with_retry`]: bounded retries with exponential backoff and jitter
//! - [`ProtectedDependency`]: the stack bound to one service
//! - [`SystemHealth`]: active health checks rolled up with breaker state

mod circuit_breaker;
mod dependency;
mod error;
mod health;
mod retry;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitBreakerState,
};
pub use dependency::{
    CallReport, DEFAULT_HEALTH_CHECK_TIMEOUT, ProtectedDependency, ServiceDependencies,
};
pub use error::CallError;
pub use health::{DependencyHealth, HealthStatus, SystemHealth};
pub use retry::{ExponentialBackoff, RetryAttempt, RetryOutcome, RetryPolicy, with_retry};
