//! Dependency health.
//!
//! A dependency is judged on two signals: whether it answers its own
//! health endpoint, and the state of its circuit breaker. The pipeline as a
//! whole is unhealthy once more than half of its dependencies are.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CircuitBreakerState;

/// Health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Answers its health check and its breaker is closed.
    Healthy,
    /// Answers its health check, but its breaker has not closed yet.
    Degraded,
    /// Fails its health check.
    Unhealthy,
    /// Nothing has been checked.
    Unknown,
}

impl HealthStatus {
    /// Lowercase name used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Unknown => "unknown",
        }
    }

    /// Status of a dependency given its check result and breaker state.
    #[must_use]
    pub const fn of_dependency(reachable: bool, breaker: CircuitBreakerState) -> Self {
        match (reachable, breaker) {
            (false, _) => Self::Unhealthy,
            (true, CircuitBreakerState::Closed) => Self::Healthy,
            (true, CircuitBreakerState::Open | CircuitBreakerState::HalfOpen) => Self::Degraded,
        }
    }
}

/// Result of checking one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyHealth {
    /// Dependency name.
    pub name: String,
    /// Judged status.
    pub status: HealthStatus,
    /// Breaker state at check time.
    pub breaker_state: CircuitBreakerState,
    /// Time the health check took.
    pub response_time_ms: u64,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
    /// Why the check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rollup over every dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemHealth {
    /// Overall status.
    pub status: HealthStatus,
    /// Dependencies checked.
    pub total: usize,
    /// Dependencies judged healthy.
    pub healthy: usize,
    /// Dependencies judged degraded.
    pub degraded: usize,
    /// Dependencies judged unhealthy.
    pub unhealthy: usize,
    /// Per-dependency results, in pipeline order.
    pub dependencies: Vec<DependencyHealth>,
}

impl SystemHealth {
    /// Roll up per-dependency results.
    #[must_use]
    pub fn from_dependencies(dependencies: Vec<DependencyHealth>) -> Self {
        let count = |status: HealthStatus| dependencies.iter().filter(|d| d.status == status).count();
        let healthy = count(HealthStatus::Healthy);
        let degraded = count(HealthStatus::Degraded);
        let unhealthy = count(HealthStatus::Unhealthy);
        let total = dependencies.len();

        Self {
            status: determine_system_status(total, degraded, unhealthy),
            total,
            healthy,
            degraded,
            unhealthy,
            dependencies,
        }
    }

    /// Whether the pipeline can still take work.
    #[must_use]
    pub const fn is_serving(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

fn determine_system_status(total: usize, degraded: usize, unhealthy: usize) -> HealthStatus {
    if total == 0 {
        HealthStatus::Unknown
    } else if unhealthy > total / 2 {
        HealthStatus::Unhealthy
    } else if unhealthy > 0 || degraded > 0 {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
