//! A collaborator service reached through breaker, retry and client.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{
    CallError, CircuitBreaker, CircuitBreakerMetrics, DependencyHealth, HealthStatus, RetryPolicy,
    SystemHealth, with_retry,
};
use crate::domain::workflow::ServiceDependency;
use crate::observability::metrics;
use crate::rpc::{RpcClient, RpcTarget};

/// Default bound on a single health check.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// What one protected call did.
#[derive(Debug, Clone)]
pub struct CallReport {
    /// Network attempts made (0 when the breaker rejected the call).
    pub attempts: u32,
    /// When the call was started.
    pub started_at: DateTime<Utc>,
    /// Time spent, including backoff.
    pub duration: Duration,
    /// Payload, or why there is none.
    pub result: Result<Value, CallError>,
}

/// One dependency bound to its client, breaker and retry policy.
#[derive(Debug)]
pub struct ProtectedDependency {
    target: RpcTarget,
    client: RpcClient,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
    call_timeout: Duration,
}

impl ProtectedDependency {
    /// Bind a dependency.
    #[must_use]
    pub const fn new(
        target: RpcTarget,
        client: RpcClient,
        breaker: Arc<CircuitBreaker>,
        retry: RetryPolicy,
        call_timeout: Duration,
    ) -> Self {
        Self {
            target,
            client,
            breaker,
            retry,
            call_timeout,
        }
    }

    /// Dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.target.name
    }

    /// Where the dependency is reached.
    #[must_use]
    pub const fn target(&self) -> &RpcTarget {
        &self.target
    }

    /// The dependency's circuit breaker.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Check the service's health endpoint.
    ///
    /// Goes straight to the client: the check neither waits on nor counts
    /// against the breaker.
    pub async fn check_health(&self, timeout: Duration) -> DependencyHealth {
        let checked_at = Utc::now();
        let started = tokio::time::Instant::now();
        let result = self.client.check_health(&self.target, timeout).await;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let breaker_state = self.breaker.state();
        let status = HealthStatus::of_dependency(result.is_ok(), breaker_state);
        metrics::record_dependency_health(&self.target.name, status);

        if let Err(fault) = &result {
            tracing::warn!(
                service = %self.target.name,
                error = %fault,
                "Dependency health check failed"
            );
        }

        DependencyHealth {
            name: self.target.name.clone(),
            status,
            breaker_state,
            response_time_ms,
            checked_at,
            error: result.err().map(|fault| fault.to_string()),
        }
    }

    /// Call `method` through the breaker and retry executor.
    pub async fn call(&self, method: &str, params: Map<String, Value>) -> CallReport {
        let started_at = Utc::now();
        let started = tokio::time::Instant::now();

        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(err) => {
                tracing::warn!(
                    service = %self.target.name,
                    method,
                    "Call rejected by open circuit breaker"
                );
                return CallReport {
                    attempts: 0,
                    started_at,
                    duration: started.elapsed(),
                    result: Err(err),
                };
            }
        };

        let outcome = with_retry(&self.retry, &self.target.name, |_| {
            self.client
                .call(&self.target, method, params.clone(), self.call_timeout)
        })
        .await;

        match &outcome.result {
            Ok(_) => permit.record_success(),
            Err(err) if err.is_dependency_failure() => permit.record_failure(),
            // Reachable peer that refused the request.
            Err(_) => permit.record_success(),
        }

        CallReport {
            attempts: outcome.attempts(),
            started_at,
            duration: started.elapsed(),
            result: outcome.result,
        }
    }
}

/// The orchestrator's dependency table: one protected client per service.
#[derive(Debug, Clone)]
pub struct ServiceDependencies {
    fundamental_analyst: Arc<ProtectedDependency>,
    technical_analyst: Arc<ProtectedDependency>,
    risk_manager: Arc<ProtectedDependency>,
    trade_executor: Arc<ProtectedDependency>,
    health_check_timeout: Duration,
}

impl ServiceDependencies {
    /// Bind all four services.
    #[must_use]
    pub const fn new(
        fundamental_analyst: Arc<ProtectedDependency>,
        technical_analyst: Arc<ProtectedDependency>,
        risk_manager: Arc<ProtectedDependency>,
        trade_executor: Arc<ProtectedDependency>,
    ) -> Self {
        Self {
            fundamental_analyst,
            technical_analyst,
            risk_manager,
            trade_executor,
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
        }
    }

    /// Bound each health check by `timeout`.
    #[must_use]
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    /// Protected client for a dependency.
    #[must_use]
    pub const fn get(&self, dependency: ServiceDependency) -> &Arc<ProtectedDependency> {
        match dependency {
            ServiceDependency::FundamentalAnalyst => &self.fundamental_analyst,
            ServiceDependency::TechnicalAnalyst => &self.technical_analyst,
            ServiceDependency::RiskManager => &self.risk_manager,
            ServiceDependency::TradeExecutor => &self.trade_executor,
        }
    }

    /// Breaker metrics for every dependency, in pipeline order.
    #[must_use]
    pub fn all_metrics(&self) -> Vec<CircuitBreakerMetrics> {
        ServiceDependency::ALL
            .iter()
            .map(|dep| self.get(*dep).breaker().metrics())
            .collect()
    }

    /// Check every dependency concurrently and roll the results up.
    pub async fn check_health(&self) -> SystemHealth {
        let timeout = self.health_check_timeout;
        let (fundamental, technical, risk, execution) = tokio::join!(
            self.fundamental_analyst.check_health(timeout),
            self.technical_analyst.check_health(timeout),
            self.risk_manager.check_health(timeout),
            self.trade_executor.check_health(timeout),
        );
        SystemHealth::from_dependencies(vec![fundamental, technical, risk, execution])
    }
}
