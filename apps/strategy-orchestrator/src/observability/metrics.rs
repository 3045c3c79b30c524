//! Prometheus metrics for the strategy orchestrator.
//!
//! Covers RPC calls, retries, circuit breakers, stage outcomes and workflow
//! terminal statuses. Recording without an installed recorder is a no-op.
//!
//! # Example
//!
//! ```ignore
//! use strategy_orchestrator::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! metrics::record_stage("technical", "SUCCESS", 0.120);
//! ```

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

use crate::resilience::{CircuitBreakerState, HealthStatus};

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for latency measurements (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
            // Remote analysis calls take from milliseconds up to the 30s call timeout
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// RPC Metrics
// ============================================================================

/// Record one RPC attempt against a dependency.
///
/// # Arguments
///
/// * `service` - Dependency name (e.g., "`technical_analyst`")
/// * `method` - Wire method (e.g., "`analyze_technical`")
/// * `outcome` - Outcome kind ("success", "transport", "protocol")
/// * `latency_seconds` - Time from send to classified reply
pub fn record_rpc_call(service: &str, method: &str, outcome: &str, latency_seconds: f64) {
    counter!(
        "rpc_calls_total",
        "service" => service.to_string(),
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "rpc_call_latency_seconds",
        "service" => service.to_string(),
        "method" => method.to_string()
    )
    .record(latency_seconds);
}

/// Record a retry scheduled after a retryable failure.
pub fn record_retry_attempt(service: &str) {
    counter!(
        "rpc_retries_total",
        "service" => service.to_string()
    )
    .increment(1);
}

// ============================================================================
// Circuit Breaker Metrics
// ============================================================================

/// Update circuit breaker state gauge (0=closed, 1=`half_open`, 2=open).
pub fn record_circuit_breaker_state(service: &str, state: CircuitBreakerState) {
    gauge!(
        "circuit_breaker_state",
        "service" => service.to_string()
    )
    .set(state.as_gauge());
}

/// Record a call rejected because the circuit was open.
pub fn record_circuit_breaker_rejected(service: &str) {
    counter!(
        "circuit_breaker_rejected_total",
        "service" => service.to_string()
    )
    .increment(1);
}

/// Update the dependency health gauge (1 when healthy, 0 otherwise).
pub fn record_dependency_health(service: &str, status: HealthStatus) {
    gauge!(
        "dependency_health",
        "service" => service.to_string()
    )
    .set(if status == HealthStatus::Healthy { 1.0 } else { 0.0 });
}

// ============================================================================
// Workflow Metrics
// ============================================================================

/// Record a resolved stage.
///
/// # Arguments
///
/// * `stage` - Stage name (e.g., "fundamental")
/// * `outcome` - Stage outcome (e.g., "SUCCESS", "`DOMAIN_REJECTION`")
/// * `duration_seconds` - Time spent in the stage's call
pub fn record_stage(stage: &str, outcome: &str, duration_seconds: f64) {
    counter!(
        "workflow_stages_total",
        "stage" => stage.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "workflow_stage_duration_seconds",
        "stage" => stage.to_string()
    )
    .record(duration_seconds);
}

/// Record a workflow reaching its terminal status.
pub fn record_workflow_terminal(status: &str) {
    counter!(
        "workflows_finished_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
