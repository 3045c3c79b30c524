//! Observability module for metrics and logging.
//!
//! Provides the Prometheus metrics facade used across the orchestrator and
//! the `tracing` subscriber setup used by the binary.

pub mod metrics;
mod tracing;

pub use metrics::{MetricsConfig, MetricsError, init_metrics};
pub use self::tracing::{TracingError, init_tracing};
