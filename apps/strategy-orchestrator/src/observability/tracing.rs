//! Structured logging setup for the orchestrator binary.
//!
//! Installs a `tracing-subscriber` with an `EnvFilter` (respecting
//! `RUST_LOG`, otherwise the configured level) and either a JSON or a
//! human-readable formatter.
//!
//! # Key Spans
//!
//! - `workflow` - One workflow run, carrying `workflow_id`
//!
//! # Key Targets
//!
//! - `audit` - One event per appended stage result

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};

/// Error type for tracing operations.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// Rejected filter string.
        filter: String,
        /// Parser message.
        message: String,
    },
    /// Failed to initialize tracing subscriber.
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberError(String),
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the configured level cannot be parsed or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TracingError> {
    let env_filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };
    installed.map_err(|e| TracingError::SubscriberError(e.to_string()))?;

    tracing::info!(
        level = %config.level,
        format = ?config.format,
        "Tracing initialized"
    );

    Ok(())
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, TracingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TracingError::InvalidFilter {
        filter: config.level.clone(),
        message: e.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
