//! Configuration module for the strategy orchestrator.
//!
//! YAML loading with `${VAR}` / `${VAR:-default}` environment
//! interpolation, followed by validation. Every section has defaults, so an
//! empty document yields a runnable configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use strategy_orchestrator::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("deploy/orchestrator.yaml"))?;
//!
//! println!("HTTP port: {}", config.server.http_port);
//! ```

mod circuit_breaker;
mod observability;
mod retry;
mod server;
mod services;
mod workflow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerSettings};
pub use observability::{LogFormat, LoggingConfig, MetricsExporterConfig, ObservabilityConfig};
pub use retry::RetryConfig;
pub use server::ServerConfig;
pub use services::{ServiceEndpointConfig, ServicesConfig};
pub use workflow::WorkflowConfig;

use crate::domain::workflow::ServiceDependency;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "ORCHESTRATOR_CONFIG";

/// Config file read when `ORCHESTRATOR_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP API server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote agent endpoints.
    #[serde(default)]
    pub services: ServicesConfig,
    /// Retry policy for remote calls.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Circuit breaker configuration.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Pipeline tunables.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Resolve the config file from `ORCHESTRATOR_CONFIG` and load it.
///
/// An explicitly named file must exist. When the variable is unset and
/// `config.yaml` is absent, the built-in defaults are used.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_config(Some(&path)),
        _ if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(None),
        _ => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::ValidationError(msg)) };

    // Services
    for dependency in ServiceDependency::ALL {
        let endpoint = config.services.endpoint(dependency);
        if endpoint.url.trim().is_empty() {
            return invalid(format!("services.{}.url must not be empty", dependency.as_str()));
        }
        if endpoint.timeout_ms == 0 {
            return invalid(format!("services.{}.timeout_ms must be positive", dependency.as_str()));
        }
    }
    if config.services.health_check_timeout_ms == 0 {
        return invalid("services.health_check_timeout_ms must be positive".to_string());
    }

    // Retry
    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return invalid("retry.max_attempts must be at least 1".to_string());
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        return invalid("retry.jitter_ratio must be between 0.0 and 1.0".to_string());
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        return invalid("retry.base_delay_ms must not exceed retry.max_delay_ms".to_string());
    }

    // Circuit breakers
    for dependency in ServiceDependency::ALL {
        let cb = config.circuit_breaker.settings(dependency);
        if cb.failure_threshold == 0 {
            return invalid(format!(
                "circuit_breaker.failure_threshold for {} must be at least 1",
                dependency.as_str()
            ));
        }
        if cb.failure_window_secs == 0 || cb.cooldown_secs == 0 {
            return invalid(format!(
                "circuit_breaker window and cooldown for {} must be positive",
                dependency.as_str()
            ));
        }
    }

    // Workflow
    let workflow = &config.workflow;
    if workflow.timeout_secs == 0 {
        return invalid("workflow.timeout_secs must be positive".to_string());
    }
    if workflow.max_companies == 0 {
        return invalid("workflow.max_companies must be at least 1".to_string());
    }
    if workflow.max_single_trade_value <= Decimal::ZERO {
        return invalid("workflow.max_single_trade_value must be positive".to_string());
    }

    Ok(())
}
