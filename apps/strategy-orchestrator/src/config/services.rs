//! Remote agent endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::workflow::ServiceDependency;

/// Endpoint of every pipeline dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Fundamental analyst agent.
    #[serde(default = "default_fundamental_analyst")]
    pub fundamental_analyst: ServiceEndpointConfig,
    /// Technical analyst agent.
    #[serde(default = "default_technical_analyst")]
    pub technical_analyst: ServiceEndpointConfig,
    /// Risk manager agent.
    #[serde(default = "default_risk_manager")]
    pub risk_manager: ServiceEndpointConfig,
    /// Trade executor agent.
    #[serde(default = "default_trade_executor")]
    pub trade_executor: ServiceEndpointConfig,
    /// Bound on one `GET {url}/health` check in milliseconds.
    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            fundamental_analyst: default_fundamental_analyst(),
            technical_analyst: default_technical_analyst(),
            risk_manager: default_risk_manager(),
            trade_executor: default_trade_executor(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
        }
    }
}

impl ServicesConfig {
    /// Endpoint configured for a dependency.
    #[must_use]
    pub const fn endpoint(&self, dependency: ServiceDependency) -> &ServiceEndpointConfig {
        match dependency {
            ServiceDependency::FundamentalAnalyst => &self.fundamental_analyst,
            ServiceDependency::TechnicalAnalyst => &self.technical_analyst,
            ServiceDependency::RiskManager => &self.risk_manager,
            ServiceDependency::TradeExecutor => &self.trade_executor,
        }
    }

    /// Bound on one health check.
    #[must_use]
    pub const fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }
}

/// One remote agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpointConfig {
    /// Base URL; requests go to `{url}/a2a`.
    pub url: String,
    /// Per-attempt call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ServiceEndpointConfig {
    /// Endpoint with the default call timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Per-attempt call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_fundamental_analyst() -> ServiceEndpointConfig {
    ServiceEndpointConfig::new("http://localhost:8001")
}

fn default_technical_analyst() -> ServiceEndpointConfig {
    ServiceEndpointConfig::new("http://localhost:8002")
}

fn default_risk_manager() -> ServiceEndpointConfig {
    ServiceEndpointConfig::new("http://localhost:8003")
}

fn default_trade_executor() -> ServiceEndpointConfig {
    ServiceEndpointConfig::new("http://localhost:8004")
}

const fn default_timeout_ms() -> u64 {
    30_000
}

const fn default_health_check_timeout_ms() -> u64 {
    5_000
}
