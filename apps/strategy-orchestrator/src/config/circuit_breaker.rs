//! Circuit breaker configuration for resilience.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::workflow::ServiceDependency;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CircuitBreakerConfig {
    /// Default circuit breaker settings.
    #[serde(default)]
    pub default: CircuitBreakerSettings,
    /// Fundamental analyst override.
    #[serde(default)]
    pub fundamental_analyst: Option<CircuitBreakerSettings>,
    /// Technical analyst override.
    #[serde(default)]
    pub technical_analyst: Option<CircuitBreakerSettings>,
    /// Risk manager override.
    #[serde(default)]
    pub risk_manager: Option<CircuitBreakerSettings>,
    /// Trade executor override.
    #[serde(default)]
    pub trade_executor: Option<CircuitBreakerSettings>,
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Window the consecutive failures must fall in (seconds).
    #[serde(default = "default_failure_window")]
    pub failure_window_secs: u64,
    /// Duration in open state before probing (seconds).
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            failure_window_secs: default_failure_window(),
            cooldown_secs: default_cooldown(),
        }
    }
}

impl CircuitBreakerSettings {
    /// Convert config settings to resilience module's `CircuitBreakerConfig`.
    #[must_use]
    pub const fn to_resilience_config(&self) -> crate::resilience::CircuitBreakerConfig {
        crate::resilience::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            failure_window: Duration::from_secs(self.failure_window_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
        }
    }
}

impl CircuitBreakerConfig {
    /// Settings in effect for a dependency: its override, else the default.
    #[must_use]
    pub const fn settings(&self, dependency: ServiceDependency) -> &CircuitBreakerSettings {
        let specific = match dependency {
            ServiceDependency::FundamentalAnalyst => &self.fundamental_analyst,
            ServiceDependency::TechnicalAnalyst => &self.technical_analyst,
            ServiceDependency::RiskManager => &self.risk_manager,
            ServiceDependency::TradeExecutor => &self.trade_executor,
        };
        match specific {
            Some(settings) => settings,
            None => &self.default,
        }
    }

    /// Resilience config for a dependency.
    #[must_use]
    pub const fn for_dependency(
        &self,
        dependency: ServiceDependency,
    ) -> crate::resilience::CircuitBreakerConfig {
        self.settings(dependency).to_resilience_config()
    }
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_failure_window() -> u64 {
    60
}

const fn default_cooldown() -> u64 {
    60
}
