//! Strategy description submitted by the caller.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::WorkflowError;

/// Appetite for risk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    /// Conservative.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Aggressive.
    High,
}

/// Intended holding period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeHorizon {
    /// Days to weeks.
    Short,
    /// Weeks to months.
    #[default]
    Medium,
    /// Months or longer.
    Long,
}

/// Structured strategy description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyInput {
    /// Free-form investment goal.
    pub goal: String,
    /// Preferred sector, if any.
    #[serde(default)]
    pub sector_preference: Option<String>,
    /// Risk appetite.
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    /// Maximum capital to deploy.
    #[serde(default = "default_max_investment")]
    pub max_investment: Decimal,
    /// Holding period.
    #[serde(default)]
    pub time_horizon: TimeHorizon,
}

impl StrategyInput {
    /// Create a strategy with default sizing and preferences.
    #[must_use]
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            sector_preference: None,
            risk_tolerance: RiskTolerance::default(),
            max_investment: default_max_investment(),
            time_horizon: TimeHorizon::default(),
        }
    }

    /// Set the preferred sector.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector_preference = Some(sector.into());
        self
    }

    /// Set the maximum investment.
    #[must_use]
    pub const fn with_max_investment(mut self, amount: Decimal) -> Self {
        self.max_investment = amount;
        self
    }

    /// Check that the strategy can be acted on.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.goal.trim().is_empty() {
            return Err(WorkflowError::InvalidStrategy(
                "goal must not be empty".to_string(),
            ));
        }
        if self.max_investment <= Decimal::ZERO {
            return Err(WorkflowError::InvalidStrategy(format!(
                "max_investment must be positive, got {}",
                self.max_investment
            )));
        }
        Ok(())
    }
}

fn default_max_investment() -> Decimal {
    dec!(50000)
}
