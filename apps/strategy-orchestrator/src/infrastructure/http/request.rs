//! HTTP request DTOs.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::workflow::{RiskTolerance, StrategyInput, TimeHorizon};

/// Request to start a workflow for a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitStrategyRequest {
    /// Free-form investment goal.
    pub goal: String,
    /// Preferred sector.
    #[serde(default)]
    pub sector_preference: Option<String>,
    /// Risk appetite.
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,
    /// Maximum capital to deploy.
    #[serde(default)]
    pub max_investment: Option<Decimal>,
    /// Holding period.
    #[serde(default)]
    pub time_horizon: Option<TimeHorizon>,
}

impl From<SubmitStrategyRequest> for StrategyInput {
    fn from(request: SubmitStrategyRequest) -> Self {
        let mut strategy = Self::new(request.goal);
        strategy.sector_preference = request.sector_preference;
        if let Some(risk_tolerance) = request.risk_tolerance {
            strategy.risk_tolerance = risk_tolerance;
        }
        if let Some(max_investment) = request.max_investment {
            strategy.max_investment = max_investment;
        }
        if let Some(time_horizon) = request.time_horizon {
            strategy.time_horizon = time_horizon;
        }
        strategy
    }
}

/// Query parameters for strategy submission.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubmitQuery {
    /// Run the workflow to completion before responding.
    #[serde(default)]
    pub wait: bool,
}

/// Query parameters for the audit summary.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SummaryQuery {
    /// Only count workflows submitted at or after this instant.
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
}
