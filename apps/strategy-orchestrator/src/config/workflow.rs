//! Pipeline configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::application::PipelineSettings;
use crate::domain::trading::OrderType;

/// Workflow tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Overall time budget for one workflow (seconds).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Candidates requested from fundamental analysis.
    #[serde(default = "default_max_companies")]
    pub max_companies: u32,
    /// Screening criteria forwarded to fundamental analysis.
    #[serde(default)]
    pub criteria: Vec<String>,
    /// Bar timeframe forwarded to technical analysis.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Order type used for execution.
    #[serde(default)]
    pub order_type: OrderType,
    /// Cap on a single trade's notional.
    #[serde(default = "default_max_single_trade_value")]
    pub max_single_trade_value: Decimal,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_companies: default_max_companies(),
            criteria: Vec::new(),
            timeframe: default_timeframe(),
            order_type: OrderType::default(),
            max_single_trade_value: default_max_single_trade_value(),
        }
    }
}

impl WorkflowConfig {
    /// Convert to the orchestrator's `PipelineSettings`.
    #[must_use]
    pub fn to_settings(&self) -> PipelineSettings {
        PipelineSettings {
            workflow_timeout: Duration::from_secs(self.timeout_secs),
            max_companies: self.max_companies,
            criteria: self.criteria.clone(),
            timeframe: self.timeframe.clone(),
            order_type: self.order_type,
            max_single_trade_value: self.max_single_trade_value,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    300
}

const fn default_max_companies() -> u32 {
    5
}

fn default_timeframe() -> String {
    "1d".to_string()
}

fn default_max_single_trade_value() -> Decimal {
    dec!(10000)
}
