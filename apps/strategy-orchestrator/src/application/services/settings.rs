//! Tunables for the pipeline.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::trading::OrderType;

/// Pipeline settings shared by every workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Overall time budget for one workflow across all stages.
    pub workflow_timeout: Duration,
    /// Candidates requested from fundamental analysis.
    pub max_companies: u32,
    /// Screening criteria sent to fundamental analysis.
    pub criteria: Vec<String>,
    /// Bar timeframe sent to technical analysis.
    pub timeframe: String,
    /// Order type sent to the executor.
    pub order_type: OrderType,
    /// Cap on the notional of a single proposed trade.
    pub max_single_trade_value: Decimal,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workflow_timeout: Duration::from_secs(300),
            max_companies: 5,
            criteria: Vec::new(),
            timeframe: "1d".to_string(),
            order_type: OrderType::Market,
            max_single_trade_value: dec!(10000),
        }
    }
}
