//! `execute_trade` request and reply.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeAction;
use crate::domain::shared::TradeId;

/// Order type sent to the venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Market order.
    #[default]
    Market,
    /// Limit order.
    Limit,
}

/// Parameters for order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Ticker.
    pub ticker: String,
    /// Direction.
    pub action: TradeAction,
    /// Quantity approved by risk.
    pub quantity: u64,
    /// Order type.
    pub order_type: OrderType,
}

/// Venue verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Filled.
    Executed,
    /// Not filled.
    Failed,
}

/// Reply to `execute_trade`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Venue verdict.
    pub status: ExecutionStatus,
    /// Trade identifier, present when executed.
    #[serde(default)]
    pub trade_id: Option<TradeId>,
    /// Fill price, present when executed.
    #[serde(default)]
    pub fill_price: Option<Decimal>,
    /// Failure reason.
    #[serde(default)]
    pub reason: Option<String>,
}

impl ExecutionReport {
    /// Whether the trade was filled.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        self.status == ExecutionStatus::Executed
    }
}

/// Final trade outcome attached to a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOutcome {
    /// Ticker.
    pub ticker: String,
    /// Direction.
    pub action: TradeAction,
    /// Quantity sent to the venue.
    pub quantity: u64,
    /// Venue verdict.
    pub status: ExecutionStatus,
    /// Trade identifier.
    pub trade_id: Option<TradeId>,
    /// Fill price.
    pub fill_price: Option<Decimal>,
    /// Failure reason.
    pub reason: Option<String>,
}

impl TradeOutcome {
    /// Combine the request sent with the venue's report.
    #[must_use]
    pub fn from_report(request: &ExecutionRequest, report: ExecutionReport) -> Self {
        Self {
            ticker: request.ticker.clone(),
            action: request.action,
            quantity: request.quantity,
            status: report.status,
            trade_id: report.trade_id,
            fill_price: report.fill_price,
            reason: report.reason,
        }
    }
}
