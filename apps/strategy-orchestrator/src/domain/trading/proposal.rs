//! Trade proposal sizing between technical analysis and risk evaluation.
//!
//! The proposal buys at the technical entry price with a budget of
//! `min(max_investment, max_single_trade_value)`, and always at least one
//! share.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{PayloadError, RiskRequest, TradeAction};

/// Trade sent to the risk manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeProposal {
    /// Ticker.
    pub ticker: String,
    /// Direction.
    pub action: TradeAction,
    /// Quantity.
    pub quantity: u64,
    /// Price per share.
    pub price: Decimal,
}

impl TradeProposal {
    /// Size a buy proposal.
    pub fn size(
        ticker: impl Into<String>,
        entry_price: Decimal,
        max_investment: Decimal,
        max_single_trade_value: Decimal,
    ) -> Result<Self, PayloadError> {
        if entry_price <= Decimal::ZERO {
            return Err(PayloadError::Contract(format!(
                "entry price must be positive, got {entry_price}"
            )));
        }

        let budget = max_investment.min(max_single_trade_value);
        let shares = (budget / entry_price).floor().to_u64().unwrap_or(0);

        Ok(Self {
            ticker: ticker.into(),
            action: TradeAction::Buy,
            quantity: shares.max(1),
            price: entry_price,
        })
    }

    /// Request for `evaluate_trade`.
    #[must_use]
    pub fn to_risk_request(&self) -> RiskRequest {
        RiskRequest {
            ticker: self.ticker.clone(),
            action: self.action,
            quantity: self.quantity,
            price: self.price,
        }
    }
}
