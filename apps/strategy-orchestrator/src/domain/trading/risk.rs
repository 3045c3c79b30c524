//! `evaluate_trade` request and reply.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

/// Parameters for risk evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRequest {
    /// Ticker.
    pub ticker: String,
    /// Direction.
    pub action: TradeAction,
    /// Proposed quantity.
    pub quantity: u64,
    /// Proposed price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Risk manager verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskDecision {
    /// Approved as proposed.
    Approve,
    /// Approved, possibly resized or with warnings.
    ConditionalApprove,
    /// Denied.
    Deny,
}

/// Reply to `evaluate_trade`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    /// Verdict.
    pub decision: RiskDecision,
    /// Quantity the risk manager allows.
    #[serde(default)]
    pub approved_quantity: Option<u64>,
    /// Reason for the verdict.
    #[serde(default)]
    pub reason: Option<String>,
    /// Limits violated.
    #[serde(default)]
    pub violations: Vec<String>,
    /// Non-blocking warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl RiskEvaluation {
    /// Whether the trade may proceed to execution.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(
            self.decision,
            RiskDecision::Approve | RiskDecision::ConditionalApprove
        )
    }

    /// Quantity to execute, never above what was proposed.
    #[must_use]
    pub fn execution_quantity(&self, proposed: u64) -> u64 {
        self.approved_quantity.map_or(proposed, |q| q.min(proposed))
    }

    /// Human-readable denial reason.
    #[must_use]
    pub fn denial_reason(&self) -> String {
        match (&self.reason, self.violations.is_empty()) {
            (Some(reason), _) => reason.clone(),
            (None, false) => self.violations.join("; "),
            (None, true) => "denied by risk manager".to_string(),
        }
    }
}
