//! `analyze_technical` request and reply.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parameters for signal generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalRequest {
    /// Ticker to analyze.
    pub ticker: String,
    /// Bar timeframe (e.g. `1d`).
    pub timeframe: String,
}

/// Trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    /// Enter long.
    Buy,
    /// Exit or short.
    Sell,
    /// Do nothing.
    Hold,
}

impl Signal {
    /// Wire name of the signal.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

/// Reply to `analyze_technical`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    /// Signal.
    pub signal: Signal,
    /// Confidence in the signal (0.0-1.0).
    #[serde(default)]
    pub confidence: f64,
    /// Suggested entry price.
    #[serde(default)]
    pub entry_price: Option<Decimal>,
    /// Suggested target price.
    #[serde(default)]
    pub target_price: Option<Decimal>,
    /// Suggested stop-loss price.
    #[serde(default)]
    pub stop_loss: Option<Decimal>,
    /// Reasoning behind the signal.
    #[serde(default)]
    pub rationale: Option<String>,
}

impl TechnicalAnalysis {
    /// Whether the workflow should proceed to risk evaluation.
    #[must_use]
    pub fn is_entry(&self) -> bool {
        self.signal == Signal::Buy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn decodes_float_prices() {
        let analysis: TechnicalAnalysis = serde_json::from_value(json!({
            "signal": "BUY",
            "confidence": 0.8,
            "entry_price": 150.25,
            "target_price": 165.0,
            "stop_loss": 142.5
        }))
        .unwrap();
        assert!(analysis.is_entry());
        assert_eq!(analysis.entry_price, Some(dec!(150.25)));
        assert_eq!(analysis.stop_loss, Some(dec!(142.5)));
    }

    #[test]
    fn hold_is_not_an_entry() {
        let analysis: TechnicalAnalysis =
            serde_json::from_value(json!({"signal": "HOLD", "confidence": 0.4})).unwrap();
        assert!(!analysis.is_entry());
        assert!(analysis.entry_price.is_none());
    }

    #[test]
    fn unknown_signal_is_malformed() {
        let result: Result<TechnicalAnalysis, _> =
            serde_json::from_value(json!({"signal": "MAYBE"}));
        assert!(result.is_err());
    }
}
