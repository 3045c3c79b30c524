//! Payloads exchanged with the collaborator services.
//!
//! One module per stage: the request sent and the reply decoded. Replies
//! carry their own "proceed or stop" decision; structurally unusable
//! replies are reported as [`PayloadError`].

pub mod execution;
pub mod fundamental;
pub mod proposal;
pub mod risk;
pub mod technical;

use thiserror::Error;

pub use execution::{ExecutionReport, ExecutionRequest, ExecutionStatus, OrderType, TradeOutcome};
pub use fundamental::{CandidateCompany, FundamentalAnalysis, FundamentalRequest};
pub use proposal::TradeProposal;
pub use risk::{RiskDecision, RiskEvaluation, RiskRequest, TradeAction};
pub use technical::{Signal, TechnicalAnalysis, TechnicalRequest};

/// A reply that decoded as JSON but cannot be acted on.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Reply did not match the expected shape.
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Reply matched the shape but violates the method's contract.
    #[error("Contract violation: {0}")]
    Contract(String),

    /// A previous stage did not leave the context this stage needs.
    #[error("Missing context from earlier stage: {0}")]
    MissingContext(&'static str),
}
