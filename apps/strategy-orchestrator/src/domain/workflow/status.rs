//! Workflow status lifecycle.
//!
//! ```text
//! RECEIVED → FUNDAMENTAL → TECHNICAL → RISK → EXECUTION → COMPLETED
//!
//! early exits: REJECTED_FUNDAMENTAL, HOLD_TECHNICAL, DENIED_RISK,
//!              EXECUTION_FAILED, STAGE_FAILED, CANCELLED
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Accepted, no stage started yet.
    Received,
    /// Fundamental analysis in progress.
    Fundamental,
    /// Technical analysis in progress.
    Technical,
    /// Risk evaluation in progress.
    Risk,
    /// Trade execution in progress.
    Execution,
    /// Trade executed.
    Completed,
    /// No suitable candidates.
    RejectedFundamental,
    /// Technical signal was not a buy.
    HoldTechnical,
    /// Risk manager denied the trade.
    DeniedRisk,
    /// Execution failed, either at the venue or on the way to it.
    ExecutionFailed,
    /// A non-execution stage could not be completed.
    StageFailed,
    /// Cancelled by the caller or by the workflow timeout.
    Cancelled,
}

impl WorkflowStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::RejectedFundamental
                | Self::HoldTechnical
                | Self::DeniedRisk
                | Self::ExecutionFailed
                | Self::StageFailed
                | Self::Cancelled
        )
    }

    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Fundamental => "FUNDAMENTAL",
            Self::Technical => "TECHNICAL",
            Self::Risk => "RISK",
            Self::Execution => "EXECUTION",
            Self::Completed => "COMPLETED",
            Self::RejectedFundamental => "REJECTED_FUNDAMENTAL",
            Self::HoldTechnical => "HOLD_TECHNICAL",
            Self::DeniedRisk => "DENIED_RISK",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::StageFailed => "STAGE_FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
