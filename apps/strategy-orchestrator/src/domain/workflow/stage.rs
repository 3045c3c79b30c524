//! Pipeline stages and the collaborator service each one calls.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkflowStatus;

/// One step of the fixed four-step pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Candidate selection.
    Fundamental,
    /// Entry signal for the selected candidate.
    Technical,
    /// Approval and sizing of the trade proposal.
    Risk,
    /// Order placement at the venue.
    Execution,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::Fundamental,
        Self::Technical,
        Self::Risk,
        Self::Execution,
    ];

    /// Position of this stage in the pipeline (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Fundamental => 0,
            Self::Technical => 1,
            Self::Risk => 2,
            Self::Execution => 3,
        }
    }

    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Fundamental => Some(Self::Technical),
            Self::Technical => Some(Self::Risk),
            Self::Risk => Some(Self::Execution),
            Self::Execution => None,
        }
    }

    /// Remote method invoked for this stage.
    #[must_use]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Fundamental => "analyze_fundamentals",
            Self::Technical => "analyze_technical",
            Self::Risk => "evaluate_trade",
            Self::Execution => "execute_trade",
        }
    }

    /// Collaborator service reached by this stage.
    #[must_use]
    pub const fn dependency(self) -> ServiceDependency {
        match self {
            Self::Fundamental => ServiceDependency::FundamentalAnalyst,
            Self::Technical => ServiceDependency::TechnicalAnalyst,
            Self::Risk => ServiceDependency::RiskManager,
            Self::Execution => ServiceDependency::TradeExecutor,
        }
    }

    /// Workflow status while this stage is running.
    #[must_use]
    pub const fn active_status(self) -> WorkflowStatus {
        match self {
            Self::Fundamental => WorkflowStatus::Fundamental,
            Self::Technical => WorkflowStatus::Technical,
            Self::Risk => WorkflowStatus::Risk,
            Self::Execution => WorkflowStatus::Execution,
        }
    }

    /// Terminal status when the collaborator says "stop".
    #[must_use]
    pub const fn rejection_status(self) -> WorkflowStatus {
        match self {
            Self::Fundamental => WorkflowStatus::RejectedFundamental,
            Self::Technical => WorkflowStatus::HoldTechnical,
            Self::Risk => WorkflowStatus::DeniedRisk,
            Self::Execution => WorkflowStatus::ExecutionFailed,
        }
    }

    /// Terminal status when the call itself fails.
    #[must_use]
    pub const fn failure_status(self) -> WorkflowStatus {
        match self {
            Self::Execution => WorkflowStatus::ExecutionFailed,
            _ => WorkflowStatus::StageFailed,
        }
    }

    /// Lowercase label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::Technical => "technical",
            Self::Risk => "risk",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downstream services the orchestrator depends on.
///
/// Each one gets its own circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDependency {
    /// Fundamental analysis service.
    FundamentalAnalyst,
    /// Technical analysis service.
    TechnicalAnalyst,
    /// Risk management service.
    RiskManager,
    /// Trade execution service.
    TradeExecutor,
}

impl ServiceDependency {
    /// All dependencies in pipeline order.
    pub const ALL: [Self; 4] = [
        Self::FundamentalAnalyst,
        Self::TechnicalAnalyst,
        Self::RiskManager,
        Self::TradeExecutor,
    ];

    /// Service name used for breakers, logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FundamentalAnalyst => "fundamental_analyst",
            Self::TechnicalAnalyst => "technical_analyst",
            Self::RiskManager => "risk_manager",
            Self::TradeExecutor => "trade_executor",
        }
    }
}

impl fmt::Display for ServiceDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
