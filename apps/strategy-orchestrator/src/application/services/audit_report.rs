//! Audit reporting: filtered trails and a rollup across workflows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::workflow::{Stage, StageOutcome, StageResult, WorkflowStatus};

/// Selects entries of one workflow's audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Keep only this stage.
    #[serde(default)]
    pub stage: Option<Stage>,
    /// Keep only this outcome.
    #[serde(default)]
    pub outcome: Option<StageOutcome>,
}

impl AuditFilter {
    /// Whether an entry passes the filter.
    #[must_use]
    pub fn matches(&self, result: &StageResult) -> bool {
        self.stage.is_none_or(|stage| stage == result.stage)
            && self.outcome.is_none_or(|outcome| outcome == result.outcome)
    }

    /// Keep the matching entries, in trail order.
    #[must_use]
    pub fn apply(&self, trail: Vec<StageResult>) -> Vec<StageResult> {
        trail.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Outcome counts for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcomeCounts {
    /// Stage.
    pub stage: Stage,
    /// Entries that proceeded.
    pub success: u64,
    /// Entries where the collaborator said "stop".
    pub domain_rejection: u64,
    /// Entries where the call failed.
    pub failed: u64,
    /// Entries never attempted.
    pub skipped: u64,
}

impl StageOutcomeCounts {
    const fn new(stage: Stage) -> Self {
        Self {
            stage,
            success: 0,
            domain_rejection: 0,
            failed: 0,
            skipped: 0,
        }
    }

    const fn add(&mut self, outcome: StageOutcome) {
        match outcome {
            StageOutcome::Success => self.success += 1,
            StageOutcome::DomainRejection => self.domain_rejection += 1,
            StageOutcome::Failed => self.failed += 1,
            StageOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Workflow counts by how they ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowMetrics {
    /// Workflows submitted.
    pub workflows_started: u64,
    /// Workflows with no terminal status yet.
    pub workflows_running: u64,
    /// Workflows that executed a trade.
    pub workflows_completed: u64,
    /// Workflows stopped by a collaborator's decision.
    pub workflows_rejected: u64,
    /// Workflows that ended in a stage or execution failure.
    pub workflows_failed: u64,
    /// Workflows cancelled by a caller or the overall timeout.
    pub workflows_cancelled: u64,
    /// Completed as a percentage of started.
    pub workflow_success_rate: Decimal,
}

/// Trade decision and execution counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TradingMetrics {
    /// Proposals the risk manager approved.
    pub trades_approved: u64,
    /// Proposals the risk manager denied.
    pub trades_denied: u64,
    /// Orders filled at the venue.
    pub trades_executed: u64,
    /// Execution attempts that did not fill.
    pub trades_failed: u64,
    /// Executed as a percentage of execution attempts.
    pub trade_success_rate: Decimal,
}

/// Rollup of the audit trails of many workflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    /// Only workflows submitted at or after this instant are counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
    /// Audit entries across all counted workflows.
    pub total_events: u64,
    /// Workflow counts.
    pub workflow_metrics: WorkflowMetrics,
    /// Trade counts.
    pub trading_metrics: TradingMetrics,
    /// Outcome counts per stage, in pipeline order.
    pub stages: Vec<StageOutcomeCounts>,
}

impl AuditSummary {
    /// Empty summary.
    #[must_use]
    pub fn new(since: Option<DateTime<Utc>>) -> Self {
        Self {
            since,
            total_events: 0,
            workflow_metrics: WorkflowMetrics::default(),
            trading_metrics: TradingMetrics::default(),
            stages: Stage::ALL.into_iter().map(StageOutcomeCounts::new).collect(),
        }
    }

    /// Whether a workflow submitted at `created_at` falls in the window.
    #[must_use]
    pub fn covers(&self, created_at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| created_at >= since)
    }

    /// Count one workflow with its audit trail.
    pub fn record(&mut self, status: WorkflowStatus, trail: &[StageResult]) {
        let workflows = &mut self.workflow_metrics;
        workflows.workflows_started += 1;
        match status {
            WorkflowStatus::Completed => workflows.workflows_completed += 1,
            WorkflowStatus::RejectedFundamental
            | WorkflowStatus::HoldTechnical
            | WorkflowStatus::DeniedRisk => workflows.workflows_rejected += 1,
            WorkflowStatus::ExecutionFailed | WorkflowStatus::StageFailed => {
                workflows.workflows_failed += 1;
            }
            WorkflowStatus::Cancelled => workflows.workflows_cancelled += 1,
            WorkflowStatus::Received
            | WorkflowStatus::Fundamental
            | WorkflowStatus::Technical
            | WorkflowStatus::Risk
            | WorkflowStatus::Execution => workflows.workflows_running += 1,
        }
        workflows.workflow_success_rate =
            percentage(workflows.workflows_completed, workflows.workflows_started);

        for entry in trail {
            self.total_events += 1;
            if let Some(counts) = self.stages.get_mut(entry.stage.index()) {
                counts.add(entry.outcome);
            }

            let trading = &mut self.trading_metrics;
            match (entry.stage, entry.outcome) {
                (Stage::Risk, StageOutcome::Success) => trading.trades_approved += 1,
                (Stage::Risk, StageOutcome::DomainRejection) => trading.trades_denied += 1,
                (Stage::Execution, StageOutcome::Success) => trading.trades_executed += 1,
                (Stage::Execution, StageOutcome::DomainRejection | StageOutcome::Failed) => {
                    trading.trades_failed += 1;
                }
                _ => {}
            }
        }

        let trading = &mut self.trading_metrics;
        trading.trade_success_rate = percentage(
            trading.trades_executed,
            trading.trades_executed + trading.trades_failed,
        );
    }
}

/// `part / whole` in percent, two decimals; zero when `whole` is zero.
fn percentage(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * dec!(100) / Decimal::from(whole)).round_dp(2)
}
