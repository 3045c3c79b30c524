//! Workflow aggregate root.
//!
//! Owned by the orchestrator for its lifetime; everyone else sees clones.
//! Stage results are append-only and strictly ordered by stage, and the
//! terminal status is set exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Stage, StageResult, StrategyInput, WorkflowError, WorkflowStatus};
use crate::domain::shared::WorkflowId;
use crate::domain::trading::TradeOutcome;

/// One end-to-end execution of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    id: WorkflowId,
    strategy: StrategyInput,
    current_stage: Option<Stage>,
    status: WorkflowStatus,
    stage_results: Vec<StageResult>,
    final_result: Option<TradeOutcome>,
    warnings: Vec<String>,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    /// Create a workflow in `RECEIVED`.
    #[must_use]
    pub fn new(id: WorkflowId, strategy: StrategyInput) -> Self {
        Self {
            id,
            strategy,
            current_stage: None,
            status: WorkflowStatus::Received,
            stage_results: Vec::new(),
            final_result: None,
            warnings: Vec::new(),
            last_error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Workflow identifier.
    #[must_use]
    pub const fn id(&self) -> &WorkflowId {
        &self.id
    }

    /// Submitted strategy.
    #[must_use]
    pub const fn strategy(&self) -> &StrategyInput {
        &self.strategy
    }

    /// Stage currently (or last) being worked on.
    #[must_use]
    pub const fn current_stage(&self) -> Option<Stage> {
        self.current_stage
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Stage results in pipeline order.
    #[must_use]
    pub fn stage_results(&self) -> &[StageResult] {
        &self.stage_results
    }

    /// Trade outcome reported by the execution stage.
    #[must_use]
    pub const fn final_result(&self) -> Option<&TradeOutcome> {
        self.final_result.as_ref()
    }

    /// Warnings raised by collaborators along the way.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Detail of the last failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Submission time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time the terminal status was set.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether the workflow has reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The stage the pipeline expects next.
    #[must_use]
    pub fn expected_stage(&self) -> Option<Stage> {
        Stage::ALL.get(self.stage_results.len()).copied()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Enter a stage.
    pub fn begin_stage(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        self.ensure_active()?;
        let expected = self.expected_stage();
        if expected != Some(stage) {
            return Err(WorkflowError::OutOfOrder {
                expected,
                actual: stage,
            });
        }
        self.current_stage = Some(stage);
        self.status = stage.active_status();
        Ok(())
    }

    /// Append the result of the stage currently running.
    pub fn record_stage(&mut self, result: StageResult) -> Result<(), WorkflowError> {
        self.ensure_active()?;
        if self.current_stage != Some(result.stage) || self.expected_stage() != Some(result.stage)
        {
            return Err(WorkflowError::OutOfOrder {
                expected: self.expected_stage(),
                actual: result.stage,
            });
        }
        self.stage_results.push(result);
        Ok(())
    }

    /// Attach the execution report.
    pub fn set_final_result(&mut self, outcome: TradeOutcome) {
        self.final_result = Some(outcome);
    }

    /// Add collaborator warnings.
    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Remember the last failure detail.
    pub fn set_last_error(&mut self, detail: impl Into<String>) {
        self.last_error = Some(detail.into());
    }

    /// Set the terminal status. Fails if one is already set.
    pub fn finish(&mut self, status: WorkflowStatus) -> Result<(), WorkflowError> {
        if !status.is_terminal() {
            return Err(WorkflowError::NotTerminal(status));
        }
        self.ensure_active()?;
        self.status = status;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), WorkflowError> {
        if self.status.is_terminal() {
            return Err(WorkflowError::AlreadyTerminal {
                workflow_id: self.id.clone(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Condensed view for listings.
    #[must_use]
    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            goal: self.strategy.goal.clone(),
            status: self.status,
            current_stage: self.current_stage,
            stages_completed: self.stage_results.len(),
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

/// Listing entry for a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Workflow identifier.
    pub id: WorkflowId,
    /// Strategy goal.
    pub goal: String,
    /// Current status.
    pub status: WorkflowStatus,
    /// Current stage.
    pub current_stage: Option<Stage>,
    /// Number of recorded stage results.
    pub stages_completed: usize,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    pub completed_at: Option<DateTime<Utc>>,
}
