//! Audit Trail Port (Driven Port)
//!
//! Append-only, per-workflow ordered log of stage results. It is the sole
//! record of what happened, including on failure paths.

use async_trait::async_trait;

use crate::domain::shared::WorkflowId;
use crate::domain::workflow::{Stage, StageResult};

/// Audit trail error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AuditError {
    /// A result did not extend the trail with the next pipeline stage.
    #[error("Out-of-order audit append for {workflow_id}: {stage} (expected {expected:?})")]
    OutOfOrder {
        /// Workflow.
        workflow_id: WorkflowId,
        /// Stage being appended.
        stage: Stage,
        /// The only stage the trail accepts next, `None` once it is full.
        expected: Option<Stage>,
    },

    /// Backend failure.
    #[error("Audit storage error: {message}")]
    Storage {
        /// Failure detail.
        message: String,
    },
}

/// Port for the audit trail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditTrail: Send + Sync {
    /// Append a stage result. Results must arrive in stage order with no
    /// stage skipped.
    async fn append(&self, workflow_id: &WorkflowId, result: StageResult) -> Result<(), AuditError>;

    /// All results for a workflow, in order. Unknown ids yield an empty trail.
    async fn read(&self, workflow_id: &WorkflowId) -> Result<Vec<StageResult>, AuditError>;
}
