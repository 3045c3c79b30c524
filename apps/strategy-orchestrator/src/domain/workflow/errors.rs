//! Workflow domain errors.

use thiserror::Error;

use super::{Stage, WorkflowStatus};
use crate::domain::shared::WorkflowId;

/// Violations of the workflow aggregate's invariants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// The workflow already has its terminal status.
    #[error("Workflow {workflow_id} is already terminal ({status})")]
    AlreadyTerminal {
        /// Workflow identifier.
        workflow_id: WorkflowId,
        /// The terminal status it holds.
        status: WorkflowStatus,
    },

    /// A stage was started or recorded out of pipeline order.
    #[error("Stage {actual} is out of order (expected {expected:?})")]
    OutOfOrder {
        /// The stage the pipeline expects next.
        expected: Option<Stage>,
        /// The stage that was attempted.
        actual: Stage,
    },

    /// A non-terminal status was used to finish the workflow.
    #[error("Status {0} is not terminal")]
    NotTerminal(WorkflowStatus),

    /// The submitted strategy cannot be acted on.
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),
}
