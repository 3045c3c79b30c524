//! Workflow Repository Port (Driven Port)
//!
//! Stores read-only snapshots published by the orchestrator after every
//! transition. Snapshots are live state only; nothing survives a restart.

use async_trait::async_trait;

use crate::domain::shared::WorkflowId;
use crate::domain::workflow::Workflow;

/// Repository error.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// Backend failure.
    #[error("Workflow storage error: {message}")]
    Storage {
        /// Failure detail.
        message: String,
    },
}

/// Port for workflow snapshots.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Insert or replace the snapshot for a workflow.
    async fn save(&self, workflow: &Workflow) -> Result<(), RepositoryError>;

    /// Snapshot for a workflow.
    async fn find(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError>;

    /// All snapshots, newest first.
    async fn list(&self) -> Result<Vec<Workflow>, RepositoryError>;
}
