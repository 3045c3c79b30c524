//! In-memory audit trail and workflow repository.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::application::ports::{AuditError, AuditTrail, RepositoryError, WorkflowRepository};
use crate::domain::shared::WorkflowId;
use crate::domain::workflow::{Stage, StageResult, Workflow};

// ============================================================================
// Audit Trail
// ============================================================================

/// In-memory implementation of `AuditTrail`.
///
/// Appends are rejected unless they carry the next pipeline stage, so a
/// trail is always a prefix of `Stage::ALL`.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    trails: RwLock<HashMap<WorkflowId, Vec<StageResult>>>,
}

impl InMemoryAuditTrail {
    /// Create a new empty audit trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of workflows with at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trails.read().len()
    }

    /// Whether no workflow has any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trails.read().is_empty()
    }
}

#[async_trait]
impl AuditTrail for InMemoryAuditTrail {
    async fn append(&self, workflow_id: &WorkflowId, result: StageResult) -> Result<(), AuditError> {
        let mut trails = self.trails.write();
        let recorded = trails.get(workflow_id).map_or(0, Vec::len);

        let expected = Stage::ALL.get(recorded).copied();
        if expected != Some(result.stage) {
            return Err(AuditError::OutOfOrder {
                workflow_id: workflow_id.clone(),
                stage: result.stage,
                expected,
            });
        }

        tracing::info!(
            target: "audit",
            workflow_id = %workflow_id,
            stage = %result.stage,
            outcome = result.outcome.as_str(),
            attempts = result.attempt_count,
            duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            "Stage result recorded"
        );

        trails.entry(workflow_id.clone()).or_default().push(result);
        Ok(())
    }

    async fn read(&self, workflow_id: &WorkflowId) -> Result<Vec<StageResult>, AuditError> {
        Ok(self
            .trails
            .read()
            .get(workflow_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// Workflow Repository
// ============================================================================

/// In-memory implementation of `WorkflowRepository`.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of workflows in the repository.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workflows.read().len()
    }

    /// Check if the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workflows.read().is_empty()
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn save(&self, workflow: &Workflow) -> Result<(), RepositoryError> {
        self.workflows
            .write()
            .insert(workflow.id().clone(), workflow.clone());
        Ok(())
    }

    async fn find(&self, id: &WorkflowId) -> Result<Option<Workflow>, RepositoryError> {
        Ok(self.workflows.read().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let mut workflows: Vec<Workflow> = self.workflows.read().values().cloned().collect();
        workflows.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().as_str().cmp(b.id().as_str()))
        });
        Ok(workflows)
    }
}
