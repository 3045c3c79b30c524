//! HTTP response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::OrchestratorError;
use crate::domain::shared::WorkflowId;
use crate::domain::trading::TradeOutcome;
use crate::domain::workflow::{Stage, StageResult, StrategyInput, Workflow, WorkflowStatus};
use crate::resilience::SystemHealth;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Orchestrator version.
    pub version: String,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Overall status, counts and per-dependency results.
    #[serde(flatten)]
    pub health: SystemHealth,
}

/// Response to an accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Identifier of the new workflow.
    pub workflow_id: WorkflowId,
    /// Status at the time of the response.
    pub status: WorkflowStatus,
}

/// Workflow snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResponse {
    /// Workflow identifier.
    pub workflow_id: WorkflowId,
    /// Submitted strategy.
    pub strategy: StrategyInput,
    /// Current status.
    pub status: WorkflowStatus,
    /// Stage in progress or last resolved.
    pub current_stage: Option<Stage>,
    /// Ordered stage results.
    pub stage_results: Vec<StageResult>,
    /// Execution outcome, if execution was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<TradeOutcome>,
    /// Collaborator warnings.
    pub warnings: Vec<String>,
    /// Last failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Completion time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Workflow> for WorkflowResponse {
    fn from(workflow: &Workflow) -> Self {
        Self {
            workflow_id: workflow.id().clone(),
            strategy: workflow.strategy().clone(),
            status: workflow.status(),
            current_stage: workflow.current_stage(),
            stage_results: workflow.stage_results().to_vec(),
            final_result: workflow.final_result().cloned(),
            warnings: workflow.warnings().to_vec(),
            last_error: workflow.last_error().map(str::to_string),
            created_at: workflow.created_at(),
            completed_at: workflow.completed_at(),
        }
    }
}

/// Response to a cancellation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    /// Workflow the cancellation applies to.
    pub workflow_id: WorkflowId,
    /// Always true; the workflow settles on `CANCELLED` asynchronously.
    pub cancellation_requested: bool,
}

/// Audit trail of one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailResponse {
    /// Workflow identifier.
    pub workflow_id: WorkflowId,
    /// Ordered stage results.
    pub entries: Vec<StageResult>,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: String,
}

/// Orchestrator error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub OrchestratorError);

impl From<OrchestratorError> for ApiError {
    fn from(error: OrchestratorError) -> Self {
        Self(error)
    }
}

impl ApiError {
    /// HTTP status and error code for the wrapped error.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            OrchestratorError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            OrchestratorError::InvalidStrategy(_) => (StatusCode::BAD_REQUEST, "INVALID_STRATEGY"),
            OrchestratorError::AlreadyTerminal { .. } => (StatusCode::CONFLICT, "ALREADY_TERMINAL"),
            OrchestratorError::ShuttingDown => (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING_DOWN"),
            OrchestratorError::Repository(_) | OrchestratorError::Audit(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
