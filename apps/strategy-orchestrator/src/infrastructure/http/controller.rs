//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API that delegates to the workflow orchestrator.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use crate::application::ports::{AuditTrail, WorkflowRepository};
use crate::application::{AuditFilter, WorkflowOrchestrator};
use crate::domain::shared::WorkflowId;
use crate::domain::workflow::WorkflowStatus;

use super::request::{SubmitQuery, SubmitStrategyRequest, SummaryQuery};
use super::response::{
    ApiError, AuditTrailResponse, CancelResponse, HealthResponse, SubmitResponse, WorkflowResponse,
};

/// Application state shared across handlers.
pub struct AppState<A, R>
where
    A: AuditTrail,
    R: WorkflowRepository,
{
    /// Workflow orchestrator.
    pub orchestrator: Arc<WorkflowOrchestrator<A, R>>,
    /// Application version.
    pub version: String,
}

impl<A, R> Clone for AppState<A, R>
where
    A: AuditTrail,
    R: WorkflowRepository,
{
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router<A, R>(state: AppState<A, R>) -> Router
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(liveness))
        .route("/api/v1/strategies", post(submit_strategy))
        .route("/api/v1/workflows", get(list_workflows))
        .route("/api/v1/workflows/{id}", get(get_workflow))
        .route("/api/v1/workflows/{id}/cancel", post(cancel_workflow))
        .route("/api/v1/workflows/{id}/audit", get(get_audit_trail))
        .route("/api/v1/audit/summary", get(get_audit_summary))
        .route("/api/v1/dependencies", get(get_dependencies))
        .with_state(state)
}

/// Health check endpoint.
///
/// Checks every dependency; 503 once more than half of them are down.
async fn health_check<A, R>(State(state): State<AppState<A, R>>) -> impl IntoResponse
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let health = state.orchestrator.system_health().await;
    let status_code = if health.is_serving() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(HealthResponse {
            version: state.version.clone(),
            current_time: Utc::now(),
            health,
        }),
    )
}

/// Liveness check: the process is up.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Submit a strategy.
///
/// Responds 202 with the workflow id, or with the terminal snapshot when
/// `?wait=true`.
async fn submit_strategy<A, R>(
    State(state): State<AppState<A, R>>,
    Query(query): Query<SubmitQuery>,
    Json(request): Json<SubmitStrategyRequest>,
) -> Result<Response, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    if query.wait {
        let workflow = state.orchestrator.run(request.into()).await?;
        return Ok((StatusCode::OK, Json(WorkflowResponse::from(&workflow))).into_response());
    }

    let workflow_id = state.orchestrator.submit(request.into()).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            workflow_id,
            status: WorkflowStatus::Received,
        }),
    )
        .into_response())
}

/// List workflow summaries, newest first.
async fn list_workflows<A, R>(State(state): State<AppState<A, R>>) -> Result<Response, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let summaries = state.orchestrator.list().await?;
    Ok(Json(summaries).into_response())
}

/// Get a workflow snapshot.
async fn get_workflow<A, R>(
    State(state): State<AppState<A, R>>,
    Path(id): Path<String>,
) -> Result<Json<WorkflowResponse>, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let workflow = state.orchestrator.get_status(&WorkflowId::new(id)).await?;
    Ok(Json(WorkflowResponse::from(&workflow)))
}

/// Request cancellation of a running workflow.
async fn cancel_workflow<A, R>(
    State(state): State<AppState<A, R>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let workflow_id = WorkflowId::new(id);
    state.orchestrator.cancel(&workflow_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            workflow_id,
            cancellation_requested: true,
        }),
    )
        .into_response())
}

/// Get the ordered audit trail of a workflow, optionally filtered by
/// `?stage=` and `?outcome=`.
async fn get_audit_trail<A, R>(
    State(state): State<AppState<A, R>>,
    Path(id): Path<String>,
    Query(filter): Query<AuditFilter>,
) -> Result<Json<AuditTrailResponse>, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let workflow_id = WorkflowId::new(id);
    let entries = state
        .orchestrator
        .filtered_audit_trail(&workflow_id, filter)
        .await?;
    Ok(Json(AuditTrailResponse {
        workflow_id,
        entries,
    }))
}

/// Roll up the audit trails of all workflows, optionally `?since=` an
/// RFC 3339 instant.
async fn get_audit_summary<A, R>(
    State(state): State<AppState<A, R>>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, ApiError>
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    let summary = state.orchestrator.audit_summary(query.since).await?;
    Ok(Json(summary).into_response())
}

/// Circuit breaker state of every dependency.
async fn get_dependencies<A, R>(State(state): State<AppState<A, R>>) -> impl IntoResponse
where
    A: AuditTrail + 'static,
    R: WorkflowRepository + 'static,
{
    Json(state.orchestrator.dependency_health())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::application::PipelineSettings;
    use crate::infrastructure::persistence::{InMemoryAuditTrail, InMemoryWorkflowRepository};
    use crate::resilience::{
        CircuitBreaker, CircuitBreakerConfig, ProtectedDependency, RetryPolicy,
        ServiceDependencies,
    };
    use crate::rpc::{MockRpcTransport, RpcClient, RpcTarget, TransportFault};

    /// Fundamental analysis never finds a candidate and every agent is up.
    fn create_test_state() -> AppState<InMemoryAuditTrail, InMemoryWorkflowRepository> {
        create_test_state_with_down(&[])
    }

    /// Like `create_test_state`, with the named agents failing health checks.
    fn create_test_state_with_down(
        down: &'static [&'static str],
    ) -> AppState<InMemoryAuditTrail, InMemoryWorkflowRepository> {
        let mut transport = MockRpcTransport::new();
        transport.expect_send().returning(|_, request| {
            Ok(json!({"jsonrpc": "2.0", "id": request.id, "result": {"companies": []}}).to_string())
        });
        transport.expect_check_health().returning(move |target| {
            if down.contains(&target.name.as_str()) {
                Err(TransportFault::Unreachable("connection refused".into()))
            } else {
                Ok(())
            }
        });
        let client = RpcClient::new(Arc::new(transport));
        let bind = |name: &str| {
            Arc::new(ProtectedDependency::new(
                RpcTarget::new(name, format!("http://{name}")),
                client.clone(),
                Arc::new(CircuitBreaker::new(name, CircuitBreakerConfig::default())),
                RetryPolicy::no_retry(),
                Duration::from_secs(1),
            ))
        };
        let orchestrator = WorkflowOrchestrator::new(
            ServiceDependencies::new(
                bind("fundamental_analyst"),
                bind("technical_analyst"),
                bind("risk_manager"),
                bind("trade_executor"),
            ),
            PipelineSettings::default(),
            Arc::new(InMemoryAuditTrail::new()),
            Arc::new(InMemoryWorkflowRepository::new()),
        );

        AppState {
            orchestrator: Arc::new(orchestrator),
            version: "1.0.0-test".to_string(),
        }
    }

    async fn body_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn get_request(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_ok() {
        let response = get_request(create_router(create_test_state()), "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["version"], "1.0.0-test");
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["total"], 4);
        assert_eq!(json["dependencies"].as_array().unwrap().len(), 4);
        assert_eq!(json["dependencies"][0]["breaker_state"], "CLOSED");
    }

    #[tokio::test]
    async fn health_check_degraded_when_one_agent_is_down() {
        let state = create_test_state_with_down(&["technical_analyst"]);
        let response = get_request(create_router(state), "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["unhealthy"], 1);
        assert_eq!(json["dependencies"][1]["status"], "unhealthy");
        assert!(
            json["dependencies"][1]["error"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }

    #[tokio::test]
    async fn health_check_unavailable_when_most_agents_are_down() {
        let state = create_test_state_with_down(&[
            "fundamental_analyst",
            "risk_manager",
            "trade_executor",
        ]);
        let response = get_request(create_router(state), "/health").await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "unhealthy");
    }

    #[tokio::test]
    async fn liveness_does_not_check_agents() {
        let state = create_test_state_with_down(&[
            "fundamental_analyst",
            "technical_analyst",
            "risk_manager",
            "trade_executor",
        ]);
        let response = get_request(create_router(state), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn audit_summary_counts_rejected_workflow() {
        let state = create_test_state();
        state
            .orchestrator
            .run(crate::domain::workflow::StrategyInput::new("income"))
            .await
            .unwrap();

        let response = get_request(create_router(state), "/api/v1/audit/summary").await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["total_events"], 1);
        assert_eq!(json["workflow_metrics"]["workflows_started"], 1);
        assert_eq!(json["workflow_metrics"]["workflows_rejected"], 1);
        assert_eq!(json["stages"][0]["stage"], "FUNDAMENTAL");
        assert_eq!(json["stages"][0]["domain_rejection"], 1);
    }

    #[tokio::test]
    async fn audit_trail_filters_by_outcome() {
        let state = create_test_state();
        let workflow = state
            .orchestrator
            .run(crate::domain::workflow::StrategyInput::new("income"))
            .await
            .unwrap();
        let id = workflow.id().as_str().to_string();

        let rejected = get_request(
            create_router(state.clone()),
            &format!("/api/v1/workflows/{id}/audit?outcome=DOMAIN_REJECTION"),
        )
        .await;
        assert_eq!(rejected.status(), StatusCode::OK);
        assert_eq!(body_json(rejected).await["entries"].as_array().unwrap().len(), 1);

        let succeeded = get_request(
            create_router(state),
            &format!("/api/v1/workflows/{id}/audit?stage=FUNDAMENTAL&outcome=SUCCESS"),
        )
        .await;
        assert!(body_json(succeeded).await["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_and_wait_returns_terminal_snapshot() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/strategies?wait=true")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"goal": "dividend income"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "REJECTED_FUNDAMENTAL");
        assert_eq!(json["stage_results"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_goal_is_bad_request() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/strategies")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"goal": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_STRATEGY");
    }

    #[tokio::test]
    async fn unknown_workflow_is_not_found() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/workflows/does-not-exist")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn dependencies_lists_every_breaker() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/dependencies")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let breakers = json.as_array().unwrap();
        assert_eq!(breakers.len(), 4);
        assert!(breakers.iter().all(|b| b["state"] == "CLOSED"));
    }
}
