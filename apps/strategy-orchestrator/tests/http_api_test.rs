//! HTTP API Integration Tests
//!
//! Exercises the REST surface end to end against a scripted agent pool.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{Gate, Harness, RISK, Reply, TECHNICAL};
use strategy_orchestrator::domain::workflow::ServiceDependency;
use strategy_orchestrator::{AppState, WorkflowId, create_router};

fn router(harness: &Harness) -> Router {
    create_router(AppState {
        orchestrator: Arc::clone(&harness.orchestrator),
        version: "test".to_string(),
    })
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn rate(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_submitted_strategy_can_be_followed_to_completion() {
    let harness = Harness::standard();
    let router = router(&harness);

    let (status, body) = send(
        &router,
        post(
            "/api/v1/strategies",
            &json!({"goal": "Momentum in large caps", "max_investment": "50000"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "RECEIVED");
    let id = body["workflow_id"].as_str().unwrap().to_string();

    harness
        .orchestrator
        .wait(&WorkflowId::new(id.clone()))
        .await
        .unwrap();

    let (status, body) = send(&router, get(&format!("/api/v1/workflows/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["final_result"]["ticker"], "NVDA");
    assert_eq!(body["final_result"]["trade_id"], "T-1001");
    assert_eq!(body["stage_results"].as_array().unwrap().len(), 4);

    let (status, body) = send(&router, get(&format!("/api/v1/workflows/{id}/audit"))).await;
    assert_eq!(status, StatusCode::OK);
    let stages: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, ["FUNDAMENTAL", "TECHNICAL", "RISK", "EXECUTION"]);

    let (status, body) = send(&router, get("/api/v1/workflows")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], id.as_str());
    assert_eq!(body[0]["stages_completed"], 4);
}

#[tokio::test]
async fn test_cancelling_a_finished_workflow_conflicts() {
    let harness = Harness::standard();
    let router = router(&harness);

    let (status, body) = send(
        &router,
        post("/api/v1/strategies?wait=true", &json!({"goal": "Buy the dip"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    let id = body["workflow_id"].as_str().unwrap();

    let (status, body) = send(
        &router,
        post(&format!("/api/v1/workflows/{id}/cancel"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_TERMINAL");
}

#[tokio::test]
async fn test_cancelling_a_running_workflow_is_accepted() {
    let harness = Harness::standard();
    let gate = Arc::new(Gate::default());
    harness
        .transport
        .script(TECHNICAL, [Reply::Block(Arc::clone(&gate))]);
    let router = router(&harness);

    let (_, body) = send(
        &router,
        post("/api/v1/strategies", &json!({"goal": "Semis on pullback"})),
    )
    .await;
    let id = body["workflow_id"].as_str().unwrap().to_string();
    gate.entered.notified().await;

    let (status, body) = send(
        &router,
        post(&format!("/api/v1/workflows/{id}/cancel"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["cancellation_requested"], true);

    let workflow = harness
        .orchestrator
        .wait(&WorkflowId::new(id))
        .await
        .unwrap();
    assert_eq!(workflow.status().as_str(), "CANCELLED");
}

#[tokio::test]
async fn test_unknown_workflow_endpoints_return_not_found() {
    let harness = Harness::standard();
    let router = router(&harness);

    for uri in [
        "/api/v1/workflows/missing",
        "/api/v1/workflows/missing/audit",
    ] {
        let (status, body) = send(&router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    let (status, _) = send(
        &router,
        post("/api/v1/workflows/missing/cancel", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_breaker_is_visible_on_dependencies_endpoint() {
    let harness = Harness::standard();
    harness
        .breaker(ServiceDependency::RiskManager)
        .force_open();
    let router = router(&harness);

    let (status, body) = send(&router, get("/api/v1/dependencies")).await;
    assert_eq!(status, StatusCode::OK);

    let risk = body
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["name"] == "risk_manager")
        .unwrap();
    assert_eq!(risk["state"], "OPEN");
}

#[tokio::test]
async fn test_health_reflects_agent_checks_and_breakers() {
    let harness = Harness::standard();
    harness.breaker(ServiceDependency::RiskManager).force_open();
    harness.transport.mark_down("trade_executor");
    let router = router(&harness);

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["healthy"], 2);
    assert_eq!(body["degraded"], 1);
    assert_eq!(body["unhealthy"], 1);

    let by_name = |name: &str| {
        body["dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .find(|entry| entry["name"] == name)
            .cloned()
            .unwrap()
    };
    assert_eq!(by_name("risk_manager")["status"], "degraded");
    assert_eq!(by_name("risk_manager")["breaker_state"], "OPEN");
    assert_eq!(by_name("trade_executor")["status"], "unhealthy");
    assert_eq!(by_name("fundamental_analyst")["status"], "healthy");
}

#[tokio::test]
async fn test_health_unavailable_when_most_agents_are_down() {
    let harness = Harness::standard();
    for service in ["fundamental_analyst", "technical_analyst", "risk_manager"] {
        harness.transport.mark_down(service);
    }
    let router = router(&harness);

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn test_audit_summary_and_filtered_trail() {
    let harness = Harness::standard();
    harness.transport.script(
        RISK,
        [Reply::Result(json!({"decision": "DENY", "reason": "position limit"}))],
    );
    let router = router(&harness);

    let (_, denied) = send(
        &router,
        post("/api/v1/strategies?wait=true", &json!({"goal": "income"})),
    )
    .await;
    let (_, completed) = send(
        &router,
        post("/api/v1/strategies?wait=true", &json!({"goal": "growth"})),
    )
    .await;
    assert_eq!(denied["status"], "DENIED_RISK");
    assert_eq!(completed["status"], "COMPLETED");

    let (status, summary) = send(&router, get("/api/v1/audit/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_events"], 7);
    assert_eq!(summary["workflow_metrics"]["workflows_started"], 2);
    assert_eq!(summary["workflow_metrics"]["workflows_completed"], 1);
    assert_eq!(summary["workflow_metrics"]["workflows_rejected"], 1);
    assert_eq!(rate(&summary["workflow_metrics"]["workflow_success_rate"]), dec!(50));
    assert_eq!(summary["trading_metrics"]["trades_approved"], 1);
    assert_eq!(summary["trading_metrics"]["trades_denied"], 1);
    assert_eq!(summary["trading_metrics"]["trades_executed"], 1);
    assert_eq!(rate(&summary["trading_metrics"]["trade_success_rate"]), dec!(100));

    let (status, recent) = send(
        &router,
        get("/api/v1/audit/summary?since=2999-01-01T00:00:00Z"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recent["workflow_metrics"]["workflows_started"], 0);

    let id = denied["workflow_id"].as_str().unwrap();
    let (status, trail) = send(
        &router,
        get(&format!("/api/v1/workflows/{id}/audit?stage=RISK")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = trail["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["outcome"], "DOMAIN_REJECTION");
}
