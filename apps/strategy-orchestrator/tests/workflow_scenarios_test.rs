//! Workflow Scenario Integration Tests
//!
//! Drives complete workflows through the orchestrator against a scripted
//! transport playing the four analysis agents.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;

use common::{EXECUTION, FUNDAMENTAL, Gate, Harness, RISK, Reply, TECHNICAL};
use strategy_orchestrator::application::{OrchestratorError, PipelineSettings};
use strategy_orchestrator::domain::trading::ExecutionStatus;
use strategy_orchestrator::domain::workflow::{
    ServiceDependency, Stage, StageOutcome, StrategyInput, WorkflowStatus,
};
use strategy_orchestrator::resilience::{CircuitBreakerState, RetryPolicy};
use strategy_orchestrator::rpc::TransportFault;

fn strategy() -> StrategyInput {
    StrategyInput::new("Find undervalued semiconductor companies")
        .with_sector("technology")
        .with_max_investment(dec!(25000))
}

fn stages(results: &[strategy_orchestrator::StageResult]) -> Vec<Stage> {
    results.iter().map(|r| r.stage).collect()
}

// =============================================================================
// Scenario A: no candidates
// =============================================================================

#[tokio::test]
async fn test_empty_candidate_list_rejects_at_fundamental() {
    let harness = Harness::standard();
    harness
        .transport
        .script(FUNDAMENTAL, [Reply::Result(json!({"companies": []}))]);

    let id = harness.orchestrator.submit(strategy()).await.unwrap();
    let workflow = harness.orchestrator.wait(&id).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::RejectedFundamental);
    assert_eq!(workflow.stage_results().len(), 1);
    assert_eq!(
        workflow.stage_results()[0].outcome,
        StageOutcome::DomainRejection
    );
    assert!(workflow.final_result().is_none());
    assert!(workflow.completed_at().is_some());

    assert_eq!(harness.transport.calls(FUNDAMENTAL), 1);
    assert_eq!(harness.transport.calls(TECHNICAL), 0);
    assert_eq!(harness.transport.calls(RISK), 0);
    assert_eq!(harness.transport.calls(EXECUTION), 0);
}

// =============================================================================
// Scenario B: happy path
// =============================================================================

#[tokio::test]
async fn test_all_stages_proceed_to_completion() {
    let harness = Harness::standard();

    let id = harness.orchestrator.submit(strategy()).await.unwrap();
    let workflow = harness.orchestrator.wait(&id).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    assert_eq!(
        stages(workflow.stage_results()),
        vec![Stage::Fundamental, Stage::Technical, Stage::Risk, Stage::Execution]
    );
    assert!(
        workflow
            .stage_results()
            .iter()
            .all(|r| r.outcome == StageOutcome::Success && r.attempt_count == 1)
    );

    // 10_000 cap / 125.00 entry = 80 shares, approved in full
    let trade = workflow.final_result().expect("final result");
    assert_eq!(trade.ticker, "NVDA");
    assert_eq!(trade.quantity, 80);
    assert_eq!(trade.status, ExecutionStatus::Executed);
    assert_eq!(trade.trade_id.as_ref().unwrap().as_str(), "T-1001");
    assert_eq!(workflow.warnings(), ["sector concentration above 20%"]);

    let trail = harness.orchestrator.audit_trail(&id).await.unwrap();
    assert_eq!(trail, workflow.stage_results());
}

// =============================================================================
// Scenario C: execution breaker open
// =============================================================================

#[tokio::test]
async fn test_open_execution_breaker_fails_without_network_attempt() {
    let harness = Harness::standard();
    harness
        .breaker(ServiceDependency::TradeExecutor)
        .force_open();

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::ExecutionFailed);
    assert_eq!(harness.transport.calls(EXECUTION), 0);
    assert_eq!(harness.transport.calls(RISK), 1);

    let results = workflow.stage_results();
    assert_eq!(results.len(), 4);
    let execution = &results[3];
    assert_eq!(execution.stage, Stage::Execution);
    assert_eq!(execution.outcome, StageOutcome::Failed);
    assert_eq!(execution.attempt_count, 0);
    assert!(execution.duration < Duration::from_millis(50));
    assert!(
        execution
            .detail
            .as_deref()
            .unwrap()
            .contains("trade_executor")
    );
    assert!(workflow.last_error().is_some());
    assert!(workflow.final_result().is_none());

    let metrics = harness
        .breaker(ServiceDependency::TradeExecutor)
        .metrics();
    assert_eq!(metrics.state, CircuitBreakerState::Open);
    assert_eq!(metrics.rejected_calls, 1);
}

// =============================================================================
// Scenario D: transient technical failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_technical_succeeds_on_third_attempt() {
    let harness = Harness::standard();
    harness.transport.script(
        TECHNICAL,
        [
            Reply::Fault(TransportFault::Unreachable("connection refused".into())),
            Reply::Fault(TransportFault::Status {
                status: 503,
                body: "warming up".into(),
            }),
        ],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    let technical = &workflow.stage_results()[1];
    assert_eq!(technical.stage, Stage::Technical);
    assert_eq!(technical.outcome, StageOutcome::Success);
    assert_eq!(technical.attempt_count, 3);
    assert_eq!(harness.transport.calls(TECHNICAL), 3);

    // One logical success resets the breaker's streak
    let breaker = harness
        .breaker(ServiceDependency::TechnicalAnalyst)
        .metrics();
    assert_eq!(breaker.state, CircuitBreakerState::Closed);
    assert_eq!(breaker.consecutive_failures, 0);
}

// =============================================================================
// Scenario E: cancellation during technical
// =============================================================================

#[tokio::test]
async fn test_cancel_while_technical_in_flight_discards_its_result() {
    let harness = Harness::standard();
    let gate = Arc::new(Gate::default());
    harness
        .transport
        .script(TECHNICAL, [Reply::Block(Arc::clone(&gate))]);

    let id = harness.orchestrator.submit(strategy()).await.unwrap();
    gate.entered.notified().await;

    harness.orchestrator.cancel(&id).await.unwrap();
    let workflow = harness.orchestrator.wait(&id).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Cancelled);
    assert_eq!(stages(workflow.stage_results()), vec![Stage::Fundamental]);
    assert!(workflow.last_error().unwrap().contains("cancelled"));

    // The abandoned call may finish, but nothing more is recorded
    gate.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let trail = harness.orchestrator.audit_trail(&id).await.unwrap();
    assert_eq!(stages(&trail), vec![Stage::Fundamental]);
    assert_eq!(harness.transport.calls(RISK), 0);
}

#[tokio::test]
async fn test_dropping_run_caller_leaves_workflow_running() {
    let harness = Harness::standard();
    let gate = Arc::new(Gate::default());
    harness
        .transport
        .script(TECHNICAL, [Reply::Block(Arc::clone(&gate))]);

    let orchestrator = Arc::clone(&harness.orchestrator);
    let caller = tokio::spawn(async move { orchestrator.run(strategy()).await });
    gate.entered.notified().await;
    caller.abort();
    assert!(caller.await.unwrap_err().is_cancelled());

    let id = harness.orchestrator.list().await.unwrap()[0].id.clone();
    let snapshot = harness.orchestrator.get_status(&id).await.unwrap();
    assert_eq!(snapshot.status(), WorkflowStatus::Technical);
    assert_eq!(harness.orchestrator.live_workflows(), 1);

    gate.release.notify_one();
    let workflow = harness.orchestrator.wait(&id).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    let trail = harness.orchestrator.audit_trail(&id).await.unwrap();
    assert_eq!(stages(&trail), Stage::ALL.to_vec());
    assert_eq!(harness.orchestrator.live_workflows(), 0);
}

// =============================================================================
// Domain rejections and failures at each stage
// =============================================================================

#[tokio::test]
async fn test_hold_signal_ends_in_hold_technical() {
    let harness = Harness::standard();
    harness.transport.script(
        TECHNICAL,
        [Reply::Result(json!({"signal": "HOLD", "confidence": 0.4}))],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::HoldTechnical);
    assert_eq!(workflow.stage_results().len(), 2);
    assert!(
        workflow.stage_results()[1]
            .detail
            .as_deref()
            .unwrap()
            .contains("HOLD")
    );
    assert_eq!(harness.transport.calls(RISK), 0);
}

#[tokio::test]
async fn test_risk_denial_ends_in_denied_risk() {
    let harness = Harness::standard();
    harness.transport.script(
        RISK,
        [Reply::Result(json!({
            "decision": "DENY",
            "reason": "position limit exceeded",
            "violations": ["max_position_pct"]
        }))],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::DeniedRisk);
    let risk = &workflow.stage_results()[2];
    assert_eq!(risk.outcome, StageOutcome::DomainRejection);
    assert_eq!(risk.attempt_count, 1);
    assert!(risk.detail.as_deref().unwrap().contains("position limit"));
    assert_eq!(harness.transport.calls(EXECUTION), 0);
}

#[tokio::test]
async fn test_conditional_approval_caps_executed_quantity() {
    let harness = Harness::standard();
    harness.transport.script(
        RISK,
        [Reply::Result(json!({
            "decision": "CONDITIONAL_APPROVE",
            "approved_quantity": 30
        }))],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    assert_eq!(workflow.final_result().unwrap().quantity, 30);
}

#[tokio::test]
async fn test_venue_failure_ends_in_execution_failed_with_report() {
    let harness = Harness::standard();
    harness.transport.script(
        EXECUTION,
        [Reply::Result(json!({"status": "FAILED", "reason": "market closed"}))],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::ExecutionFailed);
    let execution = &workflow.stage_results()[3];
    assert_eq!(execution.outcome, StageOutcome::DomainRejection);
    let trade = workflow.final_result().unwrap();
    assert_eq!(trade.status, ExecutionStatus::Failed);
    assert_eq!(trade.reason.as_deref(), Some("market closed"));
}

#[tokio::test]
async fn test_protocol_violation_fails_stage_without_retry() {
    let harness = Harness::standard();
    harness
        .transport
        .script(TECHNICAL, [Reply::Raw("<html>gateway</html>".to_string())]);

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
    let technical = &workflow.stage_results()[1];
    assert_eq!(technical.outcome, StageOutcome::Failed);
    assert_eq!(technical.attempt_count, 1);
    assert_eq!(harness.transport.calls(TECHNICAL), 1);
    assert!(workflow.last_error().is_some());
}

#[tokio::test]
async fn test_buy_without_entry_price_is_a_contract_failure() {
    let harness = Harness::standard();
    harness.transport.script(
        TECHNICAL,
        [Reply::Result(json!({"signal": "BUY", "confidence": 0.9}))],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
    assert_eq!(workflow.stage_results()[1].outcome, StageOutcome::Failed);
    assert_eq!(harness.transport.calls(RISK), 0);
}

#[tokio::test]
async fn test_peer_rejection_is_not_retried() {
    let harness = Harness::standard();
    harness.transport.script(
        FUNDAMENTAL,
        [Reply::RpcError {
            code: -32602,
            retryable: Some(false),
        }],
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
    assert_eq!(workflow.stage_results()[0].attempt_count, 1);
    assert_eq!(harness.transport.calls(FUNDAMENTAL), 1);
    // The peer answered, so the dependency is healthy
    let breaker = harness
        .breaker(ServiceDependency::FundamentalAnalyst)
        .metrics();
    assert_eq!(breaker.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_fail_the_stage() {
    let harness = Harness::standard();
    harness.transport.always(
        RISK,
        Reply::RpcError {
            code: -32005,
            retryable: None,
        },
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
    let risk = &workflow.stage_results()[2];
    assert_eq!(risk.outcome, StageOutcome::Failed);
    assert_eq!(risk.attempt_count, 3);
    assert_eq!(harness.transport.calls(RISK), 3);
    assert_eq!(
        harness
            .breaker(ServiceDependency::RiskManager)
            .metrics()
            .consecutive_failures,
        1
    );
}

// =============================================================================
// Timeouts, concurrency and breaker sharing
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_overall_timeout_cancels_workflow() {
    let harness = Harness::new(
        RetryPolicy::no_retry(),
        PipelineSettings {
            workflow_timeout: Duration::from_secs(5),
            ..PipelineSettings::default()
        },
    );
    let gate = Arc::new(Gate::default());
    harness
        .transport
        .script(RISK, [Reply::Block(Arc::clone(&gate))]);

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Cancelled);
    assert_eq!(
        stages(workflow.stage_results()),
        vec![Stage::Fundamental, Stage::Technical]
    );
    assert!(workflow.last_error().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_concurrent_workflows_complete_independently() {
    let harness = Harness::standard();

    let mut ids = Vec::new();
    for i in 0..16 {
        let input = StrategyInput::new(format!("strategy {i}"));
        ids.push(harness.orchestrator.submit(input).await.unwrap());
    }

    for id in &ids {
        let workflow = harness.orchestrator.wait(id).await.unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::Completed);
        assert_eq!(workflow.stage_results().len(), 4);
    }
    assert_eq!(harness.transport.calls(EXECUTION), 16);
    assert_eq!(harness.orchestrator.list().await.unwrap().len(), 16);
    assert_eq!(harness.orchestrator.live_workflows(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failing_dependency_opens_breaker_for_later_workflows() {
    let harness = Harness::new(RetryPolicy::no_retry(), PipelineSettings::default());
    harness.transport.always(
        FUNDAMENTAL,
        Reply::Fault(TransportFault::Unreachable("connection refused".into())),
    );

    for _ in 0..5 {
        let workflow = harness.orchestrator.run(strategy()).await.unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
        assert_eq!(workflow.stage_results()[0].attempt_count, 1);
    }
    assert_eq!(
        harness
            .breaker(ServiceDependency::FundamentalAnalyst)
            .metrics()
            .state,
        CircuitBreakerState::Open
    );

    let workflow = harness.orchestrator.run(strategy()).await.unwrap();
    assert_eq!(workflow.status(), WorkflowStatus::StageFailed);
    assert_eq!(workflow.stage_results()[0].attempt_count, 0);
    assert_eq!(harness.transport.calls(FUNDAMENTAL), 5);
}

#[tokio::test]
async fn test_shutdown_cancels_running_workflows() {
    let harness = Harness::standard();
    let gate = Arc::new(Gate::default());
    harness
        .transport
        .script(FUNDAMENTAL, [Reply::Block(Arc::clone(&gate))]);

    let id = harness.orchestrator.submit(strategy()).await.unwrap();
    gate.entered.notified().await;

    harness.orchestrator.shutdown().await;

    let workflow = harness.orchestrator.get_status(&id).await.unwrap();
    assert_eq!(workflow.status(), WorkflowStatus::Cancelled);
    assert!(workflow.stage_results().is_empty());
    assert!(matches!(
        harness.orchestrator.submit(strategy()).await,
        Err(OrchestratorError::ShuttingDown)
    ));
}
