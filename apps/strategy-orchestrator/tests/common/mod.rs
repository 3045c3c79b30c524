//! Shared fixtures for orchestrator integration tests.
//!
//! `ScriptedTransport` plays all four agents: each method answers from a
//! queue of scripted replies, falling back to a happy-path default, and
//! counts how often it was called. Health checks pass unless the service
//! was marked down.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

use strategy_orchestrator::application::PipelineSettings;
use strategy_orchestrator::domain::workflow::ServiceDependency;
use strategy_orchestrator::infrastructure::persistence::{
    InMemoryAuditTrail, InMemoryWorkflowRepository,
};
use strategy_orchestrator::resilience::{
    CircuitBreaker, CircuitBreakerConfig, ProtectedDependency, RetryPolicy, ServiceDependencies,
};
use strategy_orchestrator::rpc::{RpcClient, RpcRequest, RpcTarget, RpcTransport, TransportFault};
use strategy_orchestrator::{DefaultOrchestrator, WorkflowOrchestrator};

pub const FUNDAMENTAL: &str = "analyze_fundamentals";
pub const TECHNICAL: &str = "analyze_technical";
pub const RISK: &str = "evaluate_trade";
pub const EXECUTION: &str = "execute_trade";

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// JSON-RPC result object.
    Result(Value),
    /// JSON-RPC error object.
    RpcError { code: i64, retryable: Option<bool> },
    /// Transport-level failure.
    Fault(TransportFault),
    /// Raw body returned verbatim.
    Raw(String),
    /// Block until released, then answer with the default.
    Block(Arc<Gate>),
}

/// Rendezvous between a blocked call and the test.
#[derive(Debug, Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

pub fn default_result(method: &str) -> Value {
    match method {
        FUNDAMENTAL => json!({
            "companies": [
                {"ticker": "NVDA", "score": 94.5, "recommendation": "BUY"},
                {"ticker": "AMD", "score": 81.0}
            ],
            "summary": "Semiconductors screen well"
        }),
        TECHNICAL => json!({
            "signal": "BUY",
            "confidence": 0.82,
            "entry_price": 125.0,
            "target_price": 140.0,
            "stop_loss": 118.0
        }),
        RISK => json!({
            "decision": "APPROVE",
            "approved_quantity": 80,
            "warnings": ["sector concentration above 20%"]
        }),
        EXECUTION => json!({
            "status": "EXECUTED",
            "trade_id": "T-1001",
            "fill_price": 125.10
        }),
        other => panic!("unexpected method {other}"),
    }
}

#[derive(Debug, Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<HashMap<String, u32>>,
    down: Mutex<HashSet<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies for a method; once drained the default answers.
    pub fn script(&self, method: &str, replies: impl IntoIterator<Item = Reply>) -> &Self {
        self.scripts
            .lock()
            .entry(method.to_string())
            .or_default()
            .extend(replies);
        self
    }

    /// Answer every call of a method with the same reply.
    pub fn always(&self, method: &str, reply: Reply) -> &Self {
        self.script(method, std::iter::repeat_n(reply, 64))
    }

    /// Fail every health check of a service.
    pub fn mark_down(&self, service: &str) -> &Self {
        self.down.lock().insert(service.to_string());
        self
    }

    pub fn calls(&self, method: &str) -> u32 {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    fn next_reply(&self, method: &str) -> Option<Reply> {
        self.scripts
            .lock()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
    }
}

fn success_body(request: &RpcRequest, result: Value) -> String {
    json!({"jsonrpc": "2.0", "id": request.id, "result": result}).to_string()
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn send(&self, _target: &RpcTarget, request: &RpcRequest) -> Result<String, TransportFault> {
        *self.calls.lock().entry(request.method.clone()).or_default() += 1;

        match self.next_reply(&request.method) {
            None => Ok(success_body(request, default_result(&request.method))),
            Some(Reply::Result(result)) => Ok(success_body(request, result)),
            Some(Reply::RpcError { code, retryable }) => Ok(json!({
                "jsonrpc": "2.0",
                "id": request.id,
                "error": {"code": code, "message": "scripted error", "retryable": retryable}
            })
            .to_string()),
            Some(Reply::Fault(fault)) => Err(fault),
            Some(Reply::Raw(body)) => Ok(body),
            Some(Reply::Block(gate)) => {
                gate.entered.notify_one();
                gate.release.notified().await;
                Ok(success_body(request, default_result(&request.method)))
            }
        }
    }

    async fn check_health(&self, target: &RpcTarget) -> Result<(), TransportFault> {
        if self.down.lock().contains(&target.name) {
            Err(TransportFault::Unreachable(format!("{} is down", target.name)))
        } else {
            Ok(())
        }
    }
}

/// Orchestrator wired to a scripted transport, with handles on the breakers.
pub struct Harness {
    pub orchestrator: Arc<DefaultOrchestrator>,
    pub transport: Arc<ScriptedTransport>,
    breakers: HashMap<ServiceDependency, Arc<CircuitBreaker>>,
}

impl Harness {
    pub fn new(retry: RetryPolicy, settings: PipelineSettings) -> Self {
        let transport = Arc::new(ScriptedTransport::new());
        let client = RpcClient::new(Arc::clone(&transport) as Arc<dyn RpcTransport>);

        let mut breakers = HashMap::new();
        let mut bind = |dependency: ServiceDependency| {
            let breaker = Arc::new(CircuitBreaker::new(
                dependency.as_str(),
                CircuitBreakerConfig::default(),
            ));
            breakers.insert(dependency, Arc::clone(&breaker));
            Arc::new(ProtectedDependency::new(
                RpcTarget::new(dependency.as_str(), format!("http://{}", dependency.as_str())),
                client.clone(),
                breaker,
                retry.clone(),
                Duration::from_secs(30),
            ))
        };
        let dependencies = ServiceDependencies::new(
            bind(ServiceDependency::FundamentalAnalyst),
            bind(ServiceDependency::TechnicalAnalyst),
            bind(ServiceDependency::RiskManager),
            bind(ServiceDependency::TradeExecutor),
        );

        let orchestrator = WorkflowOrchestrator::new(
            dependencies,
            settings,
            Arc::new(InMemoryAuditTrail::new()),
            Arc::new(InMemoryWorkflowRepository::new()),
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            transport,
            breakers,
        }
    }

    /// Default pipeline settings and a fast three-attempt retry policy.
    pub fn standard() -> Self {
        Self::new(
            RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1), 0.25),
            PipelineSettings::default(),
        )
    }

    pub fn breaker(&self, dependency: ServiceDependency) -> &Arc<CircuitBreaker> {
        &self.breakers[&dependency]
    }
}
