//! Dependency Injection Container
//!
//! Builds the resilience stack for every dependency and wires it, with the
//! in-memory adapters, into a `WorkflowOrchestrator`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::application::WorkflowOrchestrator;
use crate::config::Config;
use crate::domain::workflow::ServiceDependency;
use crate::infrastructure::http::AppState;
use crate::infrastructure::persistence::{InMemoryAuditTrail, InMemoryWorkflowRepository};
use crate::infrastructure::rpc::HttpTransport;
use crate::resilience::{CircuitBreaker, ProtectedDependency, ServiceDependencies};
use crate::rpc::{RpcClient, RpcTarget, RpcTransport};

/// Orchestrator over the in-memory adapters.
pub type DefaultOrchestrator = WorkflowOrchestrator<InMemoryAuditTrail, InMemoryWorkflowRepository>;

/// Connect timeout for agent connections.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Container construction errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Dependency injection container.
pub struct Container {
    orchestrator: Arc<DefaultOrchestrator>,
    audit: Arc<InMemoryAuditTrail>,
    repository: Arc<InMemoryWorkflowRepository>,
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl Container {
    /// Wire everything against real agents over HTTP.
    pub fn from_config(config: &Config) -> Result<Self, ContainerError> {
        let transport = HttpTransport::new(CONNECT_TIMEOUT)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Wire everything over the given transport.
    #[must_use]
    pub fn with_transport(config: &Config, transport: Arc<dyn RpcTransport>) -> Self {
        let client = RpcClient::new(transport);
        let retry = config.retry.to_policy();

        let bind = |dependency: ServiceDependency| {
            let endpoint = config.services.endpoint(dependency);
            let name = dependency.as_str();
            Arc::new(ProtectedDependency::new(
                RpcTarget::new(name, endpoint.url.clone()),
                client.clone(),
                Arc::new(CircuitBreaker::new(
                    name,
                    config.circuit_breaker.for_dependency(dependency),
                )),
                retry.clone(),
                endpoint.timeout(),
            ))
        };

        let dependencies = ServiceDependencies::new(
            bind(ServiceDependency::FundamentalAnalyst),
            bind(ServiceDependency::TechnicalAnalyst),
            bind(ServiceDependency::RiskManager),
            bind(ServiceDependency::TradeExecutor),
        )
        .with_health_check_timeout(config.services.health_check_timeout());

        let audit = Arc::new(InMemoryAuditTrail::new());
        let repository = Arc::new(InMemoryWorkflowRepository::new());
        let orchestrator = Arc::new(WorkflowOrchestrator::new(
            dependencies,
            config.workflow.to_settings(),
            Arc::clone(&audit),
            Arc::clone(&repository),
        ));

        Self {
            orchestrator,
            audit,
            repository,
        }
    }

    /// Get the orchestrator.
    pub fn orchestrator(&self) -> Arc<DefaultOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    /// Get the audit trail.
    pub fn audit(&self) -> Arc<InMemoryAuditTrail> {
        Arc::clone(&self.audit)
    }

    /// Get the workflow repository.
    pub fn repository(&self) -> Arc<InMemoryWorkflowRepository> {
        Arc::clone(&self.repository)
    }

    /// HTTP state for the REST API.
    pub fn app_state(&self) -> AppState<InMemoryAuditTrail, InMemoryWorkflowRepository> {
        AppState {
            orchestrator: self.orchestrator(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::MockRpcTransport;

    #[test]
    fn test_breakers_named_after_dependencies() {
        let container =
            Container::with_transport(&Config::default(), Arc::new(MockRpcTransport::new()));
        let health = container.orchestrator().dependency_health();

        let names: Vec<&str> = health.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["fundamental_analyst", "technical_analyst", "risk_manager", "trade_executor"]
        );
    }

    #[test]
    fn test_from_config_builds() {
        let container = Container::from_config(&Config::default()).unwrap();
        assert!(container.repository().is_empty());
        assert!(container.audit().is_empty());
        assert_eq!(container.app_state().version, env!("CARGO_PKG_VERSION"));
    }
}
