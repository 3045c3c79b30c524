// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::items_after_statements
    )
)]

//! Strategy Orchestrator - Rust Core Library
//!
//! Resilient orchestration of the trading decision pipeline. A submitted
//! strategy becomes a workflow that passes, in order, through fundamental
//! analysis, technical analysis, risk evaluation and trade execution, each
//! performed by a remote agent over JSON-RPC.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Workflow aggregate, stages, statuses and stage payloads
//!   - `workflow`: Workflow lifecycle, stage results, strategy input
//!   - `trading`: Typed agent replies and trade proposal sizing
//!
//! - **Application**: Orchestration
//!   - `ports`: `AuditTrail`, `WorkflowRepository`
//!   - `services`: Stage handlers, `WorkflowOrchestrator`, audit reporting
//!
//! - **Infrastructure**: Adapters
//!   - `rpc`: reqwest JSON-RPC transport
//!   - `persistence`: In-memory audit trail and snapshots
//!   - `http`: axum REST API
//!   - `config`: Dependency injection container
//!
//! ## Cross-cutting
//!
//! - `rpc`: Envelope, wire codec and outcome classification
//! - `resilience`: Circuit breaker, retry executor and health checks per dependency
//! - `config`: YAML configuration with env interpolation
//! - `observability`: Prometheus metrics and tracing setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Orchestration and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting Modules
// =============================================================================

/// JSON-RPC envelope, client and transport seam.
pub mod rpc;

/// Circuit breaker and retry executor.
pub mod resilience;

/// Configuration loading and validation.
pub mod config;

/// Metrics and logging.
pub mod observability;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::shared::{CorrelationId, TradeId, WorkflowId};
pub use domain::workflow::{
    Stage, StageOutcome, StageResult, StrategyInput, Workflow, WorkflowStatus, WorkflowSummary,
};

// Application re-exports
pub use application::ports::{AuditTrail, WorkflowRepository};
pub use application::{OrchestratorError, PipelineSettings, WorkflowOrchestrator};

// Infrastructure re-exports
pub use infrastructure::config::{Container, DefaultOrchestrator};
pub use infrastructure::http::{AppState, create_router};
pub use infrastructure::persistence::{InMemoryAuditTrail, InMemoryWorkflowRepository};
pub use infrastructure::rpc::HttpTransport;
