//! Application services.

mod audit_report;
mod settings;
mod stage_handlers;
mod workflow_orchestrator;

pub use audit_report::{
    AuditFilter, AuditSummary, StageOutcomeCounts, TradingMetrics, WorkflowMetrics,
};
pub use settings::PipelineSettings;
pub use stage_handlers::{
    ExecutionStage, FundamentalStage, RiskStage, StageContext, StageDecision, StageHandler,
    StageHandlers, TechnicalStage,
};
pub use workflow_orchestrator::{OrchestratorError, WorkflowOrchestrator};
