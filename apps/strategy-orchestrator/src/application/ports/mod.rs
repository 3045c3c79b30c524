//! Application Ports (Driven)
//!
//! Interfaces the orchestrator writes through. In-memory adapters live in
//! `infrastructure::persistence`.

mod audit_trail_port;
mod workflow_repository_port;

pub use audit_trail_port::{AuditError, AuditTrail};
pub use workflow_repository_port::{RepositoryError, WorkflowRepository};

#[cfg(test)]
pub use audit_trail_port::MockAuditTrail;
#[cfg(test)]
pub use workflow_repository_port::MockWorkflowRepository;
