//! Persistence Adapters
//!
//! In-memory implementations of the audit trail and workflow snapshot ports.
//! Workflow state is live only and does not survive a restart.

pub mod in_memory;

pub use in_memory::{InMemoryAuditTrail, InMemoryWorkflowRepository};
