//! Shared kernel types used across the domain.

mod identifiers;

pub use identifiers::{CorrelationId, TradeId, WorkflowId};
