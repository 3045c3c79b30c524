//! Workflow bounded context.
//!
//! A workflow is one end-to-end run of the four-stage pipeline for a single
//! strategy submission. The aggregate enforces stage ordering and the
//! single terminal status.

pub mod aggregate;
pub mod errors;
pub mod stage;
pub mod stage_result;
pub mod status;
pub mod strategy;

pub use aggregate::{Workflow, WorkflowSummary};
pub use errors::WorkflowError;
pub use stage::{ServiceDependency, Stage};
pub use stage_result::{StageOutcome, StageResult};
pub use status::WorkflowStatus;
pub use strategy::{RiskTolerance, StrategyInput, TimeHorizon};
