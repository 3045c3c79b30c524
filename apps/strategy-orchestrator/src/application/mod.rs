//! Application Layer
//!
//! Drives workflows through the pipeline.
//!
//! - **Ports**: the audit trail and workflow snapshot store
//! - **Services**: the stage handler table, the workflow orchestrator and
//!   audit reporting

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
