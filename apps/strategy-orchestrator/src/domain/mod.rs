//! Domain layer for the strategy orchestrator.
//!
//! Pure types with no I/O:
//!
//! - `shared`: strongly-typed identifiers
//! - `workflow`: the workflow aggregate, its stages, statuses and stage results
//! - `trading`: the payloads exchanged with the four collaborator services

pub mod shared;
pub mod trading;
pub mod workflow;
