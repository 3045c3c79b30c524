//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `rpc/`: JSON-RPC over HTTP transport to the analysis agents
//!   - `persistence/`: In-memory audit trail and workflow snapshots
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: REST API controllers
//!
//! - **Wiring**
//!   - `config/`: Dependency injection container

pub mod config;
pub mod http;
pub mod persistence;
pub mod rpc;
