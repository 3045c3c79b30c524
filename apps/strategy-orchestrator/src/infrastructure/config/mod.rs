//! Infrastructure Configuration
//!
//! Dependency injection wiring from loaded configuration.

mod container;

pub use container::{Container, ContainerError, DefaultOrchestrator};
