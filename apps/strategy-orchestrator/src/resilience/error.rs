//! Errors surfaced by the resilience stack.

use thiserror::Error;

/// Why a protected call did not produce a result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    /// The peer read the request and refused it, so retrying will not help.
    #[error("Request rejected: {detail}")]
    Transport {
        /// Failure detail.
        detail: String,
        /// Whether the failure was transient.
        retryable: bool,
    },

    /// The reply violated the wire contract.
    #[error("Protocol error: {detail}")]
    Protocol {
        /// Failure detail.
        detail: String,
    },

    /// Every attempt failed transiently.
    #[error("Retries exhausted after {attempts} attempts: {detail}")]
    RetryExhausted {
        /// Attempts made.
        attempts: u32,
        /// Detail of the last failure.
        detail: String,
    },

    /// The dependency's breaker rejected the call without touching the network.
    #[error("Circuit breaker for '{dependency}' is open")]
    CircuitOpen {
        /// Dependency name.
        dependency: String,
    },
}

impl CallError {
    /// Whether the failure says the dependency itself is unhealthy.
    ///
    /// A peer that answers with a well-formed refusal is reachable and
    /// working, so it does not count against its breaker.
    #[must_use]
    pub const fn is_dependency_failure(&self) -> bool {
        match self {
            Self::RetryExhausted { .. } | Self::Protocol { .. } => true,
            Self::Transport { retryable, .. } => *retryable,
            Self::CircuitOpen { .. } => false,
        }
    }

    /// Label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "rejected",
            Self::Protocol { .. } => "protocol_error",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::CircuitOpen { .. } => "circuit_open",
        }
    }
}
