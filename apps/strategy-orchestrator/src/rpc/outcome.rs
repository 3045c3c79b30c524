//! Classified result of one RPC call.

use serde_json::Value;

/// What happened on the wire for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    /// The peer answered with a result object.
    Success(Value),
    /// The call did not produce a usable answer.
    ///
    /// `retryable` separates transient failures (network, timeouts,
    /// overloaded peer) from requests the peer read and refused.
    TransportError {
        /// What went wrong.
        detail: String,
        /// Whether trying again may help.
        retryable: bool,
    },
    /// The answer violated the wire contract. Never retried.
    ProtocolError {
        /// What was wrong with the answer.
        detail: String,
    },
}

impl RpcOutcome {
    /// Shorthand for a transport error.
    #[must_use]
    pub fn transport(detail: impl Into<String>, retryable: bool) -> Self {
        Self::TransportError {
            detail: detail.into(),
            retryable,
        }
    }

    /// Shorthand for a protocol error.
    #[must_use]
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::ProtocolError {
            detail: detail.into(),
        }
    }

    /// Whether the retry executor should try again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportError { retryable: true, .. })
    }

    /// Label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::TransportError {
                retryable: true, ..
            } => "transient_error",
            Self::TransportError {
                retryable: false, ..
            } => "rejected",
            Self::ProtocolError { .. } => "protocol_error",
        }
    }
}
