//! Transport seam between the RPC client and the network.

use async_trait::async_trait;
use thiserror::Error;

use super::{RpcRequest, RpcTarget};
use crate::infrastructure::rpc::is_retryable_status;

/// Failure to exchange bytes with a peer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFault {
    /// Could not connect, or the connection dropped.
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// The transport gave up waiting.
    #[error("Transport timeout: {0}")]
    Timeout(String),

    /// The peer answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly truncated).
        body: String,
    },

    /// Anything else the transport could not handle.
    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportFault {
    /// Whether the fault is transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::Timeout(_) | Self::Other(_) => true,
            Self::Status { status, .. } => is_retryable_status(*status),
        }
    }
}

/// Sends one request to one target and returns the raw response body.
///
/// Implementations must not retry and must not interpret the body.
/// Health checks bypass the JSON-RPC envelope entirely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Deliver `request` to `target` and return the response body.
    async fn send(&self, target: &RpcTarget, request: &RpcRequest) -> Result<String, TransportFault>;

    /// Ask `target` whether it is up. `Ok` only when it answers with 200.
    async fn check_health(&self, target: &RpcTarget) -> Result<(), TransportFault>;
}
