//! JSON-RPC envelope and client.
//!
//! The client is the single point of truth for what happened on the wire.
//! It builds a correlated request, hands it to an [`RpcTransport`], waits
//! for the reply or the per-call timeout, and classifies the result as an
//! [`RpcOutcome`]. It never retries.
//!
//! # Classification
//!
//! | Observation | Outcome |
//! |-------------|---------|
//! | Connection refused/reset, timeout, HTTP 408/429/5xx | `TransportError(retryable=true)` |
//! | Other non-2xx HTTP status | `TransportError(retryable=false)` |
//! | Well-formed JSON-RPC error object | `TransportError(retryable=<error.retryable>)` |
//! | Unparseable body, id mismatch, bad version, non-object result | `ProtocolError` |
//! | Well-formed result object | `Success(result)` |

mod client;
mod envelope;
mod outcome;
mod transport;

pub use client::{RpcClient, decode_response};
pub use envelope::{
    JSONRPC_VERSION, RpcEnvelope, RpcErrorObject, RpcRequest, RpcResponse, RpcTarget, error_codes,
};
pub use outcome::RpcOutcome;
pub use transport::{RpcTransport, TransportFault};

#[cfg(test)]
pub use transport::MockRpcTransport;
