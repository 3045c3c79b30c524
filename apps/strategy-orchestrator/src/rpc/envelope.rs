//! Wire types for JSON-RPC 2.0.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::shared::CorrelationId;

/// Protocol version carried on every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used by the collaborator services.
pub mod error_codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON sent is not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal error.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Analysis could not be produced.
    pub const ANALYSIS_FAILED: i64 = -32001;
    /// Not enough data to answer.
    pub const INSUFFICIENT_DATA: i64 = -32002;
    /// Trade violates a risk limit.
    pub const RISK_VIOLATION: i64 = -32003;
    /// Venue failed to execute.
    pub const TRADE_EXECUTION_FAILED: i64 = -32004;
    /// Service is temporarily unavailable.
    pub const SERVICE_UNAVAILABLE: i64 = -32005;
}

/// A named remote service and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTarget {
    /// Service name (used in logs and metrics).
    pub name: String,
    /// Base URL of the service.
    pub endpoint: String,
}

impl RpcTarget {
    /// Create a target.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// One outgoing call. Discarded once its response has been matched.
#[derive(Debug, Clone)]
pub struct RpcEnvelope {
    /// Fresh id for this call.
    pub correlation_id: CorrelationId,
    /// Remote method.
    pub method: String,
    /// Structured parameters.
    pub params: Map<String, Value>,
    /// Service the call is addressed to.
    pub target_service: String,
}

impl RpcEnvelope {
    /// Build an envelope with a newly generated correlation id.
    #[must_use]
    pub fn new(
        target_service: impl Into<String>,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Self {
        Self {
            correlation_id: CorrelationId::generate(),
            method: method.into(),
            params,
            target_service: target_service.into(),
        }
    }

    /// Wire request for this envelope.
    #[must_use]
    pub fn to_request(&self) -> RpcRequest {
        RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: self.method.clone(),
            params: Value::Object(self.params.clone()),
            id: self.correlation_id.clone(),
        }
    }
}

/// JSON-RPC request object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Remote method.
    pub method: String,
    /// Parameters.
    pub params: Value,
    /// Correlation id.
    pub id: CorrelationId,
}

/// JSON-RPC response object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Should be `"2.0"`.
    pub jsonrpc: String,
    /// Echo of the request id (null when the peer could not read it).
    #[serde(default)]
    pub id: Option<CorrelationId>,
    /// Result payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

/// Error object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Whether the caller may retry. Services that predate the flag omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
    /// Extra diagnostic data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    /// Whether the error is transient.
    ///
    /// An explicit flag wins; without one only `SERVICE_UNAVAILABLE` is
    /// treated as transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
            .unwrap_or(self.code == error_codes::SERVICE_UNAVAILABLE)
    }
}
