//! RPC client: correlate, send, wait, classify.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use super::{
    JSONRPC_VERSION, RpcEnvelope, RpcOutcome, RpcResponse, RpcTarget, RpcTransport, TransportFault,
};
use crate::observability::metrics;

/// Makes single, unretried calls to remote services.
#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Create a client over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Call `method` on `target` and wait at most `timeout` for the reply.
    pub async fn call(
        &self,
        target: &RpcTarget,
        method: &str,
        params: Map<String, Value>,
        timeout: Duration,
    ) -> RpcOutcome {
        let envelope = RpcEnvelope::new(target.name.clone(), method, params);
        let request = envelope.to_request();
        let started = Instant::now();

        tracing::debug!(
            service = %target.name,
            method,
            correlation_id = %envelope.correlation_id,
            "Sending RPC request"
        );

        let outcome = match tokio::time::timeout(timeout, self.transport.send(target, &request)).await
        {
            Err(_) => RpcOutcome::transport(
                format!("no response within {}ms", timeout.as_millis()),
                true,
            ),
            Ok(Err(fault)) => RpcOutcome::transport(fault.to_string(), fault.is_retryable()),
            Ok(Ok(body)) => decode_response(&envelope, &body),
        };

        let elapsed = started.elapsed();
        metrics::record_rpc_call(&target.name, method, outcome.kind(), elapsed.as_secs_f64());

        match &outcome {
            RpcOutcome::Success(_) => tracing::debug!(
                service = %target.name,
                method,
                correlation_id = %envelope.correlation_id,
                elapsed_ms = elapsed.as_millis() as u64,
                "RPC call succeeded"
            ),
            RpcOutcome::TransportError { detail, retryable } => tracing::warn!(
                service = %target.name,
                method,
                correlation_id = %envelope.correlation_id,
                retryable,
                error = %detail,
                "RPC transport error"
            ),
            RpcOutcome::ProtocolError { detail } => tracing::error!(
                service = %target.name,
                method,
                correlation_id = %envelope.correlation_id,
                error = %detail,
                "RPC protocol error"
            ),
        }

        outcome
    }

    /// Check whether `target` is up, waiting at most `timeout`.
    pub async fn check_health(&self, target: &RpcTarget, timeout: Duration) -> Result<(), TransportFault> {
        match tokio::time::timeout(timeout, self.transport.check_health(target)).await {
            Ok(result) => result,
            Err(_) => Err(TransportFault::Timeout(format!(
                "no health response within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

/// Classify a raw response body against the envelope it answers.
#[must_use]
pub fn decode_response(envelope: &RpcEnvelope, body: &str) -> RpcOutcome {
    let response: RpcResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => return RpcOutcome::protocol(format!("response is not valid JSON-RPC: {e}")),
    };

    if response.jsonrpc != JSONRPC_VERSION {
        return RpcOutcome::protocol(format!(
            "unsupported jsonrpc version '{}'",
            response.jsonrpc
        ));
    }

    if response.id.as_ref() != Some(&envelope.correlation_id) {
        return RpcOutcome::protocol(format!(
            "correlation id mismatch: expected {}, got {}",
            envelope.correlation_id,
            response
                .id
                .as_ref()
                .map_or("null", |id| id.as_str())
        ));
    }

    match (response.result, response.error) {
        (Some(_), Some(_)) => RpcOutcome::protocol("response carries both result and error"),
        (None, Some(error)) => RpcOutcome::transport(
            format!("[{}] {}", error.code, error.message),
            error.is_retryable(),
        ),
        (Some(Value::Object(result)), None) => RpcOutcome::Success(Value::Object(result)),
        (Some(other), None) => {
            RpcOutcome::protocol(format!("result must be an object, got {other}"))
        }
        (None, None) => RpcOutcome::protocol("response carries neither result nor error"),
    }
}
