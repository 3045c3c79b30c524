//! JSON-RPC over HTTP transport (Driven Adapter).
//!
//! Each request is POSTed to `{endpoint}/a2a` with the correlation id in an
//! `X-Correlation-ID` header. Only transport-level concerns live here: the
//! body of a 2xx reply is handed back verbatim for the client to decode.
//!
//! Health checks are a plain `GET {endpoint}/health`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::rpc::{RpcRequest, RpcTarget, RpcTransport, TransportFault};

/// Path every agent serves JSON-RPC on.
pub const A2A_PATH: &str = "/a2a";

/// Path every agent serves its health check on.
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the correlation id.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Error bodies longer than this are cut before being reported.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Unhealthy replies are summarized more tightly.
const MAX_HEALTH_BODY_CHARS: usize = 200;

/// Reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with a connect timeout.
    ///
    /// The per-call deadline is enforced by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn url(target: &RpcTarget, path: &str) -> String {
        format!("{}{path}", target.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, target: &RpcTarget, request: &RpcRequest) -> Result<String, TransportFault> {
        let response = self
            .client
            .post(Self::url(target, A2A_PATH))
            .header(CORRELATION_ID_HEADER, request.id.as_str())
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportFault::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
    }

    async fn check_health(&self, target: &RpcTarget) -> Result<(), TransportFault> {
        let response = self
            .client
            .get(Self::url(target, HEALTH_PATH))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(TransportFault::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_HEALTH_BODY_CHARS).collect(),
        })
    }
}

fn classify(error: reqwest::Error) -> TransportFault {
    if error.is_timeout() {
        TransportFault::Timeout(error.to_string())
    } else if error.is_connect() || error.is_request() {
        TransportFault::Unreachable(error.to_string())
    } else {
        TransportFault::Other(error.to_string())
    }
}
