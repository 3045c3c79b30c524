//! RPC transport adapters.
//!
//! HTTP status classification shared by every transport, plus the reqwest
//! adapter used in production.

mod http_transport;

pub use http_transport::{A2A_PATH, CORRELATION_ID_HEADER, HEALTH_PATH, HttpTransport};

/// HTTP status codes that are retryable besides 5xx.
const RETRYABLE_STATUS_CODES: &[u16] = &[
    408, // Request Timeout
    429, // Too Many Requests (Rate Limited)
];

/// Check if an HTTP status code is retryable.
#[must_use]
pub fn is_retryable_status(status_code: u16) -> bool {
    // 5xx server errors are generally retryable
    if (500..600).contains(&status_code) {
        return true;
    }

    RETRYABLE_STATUS_CODES.contains(&status_code)
}
