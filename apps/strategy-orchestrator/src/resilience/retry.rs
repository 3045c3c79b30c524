//! Retry executor with exponential backoff and jitter.
//!
//! | Outcome | Action |
//! |---------|--------|
//! | `Success` | stop, return the payload |
//! | `TransportError(retryable=true)` | back off and retry while attempts remain |
//! | `TransportError(retryable=false)` | stop, return `CallError::Transport` |
//! | `ProtocolError` | stop, return `CallError::Protocol` |
//!
//! When the budget runs out the last detail is returned as
//! `CallError::RetryExhausted`.
//!
//! The delay before retry `n` (0-based) is `min(max_delay, base_delay * 2^n)`
//! scaled by a random factor in `[1 - jitter_ratio, 1 + jitter_ratio]`.
//! Successive delays are clamped so they never decrease and never exceed
//! `max_delay`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CallError;
use crate::observability::metrics;
use crate::rpc::RpcOutcome;

/// Retry policy for one dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (default: 3).
    pub max_attempts: u32,
    /// Delay before the first retry (default: 1s).
    pub base_delay: Duration,
    /// Upper bound on any delay (default: 60s).
    pub max_delay: Duration,
    /// Jitter ratio (default: 0.25 = ±25%).
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter_ratio: 0.25,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        jitter_ratio: f64,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            jitter_ratio,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter_ratio: 0.0,
        }
    }
}

/// Backoff delay calculator.
#[derive(Debug)]
pub struct ExponentialBackoff {
    retries: u32,
    base_ms: u64,
    max_ms: u64,
    jitter_ratio: f64,
    last_ms: u64,
}

impl ExponentialBackoff {
    /// Create a calculator from a policy.
    #[must_use]
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            retries: 0,
            base_ms: u64::try_from(policy.base_delay.as_millis()).unwrap_or(u64::MAX),
            max_ms: u64::try_from(policy.max_delay.as_millis()).unwrap_or(u64::MAX),
            jitter_ratio: policy.jitter_ratio.clamp(0.0, 1.0),
            last_ms: 0,
        }
    }

    /// Delay before the next retry.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.base_backoff_ms();
        let jittered = self.apply_jitter(base);
        let delay = jittered.max(self.last_ms).min(self.max_ms);

        self.retries += 1;
        self.last_ms = delay;

        Duration::from_millis(delay)
    }

    /// Retries computed so far.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    fn base_backoff_ms(&self) -> u64 {
        let factor = 1u64.checked_shl(self.retries).unwrap_or(u64::MAX);
        self.base_ms.saturating_mul(factor).min(self.max_ms)
    }

    fn apply_jitter(&self, backoff_ms: u64) -> u64 {
        let spread = backoff_ms as f64 * self.jitter_ratio;
        if spread <= 0.0 {
            return backoff_ms;
        }
        let min = (backoff_ms as f64 - spread).max(0.0);
        let max = backoff_ms as f64 + spread;
        rand::rng().random_range(min..=max) as u64
    }
}

/// One attempt made by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// Delay slept after this attempt, if another one followed.
    pub next_delay: Option<Duration>,
}

/// Result of a retried call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome {
    /// Attempts in order.
    pub history: Vec<RetryAttempt>,
    /// Payload, or why there is none.
    pub result: Result<Value, CallError>,
}

impl RetryOutcome {
    /// Number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        u32::try_from(self.history.len()).unwrap_or(u32::MAX)
    }
}

/// Run `operation` under `policy`.
///
/// `operation` receives the 1-based attempt number.
pub async fn with_retry<F, Fut>(policy: &RetryPolicy, service: &str, mut operation: F) -> RetryOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RpcOutcome>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = ExponentialBackoff::new(policy);
    let mut history = Vec::new();

    loop {
        let attempt_number = backoff.retries() + 1;
        let outcome = operation(attempt_number).await;

        let result = match outcome {
            RpcOutcome::Success(payload) => Ok(payload),
            RpcOutcome::ProtocolError { detail } => Err(CallError::Protocol { detail }),
            RpcOutcome::TransportError {
                detail,
                retryable: false,
            } => Err(CallError::Transport {
                detail,
                retryable: false,
            }),
            RpcOutcome::TransportError {
                detail,
                retryable: true,
            } if attempt_number >= max_attempts => {
                tracing::warn!(
                    service,
                    attempts = attempt_number,
                    error = %detail,
                    "Retry budget exhausted"
                );
                Err(CallError::RetryExhausted {
                    attempts: attempt_number,
                    detail,
                })
            }
            RpcOutcome::TransportError {
                detail,
                retryable: true,
            } => {
                let delay = backoff.next_delay();
                history.push(RetryAttempt {
                    attempt_number,
                    next_delay: Some(delay),
                });

                tracing::warn!(
                    service,
                    attempt = attempt_number,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %detail,
                    "Transient failure, retrying"
                );
                metrics::record_retry_attempt(service);

                tokio::time::sleep(delay).await;
                continue;
            }
        };

        history.push(RetryAttempt {
            attempt_number,
            next_delay: None,
        });
        return RetryOutcome { history, result };
    }
}
