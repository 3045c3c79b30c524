//! Per-dependency circuit breaker.
//!
//! # State Machine
//!
//! ```text
//! CLOSED → OPEN       (consecutive failures reach the threshold inside the window)
//! OPEN → HALF_OPEN    (cooldown elapsed since opened_at)
//! HALF_OPEN → CLOSED  (trial call succeeded)
//! HALF_OPEN → OPEN    (trial call failed, opened_at reset)
//! ```
//!
//! One breaker is shared by every workflow calling the same dependency.
//! All state lives behind a single mutex so that the failure count, the
//! CLOSED → OPEN transition and the half-open trial gate are each one
//! indivisible step.
//!
//! # Example
//!
//! ```rust,ignore
//! let breaker = CircuitBreaker::new("risk_manager", CircuitBreakerConfig::default());
//!
//! match breaker.try_acquire() {
//!     Ok(permit) => match call().await {
//!         Ok(_) => permit.record_success(),
//!         Err(_) => permit.record_failure(),
//!     },
//!     Err(_) => { /* fail fast */ }
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::CallError;
use crate::observability::metrics;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitBreakerState {
    /// Calls flow normally.
    Closed,
    /// Calls are rejected.
    Open,
    /// A single trial call is allowed through.
    HalfOpen,
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "CLOSED"),
            Self::Open => write!(f, "OPEN"),
            Self::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

impl CircuitBreakerState {
    /// Numeric value for the state gauge.
    #[must_use]
    pub const fn as_gauge(self) -> f64 {
        match self {
            Self::Closed => 0.0,
            Self::HalfOpen => 1.0,
            Self::Open => 2.0,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit (default: 5).
    pub failure_threshold: u32,
    /// Window in which the consecutive failures must occur (default: 60s).
    pub failure_window: Duration,
    /// Time to stay `OPEN` before probing (default: 60s).
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window: Duration::from_secs(60),
            cooldown: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitBreakerState,
    consecutive_failures: u32,
    window_start: Option<Instant>,
    opened_at: Option<Instant>,
    half_open_trial_in_flight: bool,
}

impl BreakerState {
    const fn closed() -> Self {
        Self {
            state: CircuitBreakerState::Closed,
            consecutive_failures: 0,
            window_start: None,
            opened_at: None,
            half_open_trial_in_flight: false,
        }
    }
}

/// Circuit breaker for one downstream dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    rejected_calls: AtomicU64,
    state_transitions: AtomicU64,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_circuit_breaker_state(&name, CircuitBreakerState::Closed);
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState::closed()),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            state_transitions: AtomicU64::new(0),
        }
    }

    /// Dependency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state, applying the cooldown transition if it is due.
    #[must_use]
    pub fn state(&self) -> CircuitBreakerState {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        inner.state
    }

    /// Ask to make a call.
    ///
    /// The returned permit must be settled with the call's result. Dropping
    /// an unsettled permit releases a half-open trial slot without changing
    /// state.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CallError> {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);

        let trial = match inner.state {
            CircuitBreakerState::Closed => false,
            CircuitBreakerState::HalfOpen if !inner.half_open_trial_in_flight => {
                inner.half_open_trial_in_flight = true;
                true
            }
            CircuitBreakerState::Open | CircuitBreakerState::HalfOpen => {
                drop(inner);
                self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                metrics::record_circuit_breaker_rejected(&self.name);
                return Err(CallError::CircuitOpen {
                    dependency: self.name.clone(),
                });
            }
        };
        drop(inner);

        self.total_calls.fetch_add(1, Ordering::Relaxed);
        Ok(CallPermit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    fn on_success(&self, trial: bool) {
        let mut inner = self.inner.lock();
        if trial {
            inner.half_open_trial_in_flight = false;
            if inner.state == CircuitBreakerState::HalfOpen {
                self.transition(&mut inner, CircuitBreakerState::Closed);
            }
        } else if inner.state == CircuitBreakerState::Closed {
            inner.consecutive_failures = 0;
            inner.window_start = None;
        }
    }

    fn on_failure(&self, trial: bool) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        let mut inner = self.inner.lock();
        if trial {
            inner.half_open_trial_in_flight = false;
            if inner.state == CircuitBreakerState::HalfOpen {
                self.transition(&mut inner, CircuitBreakerState::Open);
            }
            return;
        }

        // Calls admitted while CLOSED may finish after the circuit already
        // opened; they must not re-open it or reset opened_at.
        if inner.state != CircuitBreakerState::Closed {
            return;
        }

        let now = Instant::now();
        let window_expired = inner
            .window_start
            .is_none_or(|start| now.duration_since(start) > self.config.failure_window);
        if window_expired {
            inner.window_start = Some(now);
            inner.consecutive_failures = 0;
        }
        inner.consecutive_failures += 1;

        if inner.consecutive_failures >= self.config.failure_threshold {
            self.transition(&mut inner, CircuitBreakerState::Open);
        }
    }

    fn on_release(&self, trial: bool) {
        if trial {
            self.inner.lock().half_open_trial_in_flight = false;
        }
    }

    /// Apply the time-based `OPEN` → `HALF_OPEN` transition.
    fn refresh(&self, inner: &mut BreakerState) {
        if inner.state == CircuitBreakerState::Open
            && inner
                .opened_at
                .is_some_and(|opened| opened.elapsed() >= self.config.cooldown)
        {
            self.transition(inner, CircuitBreakerState::HalfOpen);
        }
    }

    fn transition(&self, inner: &mut BreakerState, to: CircuitBreakerState) {
        let from = inner.state;
        if from == to {
            return;
        }

        inner.state = to;
        match to {
            CircuitBreakerState::Open => {
                inner.opened_at = Some(Instant::now());
                inner.half_open_trial_in_flight = false;
            }
            CircuitBreakerState::HalfOpen => {
                inner.half_open_trial_in_flight = false;
            }
            CircuitBreakerState::Closed => {
                inner.consecutive_failures = 0;
                inner.window_start = None;
                inner.opened_at = None;
                inner.half_open_trial_in_flight = false;
            }
        }
        self.state_transitions.fetch_add(1, Ordering::Relaxed);
        metrics::record_circuit_breaker_state(&self.name, to);

        match to {
            CircuitBreakerState::Open => tracing::warn!(
                name = %self.name,
                from = %from,
                to = "OPEN",
                consecutive_failures = inner.consecutive_failures,
                "Circuit breaker opened"
            ),
            CircuitBreakerState::HalfOpen => tracing::info!(
                name = %self.name,
                from = %from,
                to = "HALF_OPEN",
                "Circuit breaker probing"
            ),
            CircuitBreakerState::Closed => tracing::info!(
                name = %self.name,
                from = %from,
                to = "CLOSED",
                "Circuit breaker closed"
            ),
        }
    }

    /// Force the circuit open (operator action or tests).
    pub fn force_open(&self) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, CircuitBreakerState::Open);
    }

    /// Force the circuit closed (operator action or tests).
    pub fn force_close(&self) {
        let mut inner = self.inner.lock();
        self.transition(&mut inner, CircuitBreakerState::Closed);
    }

    /// Snapshot of counters and state.
    #[must_use]
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut inner = self.inner.lock();
        self.refresh(&mut inner);
        let state = inner.state;
        let consecutive_failures = inner.consecutive_failures;
        let half_open_trial_in_flight = inner.half_open_trial_in_flight;
        let open_for_ms = inner
            .opened_at
            .map(|opened| u64::try_from(opened.elapsed().as_millis()).unwrap_or(u64::MAX));
        drop(inner);

        CircuitBreakerMetrics {
            name: self.name.clone(),
            state,
            consecutive_failures,
            half_open_trial_in_flight,
            open_for_ms,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            state_transitions: self.state_transitions.load(Ordering::Relaxed),
        }
    }
}

/// Admission to make one call through a breaker.
#[derive(Debug)]
#[must_use = "a permit must be settled with the call's result"]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl CallPermit<'_> {
    /// Whether this call is the half-open trial.
    #[must_use]
    pub const fn is_trial(&self) -> bool {
        self.trial
    }

    /// The call succeeded.
    pub fn record_success(mut self) {
        self.settled = true;
        self.breaker.on_success(self.trial);
    }

    /// The call failed in a way that counts against the dependency.
    pub fn record_failure(mut self) {
        self.settled = true;
        self.breaker.on_failure(self.trial);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_release(self.trial);
        }
    }
}

/// Metrics for a circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Dependency name.
    pub name: String,
    /// Current state.
    pub state: CircuitBreakerState,
    /// Current failure streak.
    pub consecutive_failures: u32,
    /// Whether a half-open trial is outstanding.
    pub half_open_trial_in_flight: bool,
    /// Milliseconds since the circuit opened.
    pub open_for_ms: Option<u64>,
    /// Calls admitted.
    pub total_calls: u64,
    /// Admitted calls that failed.
    pub total_failures: u64,
    /// Calls rejected without reaching the network.
    pub rejected_calls: u64,
    /// State transitions so far.
    pub state_transitions: u64,
}
