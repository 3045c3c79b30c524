//! Immutable record of how one stage resolved.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Stage;

/// How a stage resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageOutcome {
    /// Collaborator answered and the workflow proceeds.
    Success,
    /// Collaborator answered with a well-formed "stop here" decision.
    DomainRejection,
    /// The call could not be completed (breaker open, retries exhausted,
    /// peer rejection or contract violation).
    Failed,
    /// Stage was not attempted.
    Skipped,
}

impl StageOutcome {
    /// Label for logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::DomainRejection => "domain_rejection",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of one stage, as appended to the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage this result belongs to.
    pub stage: Stage,
    /// How the stage resolved.
    pub outcome: StageOutcome,
    /// Payload returned by the collaborator (`null` on failure).
    pub payload: Value,
    /// Error or rejection detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Network attempts made inside the resilience stack.
    pub attempt_count: u32,
    /// When the stage call started.
    pub started_at: DateTime<Utc>,
    /// Wall time spent resolving the stage.
    #[serde(rename = "duration_ms", with = "duration_millis")]
    pub duration: Duration,
}

impl StageResult {
    /// Stage succeeded with a "proceed" decision.
    #[must_use]
    pub fn success(
        stage: Stage,
        payload: Value,
        attempt_count: u32,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Success,
            payload,
            detail: None,
            attempt_count,
            started_at,
            duration,
        }
    }

    /// Stage answered with a "stop" decision.
    #[must_use]
    pub fn rejection(
        stage: Stage,
        payload: Value,
        reason: impl Into<String>,
        attempt_count: u32,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            stage,
            outcome: StageOutcome::DomainRejection,
            payload,
            detail: Some(reason.into()),
            attempt_count,
            started_at,
            duration,
        }
    }

    /// Stage call failed.
    #[must_use]
    pub fn failed(
        stage: Stage,
        detail: impl Into<String>,
        attempt_count: u32,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failed,
            payload: Value::Null,
            detail: Some(detail.into()),
            attempt_count,
            started_at,
            duration,
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
