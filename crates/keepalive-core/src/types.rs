//! Domain types shared by the prober, notifier and scheduler.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A remote health-check target, identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// Outcome of a single GET attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The endpoint answered with a 2xx status.
    Success,
    /// Network error, timeout, or non-2xx status, with a reason.
    Failed(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }
}

/// Record of one attempt within a single probe call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeAttempt {
    pub endpoint: Endpoint,
    /// 1-based attempt number.
    pub attempt: u32,
    pub outcome: ProbeOutcome,
    pub at: DateTime<Utc>,
}

impl ProbeAttempt {
    /// Human-readable failure description, as stored in the error log.
    ///
    /// Returns `None` for successful attempts.
    pub fn describe_failure(&self) -> Option<String> {
        match &self.outcome {
            ProbeOutcome::Success => None,
            ProbeOutcome::Failed(reason) => Some(format!(
                "[{}] Error pinging {} (attempt {}): {}",
                self.at.to_rfc3339_opts(SecondsFormat::Millis, true),
                self.endpoint,
                self.attempt,
                reason
            )),
        }
    }
}

/// Result of one bounded-retry probe call.
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub endpoint: Endpoint,
    pub attempts: Vec<ProbeAttempt>,
}

impl ProbeReport {
    /// True when the last attempt succeeded.
    pub fn healthy(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.outcome.is_success())
    }
}
