//! Bounded-retry probe of a single endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use keepalive_core::{Endpoint, ErrorLog, MonitorConfig, ProbeAttempt, ProbeOutcome, ProbeReport};
use keepalive_notify::Notifier;

use crate::checker::HealthClient;

/// Retry policy for one probe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub retry_delay: Duration,
    /// Per-attempt GET timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&MonitorConfig> for RetryPolicy {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
            timeout: config.probe_timeout,
        }
    }
}

impl RetryPolicy {
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Probes endpoints, recording terminal failures and alerting on them.
#[derive(Clone)]
pub struct Prober {
    client: Arc<dyn HealthClient>,
    policy: RetryPolicy,
    error_log: ErrorLog,
    notifier: Notifier,
}

impl Prober {
    pub fn new(
        client: Arc<dyn HealthClient>,
        policy: RetryPolicy,
        error_log: ErrorLog,
        notifier: Notifier,
    ) -> Self {
        Self {
            client,
            policy,
            error_log,
            notifier,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns `true` as soon as one attempt succeeds.
    pub async fn probe(&self, endpoint: &Endpoint) -> bool {
        self.probe_report(endpoint).await.healthy()
    }

    /// Like [`Prober::probe`], also returning every attempt made.
    pub async fn probe_report(&self, endpoint: &Endpoint) -> ProbeReport {
        let total = self.policy.total_attempts();
        let mut attempts = Vec::new();

        for attempt in 1..=total {
            let result = self.client.get(endpoint.url(), self.policy.timeout).await;
            let record = ProbeAttempt {
                endpoint: endpoint.clone(),
                attempt,
                outcome: match &result {
                    Ok(()) => ProbeOutcome::Success,
                    Err(e) => ProbeOutcome::Failed(e.to_string()),
                },
                at: Utc::now(),
            };

            match result {
                Ok(()) => {
                    info!(%endpoint, attempt, "pinged");
                    attempts.push(record);
                    break;
                }
                Err(e) => {
                    warn!(%endpoint, attempt, of = total, error = %e, "ping failed");
                    let description = record.describe_failure();
                    attempts.push(record);

                    if attempt < total {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    } else if let Some(description) = description {
                        self.error_log.append(description.clone()).await;
                        self.notifier.notify_failure(endpoint, &description).await;
                    }
                }
            }
        }

        ProbeReport {
            endpoint: endpoint.clone(),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{ProbeError, ScriptedClient};
    use keepalive_notify::MemoryMailer;
    use tokio::time::Instant;

    const A: &str = "https://a.example/health";
    const B: &str = "https://b.example/health";

    struct Harness {
        prober: Prober,
        client: ScriptedClient,
        log: ErrorLog,
        mailer: MemoryMailer,
    }

    fn harness(client: ScriptedClient) -> Harness {
        let log = ErrorLog::new();
        let mailer = MemoryMailer::new();
        let prober = Prober::new(
            Arc::new(client.clone()),
            RetryPolicy::default(),
            log.clone(),
            Notifier::new(Arc::new(mailer.clone())),
        );
        Harness {
            prober,
            client,
            log,
            mailer,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_records_nothing() {
        let h = harness(ScriptedClient::new().always_ok(A));

        assert!(h.prober.probe(&Endpoint::new(A)).await);
        assert_eq!(h.client.calls_to(A), 1);
        assert!(h.log.is_empty().await);
        assert!(h.mailer.sent().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_failure_records_once_and_alerts_once() {
        let h = harness(ScriptedClient::new().always_fail(B, ProbeError::Status(503)));

        let report = h.prober.probe_report(&Endpoint::new(B)).await;
        assert!(!report.healthy());
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(h.client.calls_to(B), 3);

        let entries = h.log.drain_all().await;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].contains(B));
        assert!(entries[0].contains("(attempt 3)"));
        assert!(entries[0].contains("status code 503"));

        let sent = h.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, format!("Ping Service Error: {B}"));
        assert_eq!(sent[0].body, entries[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn fail_then_succeed_is_full_success() {
        let h = harness(
            ScriptedClient::new()
                .then(A, [Err(ProbeError::Timeout(5000))])
                .always_ok(A),
        );

        let report = h.prober.probe_report(&Endpoint::new(A)).await;
        assert!(report.healthy());
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].attempt, 1);
        assert!(!report.attempts[0].outcome.is_success());
        assert!(h.log.is_empty().await);
        assert!(h.mailer.sent().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_last_attempt_records_nothing() {
        let h = harness(
            ScriptedClient::new()
                .then(
                    A,
                    [Err(ProbeError::Status(500)), Err(ProbeError::Status(500))],
                )
                .always_ok(A),
        );

        assert!(h.prober.probe(&Endpoint::new(A)).await);
        assert_eq!(h.client.calls_to(A), 3);
        assert!(h.log.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_delay_is_linear() {
        let h = harness(ScriptedClient::new().always_fail(B, ProbeError::Status(500)));

        let start = Instant::now();
        h.prober.probe(&Endpoint::new(B)).await;
        // Two pauses of 1s between three attempts, none after the last.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let client = ScriptedClient::new().always_fail(B, ProbeError::Status(500));
        let log = ErrorLog::new();
        let prober = Prober::new(
            Arc::new(client.clone()),
            RetryPolicy {
                max_retries: 0,
                ..RetryPolicy::default()
            },
            log.clone(),
            Notifier::new(Arc::new(MemoryMailer::new())),
        );

        assert!(!prober.probe(&Endpoint::new(B)).await);
        assert_eq!(client.calls_to(B), 1);
        assert_eq!(log.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_alert_still_records_error() {
        let client = ScriptedClient::new().always_fail(B, ProbeError::Status(500));
        let log = ErrorLog::new();
        let prober = Prober::new(
            Arc::new(client),
            RetryPolicy::default(),
            log.clone(),
            Notifier::new(Arc::new(MemoryMailer::failing())),
        );

        assert!(!prober.probe(&Endpoint::new(B)).await);
        assert_eq!(log.len().await, 1);
    }

    #[test]
    fn policy_from_config() {
        let config = MonitorConfig {
            max_retries: 5,
            retry_delay: Duration::from_millis(10),
            probe_timeout: Duration::from_millis(20),
            ..MonitorConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.total_attempts(), 6);
        assert_eq!(policy.retry_delay, Duration::from_millis(10));
        assert_eq!(policy.timeout, Duration::from_millis(20));
    }
}
