//! Sweep and digest drivers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveTime, TimeZone};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use keepalive_core::{Endpoint, ErrorLog, MonitorConfig, ProbeReport};
use keepalive_health::{HealthClient, Prober, RetryPolicy};
use keepalive_notify::Notifier;

use crate::clock::delay_until_next;

/// Timing of the endpoint sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSchedule {
    pub interval: Duration,
    /// Pause between consecutive endpoints.
    pub pacing: Duration,
    /// Sweep once immediately instead of waiting a full interval.
    pub run_on_start: bool,
}

impl Default for SweepSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            pacing: Duration::from_secs(2),
            run_on_start: false,
        }
    }
}

/// Timing of the daily digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestSchedule {
    /// Local wall-clock time of the first dispatch.
    pub at: NaiveTime,
    pub period: Duration,
}

impl Default for DigestSchedule {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(0, 0, 5).unwrap_or(NaiveTime::MIN),
            period: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Drives periodic sweeps and digests over a fixed endpoint list.
pub struct Scheduler {
    endpoints: Vec<Endpoint>,
    prober: Prober,
    error_log: ErrorLog,
    notifier: Notifier,
    sweep: SweepSchedule,
    digest: DigestSchedule,
}

impl Scheduler {
    /// Create a scheduler with default timings. The scheduler owns a
    /// fresh error log and shares it with its prober.
    pub fn new(
        endpoints: Vec<Endpoint>,
        client: Arc<dyn HealthClient>,
        policy: RetryPolicy,
        notifier: Notifier,
    ) -> Self {
        let error_log = ErrorLog::new();
        let prober = Prober::new(client, policy, error_log.clone(), notifier.clone());
        Self {
            endpoints,
            prober,
            error_log,
            notifier,
            sweep: SweepSchedule::default(),
            digest: DigestSchedule::default(),
        }
    }

    pub fn from_config(
        config: &MonitorConfig,
        client: Arc<dyn HealthClient>,
        notifier: Notifier,
    ) -> Self {
        Self::new(
            config.endpoints.clone(),
            client,
            RetryPolicy::from(config),
            notifier,
        )
        .with_sweep(SweepSchedule {
            interval: config.sweep_interval,
            pacing: config.endpoint_pacing,
            run_on_start: false,
        })
        .with_digest(DigestSchedule {
            at: config.digest_at,
            period: config.digest_period,
        })
    }

    pub fn with_sweep(mut self, sweep: SweepSchedule) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn with_digest(mut self, digest: DigestSchedule) -> Self {
        self.digest = digest;
        self
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    pub fn sweep_schedule(&self) -> SweepSchedule {
        self.sweep
    }

    pub fn digest_schedule(&self) -> DigestSchedule {
        self.digest
    }

    /// Probe every endpoint once, in declaration order, pacing between them.
    pub async fn sweep(&self) -> Vec<ProbeReport> {
        let mut reports = Vec::with_capacity(self.endpoints.len());

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.sweep.pacing).await;
            }
            reports.push(self.prober.probe_report(endpoint).await);
        }

        let failed = reports.iter().filter(|r| !r.healthy()).count();
        info!(endpoints = reports.len(), failed, "sweep complete");
        reports
    }

    /// Drain the error log and send it as the digest.
    ///
    /// The log is cleared whether or not the mail goes out.
    pub async fn dispatch_digest(&self) -> usize {
        let entries = self.error_log.drain_all().await;
        debug!(entries = entries.len(), "dispatching daily report");
        self.notifier.notify_digest(&entries).await;
        entries.len()
    }

    /// Run both loops on the current task until shutdown.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        tokio::join!(
            self.run_sweeps(shutdown.clone()),
            self.run_digests(shutdown)
        );
    }

    pub async fn run_sweeps(&self, mut shutdown: watch::Receiver<bool>) {
        let interval = self.sweep.interval;
        let first = if self.sweep.run_on_start {
            Instant::now()
        } else {
            Instant::now() + interval
        };
        let mut ticker = tokio::time::interval_at(first, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = interval.as_secs(),
            endpoints = self.endpoints.len(),
            "sweep loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            tokio::select! {
                _ = self.sweep() => {}
                _ = shutdown.changed() => break,
            }
        }
        info!("sweep loop shutting down");
    }

    /// Time from `now` until the first digest at the configured wall-clock time.
    pub fn first_digest_delay<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Duration {
        delay_until_next(now, self.digest.at)
    }

    pub async fn run_digests(&self, shutdown: watch::Receiver<bool>) {
        let delay = self.first_digest_delay(&Local::now());
        self.run_digests_after(delay, shutdown).await;
    }

    /// Digest loop with an explicit delay before the first dispatch.
    pub async fn run_digests_after(
        &self,
        first_delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            delay_ms = first_delay.as_millis() as u64,
            at = %self.digest.at,
            "daily report scheduled"
        );

        let period = self.digest.period;
        let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.dispatch_digest().await;
                }
                _ = shutdown.changed() => break,
            }
        }
        info!("digest loop shutting down");
    }
}
