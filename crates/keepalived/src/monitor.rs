//! Long-running monitor: scheduler loops plus the liveness server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use keepalive_api::{ApiState, build_router};
use keepalive_core::{EmailCredentials, MonitorConfig};
use keepalive_health::ReqwestClient;
use keepalive_notify::{LogMailer, Mailer, Notifier, SmtpMailer};
use keepalive_scheduler::{Scheduler, SweepSchedule};

/// Build the notifier: SMTP when credentials are present, log-only otherwise.
pub fn build_notifier(config: &MonitorConfig) -> anyhow::Result<Notifier> {
    let mailer: Arc<dyn Mailer> = match EmailCredentials::from_env() {
        Some(credentials) => Arc::new(SmtpMailer::new(
            &credentials,
            &config.smtp_relay,
            config.smtp_port,
        )?),
        None => {
            warn!("EMAIL_USER or EMAIL_PASS not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };
    Ok(Notifier::new(mailer))
}

pub async fn run(port: u16, config_path: Option<PathBuf>, sweep_on_start: bool) -> anyhow::Result<()> {
    info!("keepalive monitor starting");

    let config = MonitorConfig::load(config_path.as_deref())?;
    info!(
        endpoints = config.endpoints.len(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "configuration loaded"
    );

    let notifier = build_notifier(&config)?;
    let client = Arc::new(ReqwestClient::new()?);

    let scheduler = Scheduler::from_config(&config, client, notifier);
    let sweep = SweepSchedule {
        run_on_start: sweep_on_start,
        ..scheduler.sweep_schedule()
    };
    let scheduler = Arc::new(scheduler.with_sweep(sweep));

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Scheduler loops ────────────────────────────────────────

    let runner = scheduler.clone();
    let scheduler_handle = tokio::spawn(async move {
        runner.run(shutdown_rx).await;
    });

    // ── Liveness server ────────────────────────────────────────

    let router = build_router(ApiState::new(&config, scheduler.error_log().clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "liveness server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    join_scheduler(scheduler_handle).await;

    info!("keepalive monitor stopped");
    Ok(())
}

/// Wait for the scheduler task, logging a panic or cancellation.
/// Returns whether it exited cleanly.
async fn join_scheduler(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, panicked = e.is_panic(), "scheduler task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_scheduler_clean_exit() {
        let handle = tokio::spawn(async {});
        assert!(join_scheduler(handle).await);
    }

    #[tokio::test]
    async fn join_scheduler_reports_panic() {
        let handle = tokio::spawn(async { panic!("sweep loop blew up"); });
        assert!(!join_scheduler(handle).await);
    }

    #[tokio::test]
    async fn join_scheduler_reports_abort() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        assert!(!join_scheduler(handle).await);
    }
}
