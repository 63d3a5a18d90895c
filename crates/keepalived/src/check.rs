//! One-shot sweep for manual checks and cron jobs.

use std::path::PathBuf;
use std::sync::Arc;

use keepalive_core::MonitorConfig;
use keepalive_health::ReqwestClient;
use keepalive_notify::{LogMailer, Notifier};
use keepalive_scheduler::Scheduler;

use crate::monitor::build_notifier;

pub async fn run(config_path: Option<PathBuf>, notify: bool) -> anyhow::Result<()> {
    let config = MonitorConfig::load(config_path.as_deref())?;
    let notifier = if notify {
        build_notifier(&config)?
    } else {
        Notifier::new(Arc::new(LogMailer))
    };

    let scheduler = Scheduler::from_config(&config, Arc::new(ReqwestClient::new()?), notifier);
    let reports = scheduler.sweep().await;

    for report in &reports {
        let state = if report.healthy() { "UP" } else { "DOWN" };
        println!(
            "{state:<4} {} ({} attempt(s))",
            report.endpoint,
            report.attempts.len()
        );
    }

    let down = reports.iter().filter(|r| !r.healthy()).count();
    if down > 0 {
        anyhow::bail!("{down} of {} endpoint(s) down", reports.len());
    }
    Ok(())
}
