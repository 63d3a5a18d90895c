//! Message composition and best-effort dispatch.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info};

use keepalive_core::Endpoint;

use crate::mailer::{Mail, Mailer};

/// Digest body when nothing failed since the previous digest.
pub const ALL_SUCCEEDED: &str = "All servers were pinged successfully today.";

/// Immediate alert for one endpoint that exhausted its retries.
pub fn failure_mail(endpoint: &Endpoint, message: &str) -> Mail {
    Mail {
        subject: format!("Ping Service Error: {endpoint}"),
        body: message.to_string(),
    }
}

/// Daily summary of the drained error log.
pub fn digest_mail(date: NaiveDate, entries: &[String]) -> Mail {
    let body = if entries.is_empty() {
        ALL_SUCCEEDED.to_string()
    } else {
        format!("Errors detected:\n\n{}\n\n", entries.join("\n"))
    };
    Mail {
        subject: format!("Daily Ping Report - {}", date.format("%Y-%m-%d")),
        body,
    }
}

/// Sends failure alerts and digests. Never returns an error.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn notify_failure(&self, endpoint: &Endpoint, message: &str) {
        let mail = failure_mail(endpoint, message);
        match self.mailer.send(&mail).await {
            Ok(()) => info!(%endpoint, "error email sent"),
            Err(e) => error!(%endpoint, error = %e, "failed to send error email"),
        }
    }

    /// Send the digest dated with the current local calendar day.
    pub async fn notify_digest(&self, entries: &[String]) {
        self.notify_digest_on(Local::now().date_naive(), entries)
            .await;
    }

    pub async fn notify_digest_on(&self, date: NaiveDate, entries: &[String]) {
        let mail = digest_mail(date, entries);
        match self.mailer.send(&mail).await {
            Ok(()) => info!(%date, errors = entries.len(), "daily report email sent"),
            Err(e) => error!(%date, error = %e, "failed to send daily report email"),
        }
    }
}
