//! Mail delivery backends.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;
use tracing::{debug, info};

use keepalive_core::EmailCredentials;

use crate::error::NotifyError;

/// A composed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub subject: String,
    pub body: String,
}

/// Boxed future returned by [`Mailer::send`].
pub type SendFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + Send + 'a>>;

/// Capability to deliver a message to the configured recipient.
pub trait Mailer: Send + Sync {
    fn send<'a>(&'a self, mail: &'a Mail) -> SendFuture<'a>;
}

/// SMTP delivery through an authenticated relay (Gmail by default).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        credentials: &EmailCredentials,
        relay: &str,
        port: Option<u16>,
    ) -> Result<Self, NotifyError> {
        let from: Mailbox = credentials.user.parse()?;
        let to: Mailbox = credentials.to.parse()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)?.credentials(
            Credentials::new(credentials.user.clone(), credentials.pass.clone()),
        );
        if let Some(port) = port {
            builder = builder.port(port);
        }

        debug!(%relay, ?port, to = %credentials.to, "smtp mailer configured");
        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send<'a>(&'a self, mail: &'a Mail) -> SendFuture<'a> {
        Box::pin(async move {
            let message = Message::builder()
                .from(self.from.clone())
                .to(self.to.clone())
                .subject(mail.subject.as_str())
                .header(ContentType::TEXT_PLAIN)
                .body(mail.body.clone())?;
            self.transport.send(message).await?;
            Ok(())
        })
    }
}

/// Writes messages to the log instead of sending them.
///
/// Used when no email credentials are configured, and by one-shot
/// checks that should not mail anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send<'a>(&'a self, mail: &'a Mail) -> SendFuture<'a> {
        Box::pin(async move {
            info!(subject = %mail.subject, body = %mail.body, "mail not sent (log only)");
            Ok(())
        })
    }
}

/// Records every message in memory. Can be switched to fail every send.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<Mail>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails.
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.set_failing(true);
        mailer
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages delivered so far. Failed sends are not recorded.
    pub async fn sent(&self) -> Vec<Mail> {
        self.sent.lock().await.clone()
    }
}

impl Mailer for MemoryMailer {
    fn send<'a>(&'a self, mail: &'a Mail) -> SendFuture<'a> {
        Box::pin(async move {
            if self.failing.load(Ordering::SeqCst) {
                return Err(NotifyError::Delivery("mailer unavailable".to_string()));
            }
            self.sent.lock().await.push(mail.clone());
            Ok(())
        })
    }
}
