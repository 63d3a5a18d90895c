//! keepalive-notify — operator notifications.
//!
//! Two messages exist: an immediate failure alert when an endpoint
//! exhausts its retries, and a daily digest of everything that failed
//! since the previous digest.
//!
//! # Architecture
//!
//! ```text
//! Notifier (composes subject/body, swallows delivery errors)
//!   └── dyn Mailer
//!       ├── SmtpMailer   (lettre, EMAIL_USER / EMAIL_PASS / EMAIL_TO)
//!       ├── LogMailer    (no credentials: writes mail to the log)
//!       └── MemoryMailer (records mail, optionally fails)
//! ```
//!
//! Delivery is best-effort. A failed send is logged and dropped; it is
//! never retried and never reaches the caller.

pub mod error;
pub mod mailer;
pub mod notifier;

pub use error::NotifyError;
pub use mailer::{LogMailer, Mail, Mailer, MemoryMailer, SendFuture, SmtpMailer};
pub use notifier::{ALL_SUCCEEDED, Notifier, digest_mail, failure_mail};
