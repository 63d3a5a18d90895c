//! keepalive-health — HTTP health probes with bounded linear retry.
//!
//! # Architecture
//!
//! ```text
//! Prober
//!   ├── dyn HealthClient   (GET with timeout: reqwest, or scripted)
//!   ├── RetryPolicy        (retries, linear delay, per-attempt timeout)
//!   ├── ErrorLog           (append on terminal failure)
//!   └── Notifier           (failure alert on terminal failure)
//! ```
//!
//! A probe makes at most `max_retries + 1` attempts. The first success
//! ends the probe; earlier failed attempts leave no trace beyond the log.
//! Only when the final attempt fails does the endpoint reach the error
//! log and the operator's inbox.

pub mod checker;
pub mod prober;

pub use checker::{CheckFuture, HealthClient, ProbeError, ReqwestClient, ScriptedClient};
pub use prober::{Prober, RetryPolicy};
