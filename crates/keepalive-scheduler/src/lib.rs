//! keepalive-scheduler — the two periodic drivers of the monitor.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (owns the ErrorLog)
//!   ├── sweep loop:  every 5m, probe endpoints in order, 2s apart
//!   │     └── Prober ──► ErrorLog + Notifier on terminal failure
//!   └── digest loop: next 00:00:05 local, then every 24h
//!         └── ErrorLog::drain_all ──► Notifier::notify_digest
//! ```
//!
//! Both loops are joined on one task, so only one of them makes
//! progress at a time. A sweep is awaited to completion before the next
//! tick is taken and missed ticks are skipped, so sweeps never overlap.

pub mod clock;
pub mod scheduler;

pub use clock::delay_until_next;
pub use scheduler::{DigestSchedule, Scheduler, SweepSchedule};
