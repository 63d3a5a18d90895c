//! Single-attempt HTTP checks.
//!
//! [`HealthClient`] is the transport capability the prober depends on:
//! one GET, bounded by a timeout, that either succeeds (2xx) or fails
//! with a reason.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("timeout of {0}ms exceeded")]
    Timeout(u128),

    #[error("request failed with status code {0}")]
    Status(u16),

    #[error("{0}")]
    Request(String),
}

/// Boxed future returned by [`HealthClient::get`].
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ProbeError>> + Send + 'a>>;

/// Capability to perform one GET with a timeout.
pub trait HealthClient: Send + Sync {
    fn get<'a>(&'a self, url: &'a str, timeout: Duration) -> CheckFuture<'a>;
}

/// reqwest-backed client. Any 2xx response is healthy.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keepalive/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HealthClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str, timeout: Duration) -> CheckFuture<'a> {
        Box::pin(async move {
            let request = self.client.get(url).timeout(timeout).send();
            let resp = match tokio::time::timeout(timeout, request).await {
                Ok(Ok(resp)) => resp,
                Ok(Err(e)) if e.is_timeout() => {
                    debug!(%url, "health probe timed out");
                    return Err(ProbeError::Timeout(timeout.as_millis()));
                }
                Ok(Err(e)) => {
                    debug!(error = %e, %url, "health probe request failed");
                    return Err(ProbeError::Request(e.to_string()));
                }
                Err(_) => {
                    debug!(%url, "health probe timed out");
                    return Err(ProbeError::Timeout(timeout.as_millis()));
                }
            };

            let status = resp.status();
            if status.is_success() {
                Ok(())
            } else {
                debug!(%status, %url, "health probe non-2xx");
                Err(ProbeError::Status(status.as_u16()))
            }
        })
    }
}

type Outcome = Result<(), ProbeError>;

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<String, VecDeque<Outcome>>,
    fallback: HashMap<String, Outcome>,
    calls: Vec<String>,
}

/// In-memory client answering from per-URL scripts.
///
/// Queued outcomes are consumed first; once a URL's queue is empty its
/// fallback answers every further call. URLs with neither fail with a
/// request error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_ok(self, url: &str) -> Self {
        self.with_script(|s| {
            s.fallback.insert(url.to_string(), Ok(()));
        })
    }

    pub fn always_fail(self, url: &str, error: ProbeError) -> Self {
        self.with_script(|s| {
            s.fallback.insert(url.to_string(), Err(error));
        })
    }

    /// Queue outcomes for the next calls to `url`, in order.
    pub fn then(self, url: &str, outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        self.with_script(|s| {
            s.queued
                .entry(url.to_string())
                .or_default()
                .extend(outcomes);
        })
    }

    /// Every URL requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == url).count()
    }

    fn with_script(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.lock());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HealthClient for ScriptedClient {
    fn get<'a>(&'a self, url: &'a str, _timeout: Duration) -> CheckFuture<'a> {
        let outcome = {
            let mut script = self.lock();
            script.calls.push(url.to_string());
            let queued = script.queued.get_mut(url).and_then(VecDeque::pop_front);
            queued
                .or_else(|| script.fallback.get(url).cloned())
                .unwrap_or_else(|| Err(ProbeError::Request(format!("no script for {url}"))))
        };
        Box::pin(async move { outcome })
    }
}
