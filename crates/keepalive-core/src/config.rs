//! keepalive.toml configuration and `EMAIL_*` environment lookup.
//!
//! Every key in the file is optional. Missing keys fall back to the
//! built-in defaults, so running without a file monitors the default
//! endpoint list on a five-minute sweep with a 00:00:05 digest.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Endpoint;

pub const DEFAULT_ENDPOINTS: &[&str] = &[
    "https://haven-furnitures.onrender.com/api/health",
    "https://amanicentrecbo-n8x0.onrender.com/api/health",
];

pub const DEFAULT_SMTP_RELAY: &str = "smtp.gmail.com";

/// Resolved monitor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Probed in declaration order.
    pub endpoints: Vec<Endpoint>,
    pub sweep_interval: Duration,
    /// Pause between consecutive endpoints within one sweep.
    pub endpoint_pacing: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Per-attempt GET timeout.
    pub probe_timeout: Duration,
    /// Local wall-clock time of the first digest.
    pub digest_at: NaiveTime,
    pub digest_period: Duration,
    pub smtp_relay: String,
    pub smtp_port: Option<u16>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoints: DEFAULT_ENDPOINTS.iter().map(|u| Endpoint::new(*u)).collect(),
            sweep_interval: Duration::from_secs(5 * 60),
            endpoint_pacing: Duration::from_secs(2),
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            probe_timeout: Duration::from_millis(5000),
            digest_at: NaiveTime::from_hms_opt(0, 0, 5).unwrap_or(NaiveTime::MIN),
            digest_period: Duration::from_secs(24 * 60 * 60),
            smtp_relay: DEFAULT_SMTP_RELAY.to_string(),
            smtp_port: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    endpoints: Option<Vec<String>>,
    sweep: Option<SweepSection>,
    probe: Option<ProbeSection>,
    digest: Option<DigestSection>,
    smtp: Option<SmtpSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SweepSection {
    interval: Option<String>,
    pacing: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProbeSection {
    retries: Option<u32>,
    retry_delay: Option<String>,
    timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DigestSection {
    at: Option<String>,
    period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SmtpSection {
    relay: Option<String>,
    port: Option<u16>,
}

impl MonitorConfig {
    /// Load from an optional TOML file, falling back to defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                        path: path.display().to_string(),
                        source,
                    })?;
                Self::from_toml_str(&content)
            }
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Parse a TOML document and overlay it on the defaults.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(endpoints) = file.endpoints {
            config.endpoints = endpoints.into_iter().map(Endpoint::new).collect();
        }

        let sweep = file.sweep.unwrap_or_default();
        if let Some(v) = sweep.interval {
            config.sweep_interval = duration_field("sweep.interval", v)?;
        }
        if let Some(v) = sweep.pacing {
            config.endpoint_pacing = duration_field("sweep.pacing", v)?;
        }

        let probe = file.probe.unwrap_or_default();
        if let Some(retries) = probe.retries {
            config.max_retries = retries;
        }
        if let Some(v) = probe.retry_delay {
            config.retry_delay = duration_field("probe.retry_delay", v)?;
        }
        if let Some(v) = probe.timeout {
            config.probe_timeout = duration_field("probe.timeout", v)?;
        }

        let digest = file.digest.unwrap_or_default();
        if let Some(at) = digest.at {
            config.digest_at = NaiveTime::parse_from_str(at.trim(), "%H:%M:%S")
                .map_err(|_| ConfigError::InvalidTime(at))?;
        }
        if let Some(v) = digest.period {
            config.digest_period = duration_field("digest.period", v)?;
        }

        let smtp = file.smtp.unwrap_or_default();
        if let Some(relay) = smtp.relay {
            config.smtp_relay = relay;
        }
        config.smtp_port = smtp.port.or(config.smtp_port);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for ep in &self.endpoints {
            let url = ep.url();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidEndpoint(url.to_string()));
            }
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("sweep.interval"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroInterval("probe.timeout"));
        }
        if self.digest_period.is_zero() {
            return Err(ConfigError::ZeroInterval("digest.period"));
        }
        Ok(())
    }
}

fn duration_field(key: &'static str, value: String) -> ConfigResult<Duration> {
    parse_duration(&value).ok_or(ConfigError::InvalidDuration { key, value })
}

/// Parse a duration string like "5s", "500ms", "2m", "24h".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        let m = mins.trim().parse::<u64>().ok()?;
        m.checked_mul(60).map(Duration::from_secs)
    } else if let Some(hours) = s.strip_suffix('h') {
        let h = hours.trim().parse::<u64>().ok()?;
        h.checked_mul(60 * 60).map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// SMTP sender credentials and recipient.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCredentials {
    /// Sender address, also the SMTP username.
    pub user: String,
    pub pass: String,
    /// Recipient; defaults to `user`.
    pub to: String,
}

impl std::fmt::Debug for EmailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailCredentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("to", &self.to)
            .finish()
    }
}

impl EmailCredentials {
    /// Read `EMAIL_USER`, `EMAIL_PASS` and `EMAIL_TO` from the environment.
    ///
    /// Returns `None` when the sender or secret is missing.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EmailCredentials::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let user = non_empty("EMAIL_USER")?;
        let pass = non_empty("EMAIL_PASS")?;
        let to = non_empty("EMAIL_TO").unwrap_or_else(|| user.clone());
        Some(Self { user, pass, to })
    }
}
