//! keepalive-api — the monitor's own HTTP surface.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Liveness of the monitor process itself |
//! | GET | `/status` | Endpoints, pending error count, schedule |

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use chrono::NaiveTime;

use keepalive_core::{Endpoint, ErrorLog, MonitorConfig};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub error_log: ErrorLog,
    pub endpoints: Arc<[Endpoint]>,
    pub sweep_interval: Duration,
    pub digest_at: NaiveTime,
}

impl ApiState {
    pub fn new(config: &MonitorConfig, error_log: ErrorLog) -> Self {
        Self {
            error_log,
            endpoints: config.endpoints.clone().into(),
            sweep_interval: config.sweep_interval,
            digest_at: config.digest_at,
        }
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness))
        .route("/status", get(handlers::status))
        .with_state(state)
}
