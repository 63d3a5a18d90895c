//! Route handlers.

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;

use keepalive_core::Endpoint;

use crate::ApiState;

pub const LIVENESS_STATUS: &str = "Ping service running 🚀";

/// GET /
pub async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": LIVENESS_STATUS }))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub endpoints: Vec<Endpoint>,
    /// Terminal failures waiting for the next digest.
    pub pending_errors: usize,
    pub sweep_interval_secs: u64,
    pub digest_at: String,
}

/// GET /status
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(StatusResponse {
        endpoints: state.endpoints.to_vec(),
        pending_errors: state.error_log.len().await,
        sweep_interval_secs: state.sweep_interval.as_secs(),
        digest_at: state.digest_at.format("%H:%M:%S").to_string(),
    })
}
