//! Health and readiness handlers.

use axum::{Json, extract::State, http::StatusCode};
use fleetscope_nats::HealthCheck;
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub ready: bool,
    pub agents: usize,
    pub workloads: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus: Option<BusHealth>,
}

#[derive(Serialize)]
pub struct BusHealth {
    pub status: String,
    pub connected: bool,
    pub messages_published: u64,
    pub messages_received: u64,
    pub request_timeouts: u64,
}

impl From<HealthCheck> for BusHealth {
    fn from(check: HealthCheck) -> Self {
        Self {
            status: check.status.label().to_string(),
            connected: check.connected,
            messages_published: check.messages_published,
            messages_received: check.messages_received,
            request_timeouts: check.request_timeouts,
        }
    }
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let counts = state.sync.counts().await;

    let bus = state.bus_metrics.as_ref().map(|metrics| {
        let connected = metrics.snapshot().connected;
        BusHealth::from(HealthCheck::from_metrics(metrics, connected))
    });
    let status = bus
        .as_ref()
        .map(|b| b.status.clone())
        .unwrap_or_else(|| "healthy".to_string());

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        ready: state.sync.is_ready(),
        agents: counts.agents,
        workloads: counts.workloads,
        bus,
    })
}

/// 200 once the initial topology load has finished, 503 before.
pub async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.sync.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
