//! Topology snapshot handler.

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

/// Serve the current topology as an indented JSON tree.
pub async fn data(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.sync.snapshot().await;

    match serde_json::to_string_pretty(&snapshot) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize snapshot");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
