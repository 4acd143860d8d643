//! Route definitions.

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, snapshot};
use crate::middleware::{cors_layer, request_id};
use crate::state::AppState;

/// Create the server router.
///
/// When a static directory is configured it answers every path not matched
/// by an API route, with `/` resolving to `index.html`.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();

    let mut router = Router::new()
        .route("/data.json", get(snapshot::data))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    router
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
