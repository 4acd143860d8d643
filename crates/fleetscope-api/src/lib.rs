//! HTTP server exposing the Fleetscope topology snapshot.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
