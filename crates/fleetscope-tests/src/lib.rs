//! Test infrastructure for Fleetscope.
//!
//! [`ScriptedBus`] stands in for NATS in behavior tests: it routes published
//! messages to subscribers and answers requests from scripted responders.
//! Real-NATS tests start a container through [`context::NatsContext`] and are
//! gated behind the `integration` feature.
//!
//! # Usage
//!
//! ```ignore
//! use fleetscope_tests::{ScriptedBus, fixtures::AgentFixture};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let bus = ScriptedBus::new();
//!     bus.fan_in("agent.status", vec![encode(&AgentFixture::bare("a1"))]);
//!     // Build a SyncService over `bus` and drive it.
//! }
//! ```

pub mod bus;
pub mod containers;
pub mod context;
pub mod fixtures;
pub mod helpers;

pub use bus::ScriptedBus;
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,fleetscope_sync=debug")),
        )
        .with_test_writer()
        .try_init();
}
