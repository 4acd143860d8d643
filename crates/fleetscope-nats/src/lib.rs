//! NATS message bus adapter for Fleetscope.

mod bus;
pub mod config;
pub mod health;
pub mod metrics;

pub use bus::NatsBus;
pub use config::NatsConfig;
pub use health::{HealthCheck, HealthStatus};
pub use metrics::{MetricsSnapshot, NatsMetrics};
