//! Application state shared across handlers.

use fleetscope_nats::NatsMetrics;
use fleetscope_sync::SyncService;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncService>,
    /// Bus counters reported by `/health`, when running against NATS.
    pub bus_metrics: Option<Arc<NatsMetrics>>,
    /// Directory of visualization assets served for unmatched paths.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(sync: Arc<SyncService>) -> Self {
        Self {
            sync,
            bus_metrics: None,
            static_dir: None,
        }
    }

    pub fn with_bus_metrics(mut self, metrics: Arc<NatsMetrics>) -> Self {
        self.bus_metrics = Some(metrics);
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }
}
