//! Topology synchronization engine for Fleetscope.
//!
//! Bootstraps the fleet topology from a fan-in status request, keeps it current
//! from advertise and heartbeat events, periodically refreshes per-workload
//! statistics and projects the result into immutable snapshot trees.

use tokio::sync::watch;

pub mod bootstrap;
pub mod config;
pub mod reconciler;
pub mod refresher;
pub mod service;
pub mod snapshot;
pub mod store;

pub use bootstrap::{BootstrapReport, BootstrapSynchronizer};
pub use config::{Subjects, SyncConfig};
pub use reconciler::{AdvertiseOutcome, EventReconciler};
pub use refresher::{RefreshReport, StatsRefresher};
pub use service::SyncService;
pub use snapshot::{NodeType, SnapshotNode, build_snapshot};
pub use store::{HeartbeatOutcome, RefreshTarget, TopologyCounts, TopologyStore};

/// Resolves once shutdown has been signalled or the sender is gone.
pub(crate) async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
