//! Wires bootstrap, event reconciliation and stats refresh together.

use fleetscope_core::ports::MessageBus;
use fleetscope_core::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bootstrap::BootstrapSynchronizer;
use crate::config::SyncConfig;
use crate::reconciler::EventReconciler;
use crate::refresher::StatsRefresher;
use crate::snapshot::SnapshotNode;
use crate::store::{TopologyCounts, TopologyStore};

/// The synchronization engine with a start/stop lifecycle.
pub struct SyncService {
    bus: Arc<dyn MessageBus>,
    store: Arc<TopologyStore>,
    config: SyncConfig,
    started: AtomicBool,
    ready: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncService {
    pub fn new(bus: Arc<dyn MessageBus>, config: SyncConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            bus,
            store: Arc::new(TopologyStore::new()),
            config,
            started: AtomicBool::new(false),
            ready: AtomicBool::new(false),
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.store
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Whether bootstrap has finished and the event handlers are running.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Bootstrap the store, start the event handlers and the stats refresher,
    /// then announce readiness on the bus.
    ///
    /// A failed bootstrap request leaves the store empty; agents are then
    /// learned from advertise events. Failing to subscribe is an error.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::Internal("Sync service already started".to_string()));
        }
        self.config.validate()?;

        let bootstrap = BootstrapSynchronizer::new(
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
            self.config.subjects.status.clone(),
            self.config.bootstrap_reply_timeout(),
        );
        if let Err(e) = bootstrap.run().await {
            warn!(error = %e, "Bootstrap request failed; starting with an empty topology");
        }

        let reconciler = EventReconciler::new(
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
            self.config.subjects.clone(),
            self.config.request_timeout(),
        );
        let mut handles = reconciler.spawn(self.shutdown_tx.subscribe()).await?;

        let refresher = StatsRefresher::new(
            Arc::clone(&self.bus),
            Arc::clone(&self.store),
            &self.config,
        );
        let shutdown_rx = self.shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            refresher.run(shutdown_rx).await;
        }));

        self.tasks.lock().await.extend(handles);

        if let Err(e) = self.bus.publish(&self.config.subjects.ready, Vec::new()).await {
            warn!(subject = %self.config.subjects.ready, error = %e, "Failed to announce readiness");
        }

        self.ready.store(true, Ordering::SeqCst);
        let counts = self.store.counts().await;
        info!(
            agents = counts.agents,
            workloads = counts.workloads,
            "Sync service started"
        );

        Ok(())
    }

    /// Build a snapshot of the current topology.
    pub async fn snapshot(&self) -> SnapshotNode {
        self.store.snapshot().await
    }

    pub async fn counts(&self) -> TopologyCounts {
        self.store.counts().await
    }

    /// Signal every background task to stop and wait for them to finish.
    pub async fn shutdown(&self) {
        info!("Stopping sync service");
        self.shutdown_tx.send_replace(true);
        self.ready.store(false, Ordering::SeqCst);

        let handles: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Sync task ended abnormally");
            }
        }

        info!("Sync service stopped");
    }
}
