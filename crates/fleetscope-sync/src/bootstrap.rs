//! Initial topology load from a fan-in status request.

use fleetscope_core::Result;
use fleetscope_core::messages;
use fleetscope_core::ports::MessageBus;
use fleetscope_core::Agent;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::store::TopologyStore;

/// Counters from one bootstrap run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub received: usize,
    pub inserted: usize,
    pub malformed: usize,
}

/// Seeds the store from every agent that answers a broadcast status request.
pub struct BootstrapSynchronizer {
    bus: Arc<dyn MessageBus>,
    store: Arc<TopologyStore>,
    subject: String,
    reply_timeout: Duration,
}

impl BootstrapSynchronizer {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        store: Arc<TopologyStore>,
        subject: impl Into<String>,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            bus,
            store,
            subject: subject.into(),
            reply_timeout,
        }
    }

    /// Broadcast the request and drain replies until one reply window passes
    /// in silence.
    ///
    /// Each decoded reply replaces any stored agent with the same id. Replies
    /// that fail to decode are skipped. Only a failure to send the request is
    /// an error.
    pub async fn run(&self) -> Result<BootstrapReport> {
        info!(subject = %self.subject, "Bootstrapping topology");

        let mut replies = self.bus.request_many(&self.subject, Vec::new()).await?;
        let mut report = BootstrapReport::default();

        while let Ok(Some(payload)) = tokio::time::timeout(self.reply_timeout, replies.next()).await
        {
            report.received += 1;

            match messages::decode::<Agent>(&payload) {
                Ok(agent) if !agent.id.is_empty() => {
                    debug!(agent_id = %agent.id, workloads = agent.workloads.len(), "Agent status received");
                    self.store.insert_agent(agent).await;
                    report.inserted += 1;
                }
                Ok(_) => {
                    warn!("Discarding status reply without agent id");
                    report.malformed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Discarding malformed status reply");
                    report.malformed += 1;
                }
            }
        }

        info!(
            received = report.received,
            inserted = report.inserted,
            malformed = report.malformed,
            "Bootstrap complete"
        );

        Ok(report)
    }
}
