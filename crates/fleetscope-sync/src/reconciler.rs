//! Applies agent advertise and heartbeat events to the topology store.

use chrono::Utc;
use fleetscope_core::messages::{self, AdvertiseMessage, HeartbeatMessage, StatusRequest};
use fleetscope_core::ports::{MessageBus, MessageStream};
use fleetscope_core::{Agent, Error, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::Subjects;
use crate::shutdown_signal;
use crate::store::{HeartbeatOutcome, TopologyStore};

/// What an advertise message did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertiseOutcome {
    /// Known agent; `last_seen` bumped.
    Touched,
    /// Unknown agent; full record fetched and inserted.
    Learned,
    /// Unknown agent whose record appeared while the fetch was in flight.
    AlreadyKnown,
    /// Unknown agent and the status fetch failed; nothing inserted.
    FetchFailed,
    Malformed,
}

/// Handlers for the advertise and heartbeat subscriptions.
#[derive(Clone)]
pub struct EventReconciler {
    bus: Arc<dyn MessageBus>,
    store: Arc<TopologyStore>,
    subjects: Subjects,
    request_timeout: Duration,
}

impl EventReconciler {
    pub fn new(
        bus: Arc<dyn MessageBus>,
        store: Arc<TopologyStore>,
        subjects: Subjects,
        request_timeout: Duration,
    ) -> Self {
        Self {
            bus,
            store,
            subjects,
            request_timeout,
        }
    }

    /// Handle one advertise payload.
    ///
    /// An unknown agent is only inserted once its complete status record has
    /// been fetched; on timeout it stays unknown.
    pub async fn handle_advertise(&self, payload: &[u8]) -> AdvertiseOutcome {
        let advertise = match messages::decode::<AdvertiseMessage>(payload) {
            Ok(msg) if !msg.id.is_empty() => msg,
            Ok(_) => {
                warn!("Dropping advertise without agent id");
                return AdvertiseOutcome::Malformed;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed advertise");
                return AdvertiseOutcome::Malformed;
            }
        };

        if self.store.touch_agent(&advertise.id, Utc::now()).await {
            debug!(agent_id = %advertise.id, "Agent advertised");
            return AdvertiseOutcome::Touched;
        }

        match self.fetch_agent(&advertise.id).await {
            Ok(mut agent) => {
                agent.id = advertise.id.clone();
                agent.last_seen = Utc::now();
                if self.store.insert_agent_if_absent(agent).await {
                    info!(agent_id = %advertise.id, "Discovered agent");
                    AdvertiseOutcome::Learned
                } else {
                    self.store.touch_agent(&advertise.id, Utc::now()).await;
                    AdvertiseOutcome::AlreadyKnown
                }
            }
            Err(e) if e.is_transient() => {
                debug!(agent_id = %advertise.id, error = %e, "Agent status fetch got no reply");
                AdvertiseOutcome::FetchFailed
            }
            Err(e) => {
                warn!(agent_id = %advertise.id, error = %e, "Agent status fetch failed");
                AdvertiseOutcome::FetchFailed
            }
        }
    }

    /// Handle one heartbeat payload. Returns `None` if it could not be decoded.
    pub async fn handle_heartbeat(&self, payload: &[u8]) -> Option<HeartbeatOutcome> {
        let heartbeat = match messages::decode::<HeartbeatMessage>(payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "Dropping malformed heartbeat");
                return None;
            }
        };

        let outcome = self.store.apply_heartbeat(&heartbeat).await;
        match outcome {
            HeartbeatOutcome::Applied {
                added,
                updated,
                removed,
            } => {
                debug!(
                    agent_id = %heartbeat.agent,
                    added,
                    updated,
                    removed,
                    "Heartbeat applied"
                );
            }
            HeartbeatOutcome::UnknownAgent => {
                debug!(agent_id = %heartbeat.agent, "Dropping heartbeat for unknown agent");
            }
        }

        Some(outcome)
    }

    /// Fetch a single agent's full status record.
    pub async fn fetch_agent(&self, id: &str) -> Result<Agent> {
        let request = messages::encode(&StatusRequest { id: id.to_string() })?;
        let reply = self
            .bus
            .request(&self.subjects.status, request, self.request_timeout)
            .await?;
        let agent: Agent = messages::decode(&reply)?;
        if agent.id.is_empty() || agent.id == id {
            Ok(agent)
        } else {
            Err(Error::Serialization(format!(
                "status reply for {} carries id {}",
                id, agent.id
            )))
        }
    }

    /// Subscribe to both event subjects and process them until shutdown.
    pub async fn spawn(&self, shutdown: watch::Receiver<bool>) -> Result<Vec<JoinHandle<()>>> {
        let advertise = self.bus.subscribe(&self.subjects.advertise).await?;
        let heartbeat = self.bus.subscribe(&self.subjects.heartbeat).await?;

        info!(
            advertise = %self.subjects.advertise,
            heartbeat = %self.subjects.heartbeat,
            "Subscribed to agent events"
        );

        Ok(vec![
            tokio::spawn(self.clone().advertise_loop(advertise, shutdown.clone())),
            tokio::spawn(self.clone().heartbeat_loop(heartbeat, shutdown)),
        ])
    }

    // Each advertise gets its own task since an unknown agent costs a round trip.
    async fn advertise_loop(self, mut stream: MessageStream, mut shutdown: watch::Receiver<bool>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                msg = stream.next() => match msg {
                    Some(payload) => {
                        let reconciler = self.clone();
                        in_flight.spawn(async move {
                            reconciler.handle_advertise(&payload).await;
                        });
                    }
                    None => {
                        warn!(subject = %self.subjects.advertise, "Subscription closed");
                        break;
                    }
                },
                _ = shutdown_signal(&mut shutdown) => break,
            }

            while in_flight.try_join_next().is_some() {}
        }

        in_flight.shutdown().await;
        debug!("Advertise handler stopped");
    }

    // Heartbeats are applied inline so reports for one agent land in arrival order.
    async fn heartbeat_loop(self, mut stream: MessageStream, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                msg = stream.next() => match msg {
                    Some(payload) => {
                        self.handle_heartbeat(&payload).await;
                    }
                    None => {
                        warn!(subject = %self.subjects.heartbeat, "Subscription closed");
                        break;
                    }
                },
                _ = shutdown_signal(&mut shutdown) => break,
            }
        }

        debug!("Heartbeat handler stopped");
    }
}
