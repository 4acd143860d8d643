//! Periodic per-workload statistics refresh.

use fleetscope_core::messages::{self, FindWorkloadReply, FindWorkloadRequest};
use fleetscope_core::ports::MessageBus;
use fleetscope_core::{Result, WorkloadState};
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::shutdown_signal;
use crate::store::{RefreshTarget, TopologyStore};

/// Counters from one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub attempted: usize,
    pub refreshed: usize,
    /// No reply, bus error or undecodable reply.
    pub failed: usize,
    /// Reply arrived after the workload left the store.
    pub discarded: usize,
}

/// Background loop that queries fresh stats for every known workload.
pub struct StatsRefresher {
    bus: Arc<dyn MessageBus>,
    store: Arc<TopologyStore>,
    subject: String,
    states: Vec<WorkloadState>,
    interval: Duration,
    request_timeout: Duration,
    concurrency: usize,
}

impl StatsRefresher {
    pub fn new(bus: Arc<dyn MessageBus>, store: Arc<TopologyStore>, config: &SyncConfig) -> Self {
        Self {
            bus,
            store,
            subject: config.subjects.find_workload.clone(),
            states: config.workload_states.clone(),
            interval: config.refresh_interval(),
            request_timeout: config.request_timeout(),
            concurrency: config.refresh_concurrency.max(1),
        }
    }

    /// Run refresh passes every interval until shutdown.
    ///
    /// The first pass starts one interval after the call. A pass in progress
    /// is abandoned when shutdown is signalled.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.interval.as_secs(),
            concurrency = self.concurrency,
            "Starting stats refresher"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_signal(&mut shutdown) => break,
            }

            tokio::select! {
                report = self.refresh_once() => {
                    debug!(
                        attempted = report.attempted,
                        refreshed = report.refreshed,
                        failed = report.failed,
                        discarded = report.discarded,
                        "Stats refresh pass complete"
                    );
                }
                _ = shutdown_signal(&mut shutdown) => break,
            }
        }

        info!("Stats refresher shutting down");
    }

    /// Query stats for every workload currently in the store.
    ///
    /// Failed queries leave the workload untouched; it is retried next pass.
    pub async fn refresh_once(&self) -> RefreshReport {
        let targets = self.store.refresh_targets().await;
        let mut report = RefreshReport {
            attempted: targets.len(),
            ..Default::default()
        };

        let mut replies = stream::iter(targets)
            .map(|target| self.query(target))
            .buffer_unordered(self.concurrency);

        while let Some((target, result)) = replies.next().await {
            match result {
                Ok(reply) => {
                    if self.store.apply_stats(&target, reply).await {
                        report.refreshed += 1;
                    } else {
                        report.discarded += 1;
                    }
                }
                Err(e) => {
                    debug!(
                        agent_id = %target.agent_id,
                        workload = %target.key,
                        error = %e,
                        "Stats query failed"
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn query(&self, target: RefreshTarget) -> (RefreshTarget, Result<FindWorkloadReply>) {
        let result = self.fetch(&target).await;
        (target, result)
    }

    async fn fetch(&self, target: &RefreshTarget) -> Result<FindWorkloadReply> {
        let request = messages::encode(&FindWorkloadRequest {
            workload: target.name.clone(),
            states: self.states.clone(),
            include_stats: true,
            version: target.version.clone(),
        })?;

        let reply = self
            .bus
            .request(&self.subject, request, self.request_timeout)
            .await?;

        messages::decode(&reply)
    }
}
