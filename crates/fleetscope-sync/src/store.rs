//! Shared topology store.
//!
//! Every read and write of agent and workload records goes through one of the
//! operations below. Each takes the lock once, does in-memory work only, and
//! releases it before returning, so callers never hold the lock across a bus
//! round trip and never observe a half-applied heartbeat.

use chrono::{DateTime, Utc};
use fleetscope_core::messages::{FindWorkloadReply, HeartbeatMessage};
use fleetscope_core::{Agent, WorkloadKey};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::snapshot::{SnapshotNode, build_snapshot};

/// Result of applying a heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    Applied {
        added: usize,
        updated: usize,
        removed: usize,
    },
    /// The agent is not in the store; nothing was changed.
    UnknownAgent,
}

/// A workload the stats refresher should query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTarget {
    pub agent_id: String,
    pub key: WorkloadKey,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyCounts {
    pub agents: usize,
    pub workloads: usize,
}

/// The single owner of all agent and workload records.
#[derive(Debug, Default)]
pub struct TopologyStore {
    agents: RwLock<HashMap<String, Agent>>,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an agent, replacing any record with the same id.
    pub async fn insert_agent(&self, mut agent: Agent) -> Option<Agent> {
        dedup_workloads(&mut agent);
        self.agents.write().await.insert(agent.id.clone(), agent)
    }

    /// Insert an agent unless one with the same id is already present.
    ///
    /// Returns `false` when an existing record was kept.
    pub async fn insert_agent_if_absent(&self, mut agent: Agent) -> bool {
        dedup_workloads(&mut agent);
        let mut agents = self.agents.write().await;
        if agents.contains_key(&agent.id) {
            return false;
        }
        agents.insert(agent.id.clone(), agent);
        true
    }

    /// Update `last_seen` of a known agent. Returns `false` if the id is unknown.
    pub async fn touch_agent(&self, id: &str, now: DateTime<Utc>) -> bool {
        match self.agents.write().await.get_mut(id) {
            Some(agent) => {
                agent.last_seen = now;
                true
            }
            None => false,
        }
    }

    pub async fn contains_agent(&self, id: &str) -> bool {
        self.agents.read().await.contains_key(id)
    }

    /// Copy of a single agent record.
    pub async fn agent(&self, id: &str) -> Option<Agent> {
        self.agents.read().await.get(id).cloned()
    }

    /// Reconcile an agent's workload set against an authoritative heartbeat.
    ///
    /// Reported workloads are updated in place (state and state timestamp only)
    /// or appended; every previously known workload whose key is not reported
    /// is removed. Repeated keys in one heartbeat collapse to the last entry.
    pub async fn apply_heartbeat(&self, heartbeat: &HeartbeatMessage) -> HeartbeatOutcome {
        let mut agents = self.agents.write().await;
        let Some(agent) = agents.get_mut(&heartbeat.agent) else {
            return HeartbeatOutcome::UnknownAgent;
        };

        let mut positions: HashMap<WorkloadKey, usize> = agent
            .workloads
            .iter()
            .enumerate()
            .map(|(i, w)| (w.key(), i))
            .collect();
        let mut reported: HashSet<WorkloadKey> = HashSet::with_capacity(heartbeat.workloads.len());
        let (mut added, mut updated) = (0, 0);

        for entry in &heartbeat.workloads {
            let key = entry.key();
            match positions.get(&key) {
                Some(&i) => {
                    let workload = &mut agent.workloads[i];
                    workload.state = entry.state.clone();
                    workload.state_timestamp = entry.state_timestamp;
                    if reported.insert(key) {
                        updated += 1;
                    }
                }
                None => {
                    positions.insert(key.clone(), agent.workloads.len());
                    agent.workloads.push(entry.to_workload(&heartbeat.agent));
                    reported.insert(key);
                    added += 1;
                }
            }
        }

        let before = agent.workloads.len();
        agent.workloads.retain(|w| reported.contains(&w.key()));
        let removed = before - agent.workloads.len();

        HeartbeatOutcome::Applied {
            added,
            updated,
            removed,
        }
    }

    /// Every workload currently known, for one stats refresh pass.
    pub async fn refresh_targets(&self) -> Vec<RefreshTarget> {
        let agents = self.agents.read().await;
        agents
            .values()
            .flat_map(|agent| {
                agent.workloads.iter().map(|w| RefreshTarget {
                    agent_id: agent.id.clone(),
                    key: w.key(),
                    name: w.name.clone(),
                    version: w.version.clone(),
                })
            })
            .collect()
    }

    /// Merge a stats reply into the targeted workload.
    ///
    /// Only the owning-agent field and stats are overwritten; lifecycle state
    /// belongs to heartbeats. Returns `false` if the workload is gone.
    pub async fn apply_stats(&self, target: &RefreshTarget, reply: FindWorkloadReply) -> bool {
        let mut agents = self.agents.write().await;
        let Some(workload) = agents
            .get_mut(&target.agent_id)
            .and_then(|agent| agent.workload_mut(&target.key))
        else {
            return false;
        };

        workload.agent = reply.agent;
        workload.stats = Some(reply.stats);
        true
    }

    pub async fn counts(&self) -> TopologyCounts {
        let agents = self.agents.read().await;
        TopologyCounts {
            agents: agents.len(),
            workloads: agents.values().map(|a| a.workloads.len()).sum(),
        }
    }

    /// Run a read-only projection under the read lock.
    pub async fn read<R>(&self, f: impl FnOnce(&HashMap<String, Agent>) -> R) -> R {
        let agents = self.agents.read().await;
        f(&*agents)
    }

    /// Build an independent snapshot tree of the current topology.
    pub async fn snapshot(&self) -> SnapshotNode {
        self.read(build_snapshot).await
    }
}

/// Keep one workload per key, the last one listed, in listed order.
fn dedup_workloads(agent: &mut Agent) {
    let mut seen = HashSet::with_capacity(agent.workloads.len());
    let mut kept: Vec<_> = agent
        .workloads
        .drain(..)
        .rev()
        .filter(|w| seen.insert(w.key()))
        .collect();
    kept.reverse();
    agent.workloads = kept;
}
