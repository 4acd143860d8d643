//! Fixtures for agents, workloads and agent messages.

use chrono::Utc;
use fleetscope_core::messages::{
    AdvertiseMessage, FindWorkloadReply, HeartbeatMessage, HeartbeatWorkload,
};
use fleetscope_core::{Agent, Stats, Usage, Workload, WorkloadState};

/// Factory for agent status records.
pub struct AgentFixture;

impl AgentFixture {
    /// An agent with resources but no workloads.
    pub fn bare(id: &str) -> Agent {
        Agent {
            id: id.to_string(),
            ip: "10.0.0.1".to_string(),
            max_memory: 4096,
            reserved_memory: 1024,
            used_memory: 512,
            workloads: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    /// An agent running the given `(name, index)` workloads.
    pub fn with_workloads(id: &str, workloads: &[(&str, u32)]) -> Agent {
        let mut agent = Self::bare(id);
        agent.workloads = workloads
            .iter()
            .map(|(name, index)| WorkloadFixture::running(id, name, *index))
            .collect();
        agent
    }
}

/// Factory for workload records.
pub struct WorkloadFixture;

impl WorkloadFixture {
    pub fn running(agent: &str, name: &str, index: u32) -> Workload {
        Workload {
            agent: agent.to_string(),
            name: name.to_string(),
            version: "v1".to_string(),
            instance: format!("{}-{}-inst", name, index),
            index,
            state: WorkloadState::Running,
            state_timestamp: 1714566600.0,
            stats: None,
        }
    }
}

/// Factory for agent event messages.
pub struct MessageFixture;

impl MessageFixture {
    pub fn advertise(id: &str) -> AdvertiseMessage {
        AdvertiseMessage {
            id: id.to_string(),
            stacks: vec!["base".to_string()],
            available_memory: 2048,
            available_disk: 8192,
        }
    }

    /// A heartbeat reporting `(name, index, state)` workloads.
    pub fn heartbeat(agent: &str, workloads: &[(&str, u32, WorkloadState)]) -> HeartbeatMessage {
        HeartbeatMessage {
            agent: agent.to_string(),
            workloads: workloads
                .iter()
                .map(|(name, index, state)| Self::heartbeat_workload(name, *index, state.clone()))
                .collect(),
        }
    }

    pub fn heartbeat_workload(name: &str, index: u32, state: WorkloadState) -> HeartbeatWorkload {
        HeartbeatWorkload {
            name: name.to_string(),
            version: "v1".to_string(),
            instance: format!("{}-{}-inst", name, index),
            index,
            state,
            state_timestamp: 1714566700.0,
        }
    }

    /// A find-workload reply carrying [`StatsFixture::sample`] stats.
    pub fn find_reply(agent: &str, name: &str, index: u32) -> FindWorkloadReply {
        FindWorkloadReply {
            agent: agent.to_string(),
            name: name.to_string(),
            version: "v1".to_string(),
            instance: format!("{}-{}-inst", name, index),
            index,
            state: WorkloadState::Running,
            state_timestamp: 1714566800.0,
            stats: StatsFixture::sample(name),
        }
    }
}

/// Factory for workload resource stats.
pub struct StatsFixture;

impl StatsFixture {
    pub fn sample(name: &str) -> Stats {
        Stats {
            name: name.to_string(),
            uris: vec![format!("{}.example.com", name)],
            host: "10.0.0.1".to_string(),
            port: 61000,
            uptime: 120,
            mem_quota: 268435456,
            disk_quota: 1073741824,
            fds_quota: 1024,
            usage: Usage {
                time: "2024-05-01 12:30:00 +0000".to_string(),
                cpu: 1.5,
                mem: 65536,
                disk: 131072,
            },
        }
    }
}
