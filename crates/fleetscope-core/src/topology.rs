//! Topology entities: agents and the workloads they host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A worker node hosting zero or more workloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Empty when a status reply omits it; callers fill it from context.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub max_memory: u64,
    #[serde(default)]
    pub reserved_memory: u64,
    #[serde(default)]
    pub used_memory: u64,
    #[serde(default)]
    pub workloads: Vec<Workload>,
    #[serde(default = "Utc::now")]
    pub last_seen: DateTime<Utc>,
}

impl Agent {
    /// Create an agent with no capacity information and no workloads.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ip: String::new(),
            max_memory: 0,
            reserved_memory: 0,
            used_memory: 0,
            workloads: Vec::new(),
            last_seen: Utc::now(),
        }
    }

    /// Look up a hosted workload by its composite key.
    pub fn workload(&self, key: &WorkloadKey) -> Option<&Workload> {
        self.workloads.iter().find(|w| w.key() == *key)
    }

    pub fn workload_mut(&mut self, key: &WorkloadKey) -> Option<&mut Workload> {
        self.workloads.iter_mut().find(|w| w.key() == *key)
    }
}

/// Composite identity of a workload: `"<name>-<index>"`.
///
/// Always derived from the name and instance index, never read off the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadKey(String);

impl WorkloadKey {
    pub fn new(name: &str, index: u32) -> Self {
        Self(format!("{}-{}", name, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single running instance of a deployed application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    /// Owning agent id as last reported by the stats source.
    #[serde(default)]
    pub agent: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub state: WorkloadState,
    #[serde(default)]
    pub state_timestamp: f64,
    #[serde(default)]
    pub stats: Option<Stats>,
}

impl Workload {
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(&self.name, self.index)
    }
}

/// Lifecycle state reported by an agent.
///
/// States outside the known set are kept verbatim in [`WorkloadState::Other`].
/// A missing state decodes as `Other("")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkloadState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Crashed,
    Deleted,
    Other(String),
}

impl WorkloadState {
    pub fn as_str(&self) -> &str {
        match self {
            WorkloadState::Starting => "STARTING",
            WorkloadState::Running => "RUNNING",
            WorkloadState::Stopping => "STOPPING",
            WorkloadState::Stopped => "STOPPED",
            WorkloadState::Crashed => "CRASHED",
            WorkloadState::Deleted => "DELETED",
            WorkloadState::Other(s) => s,
        }
    }
}

impl Default for WorkloadState {
    fn default() -> Self {
        WorkloadState::Other(String::new())
    }
}

impl From<String> for WorkloadState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STARTING" => WorkloadState::Starting,
            "RUNNING" => WorkloadState::Running,
            "STOPPING" => WorkloadState::Stopping,
            "STOPPED" => WorkloadState::Stopped,
            "CRASHED" => WorkloadState::Crashed,
            "DELETED" => WorkloadState::Deleted,
            _ => WorkloadState::Other(s),
        }
    }
}

impl From<WorkloadState> for String {
    fn from(state: WorkloadState) -> Self {
        match state {
            WorkloadState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort runtime statistics for a workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub name: String,
    pub uris: Vec<String>,
    pub host: String,
    pub port: u16,
    pub uptime: u64,
    pub mem_quota: u64,
    pub disk_quota: u64,
    pub fds_quota: u64,
    pub usage: Usage,
}

/// A single resource usage sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub time: String,
    pub cpu: f64,
    pub mem: u64,
    pub disk: u64,
}
