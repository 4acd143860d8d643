//! Synchronization engine configuration.

use fleetscope_core::{Error, Result, WorkloadState};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bus subjects the engine talks on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subjects {
    /// Agent status: broadcast fan-in and point fetch.
    pub status: String,
    pub advertise: String,
    pub heartbeat: String,
    pub find_workload: String,
    /// Published once the engine is up.
    pub ready: String,
}

impl Default for Subjects {
    fn default() -> Self {
        Self {
            status: "agent.status".to_string(),
            advertise: "agent.advertise".to_string(),
            heartbeat: "agent.heartbeat".to_string(),
            find_workload: "agent.find.workload".to_string(),
            ready: "healthmanager.start".to_string(),
        }
    }
}

/// Synchronization engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub subjects: Subjects,
    /// Timeout for point requests (status fetch, stats query).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Bootstrap stops draining once no reply arrives within this window.
    #[serde(default = "default_bootstrap_reply_timeout_ms")]
    pub bootstrap_reply_timeout_ms: u64,
    /// Period between stats refresh passes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Maximum stats requests in flight during a pass.
    #[serde(default = "default_refresh_concurrency")]
    pub refresh_concurrency: usize,
    /// Lifecycle states a stats query asks to match.
    #[serde(default = "default_workload_states")]
    pub workload_states: Vec<WorkloadState>,
}

fn default_request_timeout_ms() -> u64 {
    1000
}

fn default_bootstrap_reply_timeout_ms() -> u64 {
    1000
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_refresh_concurrency() -> usize {
    8
}

fn default_workload_states() -> Vec<WorkloadState> {
    vec![WorkloadState::Starting, WorkloadState::Running]
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            subjects: Subjects::default(),
            request_timeout_ms: default_request_timeout_ms(),
            bootstrap_reply_timeout_ms: default_bootstrap_reply_timeout_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_concurrency: default_refresh_concurrency(),
            workload_states: default_workload_states(),
        }
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bootstrap_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_reply_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Reject values that would stall or spin the engine.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be positive".to_string()));
        }
        if self.bootstrap_reply_timeout_ms == 0 {
            return Err(Error::Config(
                "bootstrap_reply_timeout_ms must be positive".to_string(),
            ));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        if self.refresh_concurrency == 0 {
            return Err(Error::Config(
                "refresh_concurrency must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
