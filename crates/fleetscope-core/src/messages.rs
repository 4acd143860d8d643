//! Wire schemas for every message exchanged on the bus.
//!
//! Identity fields are required; everything else falls back to its default
//! when absent so that partial payloads still decode.

use crate::topology::{Stats, Workload, WorkloadKey, WorkloadState};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Point fetch of a single agent's full status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub id: String,
}

/// Lightweight discovery announcement from an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvertiseMessage {
    pub id: String,
    #[serde(default)]
    pub stacks: Vec<String>,
    #[serde(default)]
    pub available_memory: u64,
    #[serde(default)]
    pub available_disk: u64,
}

/// Authoritative report of an agent's complete workload set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub agent: String,
    #[serde(default)]
    pub workloads: Vec<HeartbeatWorkload>,
}

/// One workload entry inside a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatWorkload {
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
}

impl HeartbeatWorkload {
    pub fn key(&self) -> WorkloadKey {
        WorkloadKey::new(&self.name, self.index)
    }

    /// Materialize a new workload record owned by `agent_id`.
    pub fn to_workload(&self, agent_id: &str) -> Workload {
        Workload {
            agent: agent_id.to_string(),
            name: self.name.clone(),
            version: self.version.clone(),
            instance: self.instance.clone(),
            index: self.index,
            state: self.state.clone(),
            state_timestamp: self.state_timestamp,
            stats: None,
        }
    }
}

/// Query for a workload's current placement and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindWorkloadRequest {
    pub workload: String,
    pub states: Vec<WorkloadState>,
    pub include_stats: bool,
    pub version: String,
}

/// Reply to a [`FindWorkloadRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindWorkloadReply {
    pub agent: String,
    #[serde(default)]
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
    pub stats: Stats,
}

/// Decode a JSON payload into a message schema.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encode a message schema as a JSON payload.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_defaults() {
        let msg: HeartbeatMessage = decode(br#"{"agent":"a1"}"#).unwrap();
        assert_eq!(msg.agent, "a1");
        assert!(msg.workloads.is_empty());
    }

    #[test]
    fn test_heartbeat_requires_agent() {
        assert!(decode::<HeartbeatMessage>(br#"{"workloads":[]}"#).is_err());
    }

    #[test]
    fn test_heartbeat_workload_to_workload() {
        let hb: HeartbeatWorkload =
            decode(br#"{"name":"web","index":2,"state":"RUNNING","state_timestamp":1.5}"#)
                .unwrap();
        let workload = hb.to_workload("a1");
        assert_eq!(workload.key().as_str(), "web-2");
        assert_eq!(workload.agent, "a1");
        assert_eq!(workload.state, WorkloadState::Running);
        assert!(workload.stats.is_none());
    }

    #[test]
    fn test_find_request_wire_shape() {
        let req = FindWorkloadRequest {
            workload: "web".to_string(),
            states: vec![WorkloadState::Starting, WorkloadState::Running],
            include_stats: true,
            version: "v3".to_string(),
        };
        let value: serde_json::Value = serde_json::from_slice(&encode(&req).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "workload": "web",
                "states": ["STARTING", "RUNNING"],
                "include_stats": true,
                "version": "v3",
            })
        );
    }
}
