//! Hierarchical snapshot of the topology for the visualization client.
//!
//! The tree is built by copying primitive fields out of the store into owned
//! nodes, so a snapshot stays valid while the store keeps changing.

use chrono::{DateTime, Utc};
use fleetscope_core::{Agent, Stats, Workload};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const ROOT_ID: &str = "root";

/// Textual pattern for timestamps: `YYYY-MM-DD HH:MM:SS ±ZZZZ`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Separator for list-valued properties such as URIs.
pub const LIST_DELIMITER: &str = ",";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Agent,
    Workload,
}

/// One node of the snapshot tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            node_type: NodeType::Root,
            parent: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn child(&self, id: &str) -> Option<&SnapshotNode> {
        self.children.iter().find(|c| c.id == id)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Project the agent map into a root → agents → workloads tree.
///
/// Children are ordered by id so repeated calls over the same topology yield
/// identical output.
pub fn build_snapshot(agents: &HashMap<String, Agent>) -> SnapshotNode {
    let mut root = SnapshotNode::root();

    let mut sorted: Vec<&Agent> = agents.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    root.children = sorted.into_iter().map(agent_node).collect();
    root
}

fn agent_node(agent: &Agent) -> SnapshotNode {
    let mut properties = BTreeMap::new();
    properties.insert("ip".to_string(), agent.ip.clone());
    properties.insert("max_memory".to_string(), agent.max_memory.to_string());
    properties.insert(
        "reserved_memory".to_string(),
        agent.reserved_memory.to_string(),
    );
    properties.insert("used_memory".to_string(), agent.used_memory.to_string());
    properties.insert("last_seen".to_string(), format_timestamp(&agent.last_seen));

    let mut children: Vec<SnapshotNode> = agent
        .workloads
        .iter()
        .map(|w| workload_node(&agent.id, w))
        .collect();
    children.sort_by(|a, b| a.id.cmp(&b.id));

    SnapshotNode {
        id: agent.id.clone(),
        node_type: NodeType::Agent,
        parent: Some(ROOT_ID.to_string()),
        properties,
        children,
    }
}

fn workload_node(agent_id: &str, workload: &Workload) -> SnapshotNode {
    let empty = Stats::default();
    let stats = workload.stats.as_ref().unwrap_or(&empty);

    let properties: BTreeMap<String, String> = [
        ("agent", workload.agent.clone()),
        ("name", workload.name.clone()),
        ("version", workload.version.clone()),
        ("instance", workload.instance.clone()),
        ("index", workload.index.to_string()),
        ("state", workload.state.to_string()),
        (
            "state_timestamp",
            format_state_timestamp(workload.state_timestamp),
        ),
        ("app_name", stats.name.clone()),
        ("uris", stats.uris.join(LIST_DELIMITER)),
        ("host", stats.host.clone()),
        ("port", stats.port.to_string()),
        ("uptime", stats.uptime.to_string()),
        ("mem_quota", stats.mem_quota.to_string()),
        ("disk_quota", stats.disk_quota.to_string()),
        ("fds_quota", stats.fds_quota.to_string()),
        ("time_usage", stats.usage.time.clone()),
        ("cpu_usage", format_cpu_usage(stats.usage.cpu)),
        ("mem_usage", stats.usage.mem.to_string()),
        ("disk_usage", stats.usage.disk.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    SnapshotNode {
        id: workload.key().to_string(),
        node_type: NodeType::Workload,
        parent: Some(agent_id.to_string()),
        properties,
        children: Vec::new(),
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Shortest scientific notation with a signed two-digit exponent,
/// e.g. `1.7145666005e+09`.
pub fn format_state_timestamp(ts: f64) -> String {
    let sci = format!("{:e}", ts);
    match split_exponent(&sci) {
        Some((mantissa, exp)) => with_exponent(mantissa, exp),
        None => sci,
    }
}

/// One significant digit: plain decimal for exponents in `-4..=0`,
/// scientific otherwise (`0.3`, `2`, `1e+02`).
pub fn format_cpu_usage(cpu: f64) -> String {
    let sci = format!("{:.0e}", cpu);
    match split_exponent(&sci) {
        Some((mantissa, exp)) if !(-4..=0).contains(&exp) => with_exponent(mantissa, exp),
        Some((_, exp)) => format!("{:.*}", exp.unsigned_abs() as usize, cpu),
        None => sci,
    }
}

fn split_exponent(sci: &str) -> Option<(&str, i32)> {
    let (mantissa, exp) = sci.split_once('e')?;
    Some((mantissa, exp.parse().ok()?))
}

fn with_exponent(mantissa: &str, exp: i32) -> String {
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
}
