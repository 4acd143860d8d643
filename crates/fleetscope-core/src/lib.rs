//! Fleetscope Core
//!
//! Topology entities, wire message schemas, the message bus port and error
//! handling shared by every other Fleetscope crate.

pub mod error;
pub mod messages;
pub mod ports;
pub mod topology;

pub use error::{Error, Result};
pub use topology::{Agent, Stats, Usage, Workload, WorkloadKey, WorkloadState};
