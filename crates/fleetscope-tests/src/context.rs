//! Test context over a real NATS server.

use crate::containers::NatsContainer;
use fleetscope_nats::NatsBus;

/// A NATS container with two connections: one for the service under test
/// and one playing the agents.
///
/// Drop this to stop the container.
pub struct NatsContext {
    pub nats: NatsContainer,
    pub bus: NatsBus,
    pub agent_bus: NatsBus,
}

impl NatsContext {
    pub async fn new() -> anyhow::Result<Self> {
        crate::init_test_logging();

        let nats = NatsContainer::start().await?;
        let bus = NatsBus::connect(nats.url()).await?;
        let agent_bus = NatsBus::connect(nats.url()).await?;

        Ok(Self {
            nats,
            bus,
            agent_bus,
        })
    }

    pub fn nats_url(&self) -> &str {
        self.nats.url()
    }
}
