//! Bootstrap fan-in behavior.

use fleetscope_core::ports::MessageBus;
use fleetscope_sync::{BootstrapReport, BootstrapSynchronizer, TopologyStore};
use fleetscope_tests::bus::encode;
use fleetscope_tests::{AgentFixture, ScriptedBus, init_test_logging};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const STATUS: &str = "agent.status";

fn synchronizer(bus: Arc<ScriptedBus>, store: Arc<TopologyStore>) -> BootstrapSynchronizer {
    let bus: Arc<dyn MessageBus> = bus;
    BootstrapSynchronizer::new(bus, store, STATUS, Duration::from_millis(50))
}

#[tokio::test]
async fn test_bootstrap_inserts_every_reply() {
    init_test_logging();
    let bus = ScriptedBus::new();
    let store = Arc::new(TopologyStore::new());
    bus.fan_in(
        STATUS,
        vec![
            encode(&AgentFixture::with_workloads("a1", &[("web", 0), ("web", 1)])),
            encode(&AgentFixture::bare("a2")),
        ],
    );

    let report = synchronizer(bus.clone(), store.clone()).run().await.unwrap();

    assert_eq!(
        report,
        BootstrapReport {
            received: 2,
            inserted: 2,
            malformed: 0
        }
    );
    assert_eq!(store.agent("a1").await.unwrap().workloads.len(), 2);
    assert!(store.contains_agent("a2").await);
    assert_eq!(bus.requests(STATUS), vec![Vec::<u8>::new()]);
}

#[tokio::test]
async fn test_bootstrap_skips_malformed_replies() {
    let bus = ScriptedBus::new();
    let store = Arc::new(TopologyStore::new());
    bus.fan_in(
        STATUS,
        vec![
            b"not json".to_vec(),
            encode(&AgentFixture::bare("a1")),
            br#"{"ip":"10.0.0.9"}"#.to_vec(),
            br#"{"id":""}"#.to_vec(),
            encode(&AgentFixture::bare("a2")),
        ],
    );

    let report = synchronizer(bus, store.clone()).run().await.unwrap();

    assert_eq!(report.received, 5);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.malformed, 3);
    assert_eq!(store.counts().await.agents, 2);
}

#[tokio::test]
async fn test_bootstrap_later_reply_overwrites_same_id() {
    let bus = ScriptedBus::new();
    let store = Arc::new(TopologyStore::new());
    let mut newer = AgentFixture::with_workloads("a1", &[("api", 0)]);
    newer.used_memory = 2048;
    bus.fan_in(
        STATUS,
        vec![encode(&AgentFixture::bare("a1")), encode(&newer)],
    );

    synchronizer(bus, store.clone()).run().await.unwrap();

    let agent = store.agent("a1").await.unwrap();
    assert_eq!(agent.used_memory, 2048);
    assert_eq!(agent.workloads.len(), 1);
}

#[tokio::test]
async fn test_bootstrap_without_replies_leaves_store_empty() {
    let bus = ScriptedBus::new();
    let store = Arc::new(TopologyStore::new());

    let report = synchronizer(bus, store.clone()).run().await.unwrap();

    assert_eq!(report, BootstrapReport::default());
    assert_eq!(store.counts().await.agents, 0);
}

#[tokio::test]
async fn test_bootstrap_request_failure_is_error() {
    let bus = ScriptedBus::new();
    bus.fail(STATUS);
    let store = Arc::new(TopologyStore::new());

    let result = synchronizer(bus, store.clone()).run().await;

    assert!(result.is_err());
    assert_eq!(store.counts().await.agents, 0);
}
