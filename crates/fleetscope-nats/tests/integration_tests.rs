//! Integration tests for fleetscope-nats.
//!
//! These tests start a NATS container through testcontainers.
//! Run with: `cargo test -p fleetscope-nats --features integration`

#![cfg(feature = "integration")]

use fleetscope_core::Error;
use fleetscope_core::ports::MessageBus;
use fleetscope_nats::NatsBus;
use futures::StreamExt;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::nats::Nats;

async fn start_nats() -> (ContainerAsync<Nats>, String) {
    let container = Nats::default()
        .with_tag("2.10-alpine")
        .start()
        .await
        .expect("start nats");
    let host = container.get_host().await.expect("host");
    let port = container.get_host_port_ipv4(4222).await.expect("port");
    (container, format!("nats://{}:{}", host, port))
}

#[tokio::test]
async fn test_publish_and_subscribe() {
    let (_container, url) = start_nats().await;
    let bus = NatsBus::connect(&url).await.expect("connect");

    let mut stream = bus.subscribe("agent.advertise").await.expect("subscribe");
    bus.client().flush().await.expect("flush");

    bus.publish("agent.advertise", br#"{"id":"a1"}"#.to_vec())
        .await
        .expect("publish");

    let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timeout")
        .expect("message");
    assert_eq!(received, br#"{"id":"a1"}"#.to_vec());

    let snapshot = bus.metrics().snapshot();
    assert_eq!(snapshot.messages_published, 1);
    assert!(snapshot.messages_received >= 1);
}

#[tokio::test]
async fn test_request_without_responders() {
    let (_container, url) = start_nats().await;
    let bus = NatsBus::connect(&url).await.expect("connect");

    let err = bus
        .request("agent.find.workload", b"{}".to_vec(), Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert!(matches!(
        err,
        Error::Timeout { .. } | Error::NoResponders { .. }
    ));
    assert_eq!(bus.metrics().snapshot().request_timeouts, 1);
}

#[tokio::test]
async fn test_request_many_collects_replies() {
    let (_container, url) = start_nats().await;
    let bus = NatsBus::connect(&url).await.expect("connect");

    for id in ["a1", "a2"] {
        let client = bus.client().clone();
        let mut requests = client.subscribe("agent.status").await.expect("subscribe");
        tokio::spawn(async move {
            while let Some(msg) = requests.next().await {
                if let Some(reply) = msg.reply {
                    let body = format!(r#"{{"id":"{}"}}"#, id);
                    let _ = client.publish(reply, body.into_bytes().into()).await;
                }
            }
        });
    }
    bus.client().flush().await.expect("flush");

    let mut replies = bus
        .request_many("agent.status", Vec::new())
        .await
        .expect("request");

    let mut received = Vec::new();
    while let Ok(Some(reply)) =
        tokio::time::timeout(Duration::from_millis(500), replies.next()).await
    {
        received.push(String::from_utf8(reply).expect("utf8"));
    }
    received.sort();

    assert_eq!(received, vec![r#"{"id":"a1"}"#, r#"{"id":"a2"}"#]);
}

#[tokio::test]
async fn test_health_and_shutdown() {
    let (_container, url) = start_nats().await;
    let bus = NatsBus::connect(&url).await.expect("connect");

    let health = bus.health_check();
    assert!(health.status.is_healthy());
    assert!(health.connected);

    bus.shutdown().await.expect("shutdown");
    assert!(!bus.metrics().snapshot().connected);
}
