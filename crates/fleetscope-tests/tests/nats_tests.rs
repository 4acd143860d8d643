//! End-to-end tests over a real NATS server.
//!
//! Run with: `cargo test -p fleetscope-tests --test nats_tests --features integration`

#![cfg(feature = "integration")]

use fleetscope_core::WorkloadState;
use fleetscope_core::messages::{self, StatusRequest};
use fleetscope_core::ports::MessageBus;
use fleetscope_sync::{SyncConfig, SyncService};
use fleetscope_tests::bus::encode;
use fleetscope_tests::context::NatsContext;
use fleetscope_tests::{AgentFixture, MessageFixture, eventually, fast_sync_config};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// Answer status requests as agent `id` would: broadcasts get the record,
/// point fetches only when addressed to `id`.
async fn serve_agent_status(ctx: &NatsContext, id: &'static str) -> tokio::task::JoinHandle<()> {
    let client = ctx.agent_bus.client().clone();
    let mut requests = client
        .subscribe("agent.status")
        .await
        .expect("Failed to subscribe");
    client.flush().await.expect("Failed to flush");

    tokio::spawn(async move {
        while let Some(msg) = requests.next().await {
            let Some(reply) = msg.reply else { continue };
            let addressed = msg.payload.is_empty()
                || messages::decode::<StatusRequest>(&msg.payload)
                    .map(|r| r.id == id)
                    .unwrap_or(false);
            if addressed {
                let body = encode(&AgentFixture::bare(id));
                let _ = client.publish(reply, body.into()).await;
            }
        }
    })
}

#[tokio::test]
async fn test_service_over_nats() {
    let ctx = NatsContext::new().await.expect("Failed to create context");
    let responder = serve_agent_status(&ctx, "A1").await;

    let mut ready = ctx
        .agent_bus
        .subscribe("healthmanager.start")
        .await
        .expect("Failed to subscribe");
    ctx.agent_bus.client().flush().await.expect("Failed to flush");

    let bus: Arc<dyn MessageBus> = Arc::new(ctx.bus.clone());
    let config = SyncConfig {
        bootstrap_reply_timeout_ms: 500,
        request_timeout_ms: 500,
        ..fast_sync_config()
    };
    let service = SyncService::new(bus, config);
    service.start().await.expect("Failed to start");

    tokio::time::timeout(Duration::from_secs(5), ready.next())
        .await
        .expect("readiness announced")
        .expect("stream open");
    assert!(service.store().contains_agent("A1").await);

    ctx.agent_bus
        .publish(
            "agent.heartbeat",
            encode(&MessageFixture::heartbeat(
                "A1",
                &[("web", 0, WorkloadState::Running)],
            )),
        )
        .await
        .expect("Failed to publish");

    let service_ref = &service;
    assert!(
        eventually(Duration::from_secs(5), move || async move {
            service_ref.counts().await.workloads == 1
        })
        .await
    );

    let snapshot = service.snapshot().await;
    let web = snapshot.child("A1").and_then(|a| a.child("web-0")).expect("web-0 present");
    assert_eq!(web.property("state"), Some("RUNNING"));

    service.shutdown().await;
    responder.abort();
    ctx.bus.shutdown().await.expect("Failed to drain");
}
