//! HTTP surface tests, driven in-process through the router.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fleetscope_api::{AppState, create_router};
use fleetscope_core::WorkloadState;
use fleetscope_nats::NatsMetrics;
use fleetscope_sync::SyncService;
use fleetscope_tests::bus::encode;
use fleetscope_tests::{AgentFixture, MessageFixture, ScriptedBus, fast_sync_config, start_service};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_empty_snapshot() {
    let service = start_service(ScriptedBus::new(), fast_sync_config()).await;
    let app = create_router(Arc::new(AppState::new(service.clone())));

    let (status, body) = get(app, "/data.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "root", "type": "root", "children": []}));
    service.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_is_pretty_json() {
    let service = start_service(ScriptedBus::new(), fast_sync_config()).await;
    let app = create_router(Arc::new(AppState::new(service.clone())));

    let response = app
        .oneshot(Request::get("/data.json").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(response.headers().contains_key("x-request-id"));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8(body.to_vec()).unwrap().contains('\n'));
    service.shutdown().await;
}

#[tokio::test]
async fn test_snapshot_reflects_store() {
    let bus = ScriptedBus::new();
    bus.fan_in(
        "agent.status",
        vec![encode(&AgentFixture::bare("a2")), encode(&AgentFixture::bare("a1"))],
    );
    let service = start_service(bus, fast_sync_config()).await;
    service
        .store()
        .apply_heartbeat(&MessageFixture::heartbeat(
            "a1",
            &[("web", 0, WorkloadState::Running)],
        ))
        .await;
    let app = create_router(Arc::new(AppState::new(service.clone())));

    let (_, body) = get(app, "/data.json").await;

    assert_eq!(body["children"][0]["id"], "a1");
    assert_eq!(body["children"][0]["type"], "agent");
    assert_eq!(body["children"][0]["parent"], "root");
    assert_eq!(body["children"][0]["properties"]["max_memory"], "4096");
    assert_eq!(body["children"][0]["children"][0]["id"], "web-0");
    assert_eq!(
        body["children"][0]["children"][0]["properties"]["state"],
        "RUNNING"
    );
    assert_eq!(body["children"][1]["id"], "a2");
    assert_eq!(body["children"][1]["children"], json!([]));
    service.shutdown().await;
}

#[tokio::test]
async fn test_ready_before_and_after_start() {
    let service = Arc::new(SyncService::new(ScriptedBus::new(), fast_sync_config()));
    let app = create_router(Arc::new(AppState::new(service.clone())));

    let (status, _) = get(app.clone(), "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    service.start().await.unwrap();
    let (status, _) = get(app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    service.shutdown().await;
}

#[tokio::test]
async fn test_health_reports_counts_and_bus() {
    let bus = ScriptedBus::new();
    bus.fan_in(
        "agent.status",
        vec![encode(&AgentFixture::with_workloads("a1", &[("web", 0), ("api", 0)]))],
    );
    let service = start_service(bus, fast_sync_config()).await;
    let metrics = NatsMetrics::new();
    metrics.set_connected(true);
    metrics.record_publish(10);
    metrics.record_request_timeout();
    let state = AppState::new(service.clone()).with_bus_metrics(metrics);
    let app = create_router(Arc::new(state));

    let (status, body) = get(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["ready"], true);
    assert_eq!(body["agents"], 1);
    assert_eq!(body["workloads"], 2);
    assert_eq!(body["bus"]["connected"], true);
    assert_eq!(body["bus"]["messages_published"], 1);
    assert_eq!(body["bus"]["request_timeouts"], 1);
    service.shutdown().await;
}

#[tokio::test]
async fn test_health_unhealthy_when_disconnected() {
    let service = start_service(ScriptedBus::new(), fast_sync_config()).await;
    let state = AppState::new(service.clone()).with_bus_metrics(NatsMetrics::new());
    let app = create_router(Arc::new(state));

    let (_, body) = get(app, "/health").await;

    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["bus"]["connected"], false);
    service.shutdown().await;
}

#[tokio::test]
async fn test_unknown_path_without_static_dir_is_not_found() {
    let service = start_service(ScriptedBus::new(), fast_sync_config()).await;
    let app = create_router(Arc::new(AppState::new(service.clone())));

    let (status, _) = get(app, "/index.html").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    service.shutdown().await;
}
