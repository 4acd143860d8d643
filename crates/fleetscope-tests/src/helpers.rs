//! Test helper functions and utilities.

use fleetscope_core::ports::MessageBus;
use fleetscope_sync::{SyncConfig, SyncService};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Config with short timeouts so tests do not wait on silent subjects.
pub fn fast_sync_config() -> SyncConfig {
    SyncConfig {
        request_timeout_ms: 50,
        bootstrap_reply_timeout_ms: 50,
        refresh_interval_secs: 3600,
        ..Default::default()
    }
}

/// A started sync service over `bus`.
pub async fn start_service(bus: Arc<dyn MessageBus>, config: SyncConfig) -> Arc<SyncService> {
    let service = Arc::new(SyncService::new(bus, config));
    service.start().await.expect("sync service starts");
    service
}

/// Poll `check` until it returns true or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
