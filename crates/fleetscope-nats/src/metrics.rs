//! Metrics for NATS bus observability.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for the NATS message bus.
#[derive(Debug, Default)]
pub struct NatsMetrics {
    /// Total messages published.
    pub messages_published: AtomicU64,
    /// Total messages received on subscriptions and inboxes.
    pub messages_received: AtomicU64,
    /// Total publish failures.
    pub publish_failures: AtomicU64,
    /// Total request/reply calls issued.
    pub requests: AtomicU64,
    /// Requests that ended without a reply.
    pub request_timeouts: AtomicU64,
    /// Current connection state (0 = disconnected, 1 = connected).
    pub connected: AtomicU64,
    /// Total bytes published.
    pub bytes_published: AtomicU64,
    /// Total bytes received.
    pub bytes_received: AtomicU64,
}

impl NatsMetrics {
    /// Create new metrics instance.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a successful publish.
    pub fn record_publish(&self, bytes: u64) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.bytes_published.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a publish failure.
    pub fn record_publish_failure(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a received message.
    pub fn record_receive(&self, bytes: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an outgoing request.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that got no reply.
    pub fn record_request_timeout(&self) {
        self.request_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Set connection state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            request_timeouts: self.request_timeouts.load(Ordering::Relaxed),
            connected: self.connected.load(Ordering::Relaxed) == 1,
            bytes_published: self.bytes_published.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub messages_published: u64,
    pub messages_received: u64,
    pub publish_failures: u64,
    pub requests: u64,
    pub request_timeouts: u64,
    pub connected: bool,
    pub bytes_published: u64,
    pub bytes_received: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = NatsMetrics::new();
        metrics.record_publish(10);
        metrics.record_publish(5);
        metrics.record_receive(7);
        metrics.record_request();
        metrics.record_request();
        metrics.record_request_timeout();
        metrics.set_connected(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_published, 2);
        assert_eq!(snapshot.bytes_published, 15);
        assert_eq!(snapshot.messages_received, 1);
        assert_eq!(snapshot.bytes_received, 7);
        assert_eq!(snapshot.requests, 2);
        assert_eq!(snapshot.request_timeouts, 1);
        assert!(snapshot.connected);
    }
}
