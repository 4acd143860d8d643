//! Configuration for the NATS connection.

use std::time::Duration;

/// Configuration for the NATS message bus.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs (several for a cluster).
    pub urls: Vec<String>,
    /// Client name reported to the server.
    pub client_name: String,
    /// Maximum reconnection attempts.
    pub max_reconnect_attempts: Option<usize>,
    /// Connection timeout.
    pub connection_timeout: Duration,
    /// Upper bound the client applies to any single request.
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            urls: vec!["nats://127.0.0.1:4222".to_string()],
            client_name: "fleetscope".to_string(),
            max_reconnect_attempts: None, // Unlimited
            connection_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl NatsConfig {
    /// Create a new config with a single URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            ..Default::default()
        }
    }

    /// Build a config from a comma-separated URL list.
    pub fn from_url_list(urls: &str) -> Self {
        Self {
            urls: urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
            ..Default::default()
        }
    }

    /// Set multiple server URLs for cluster support.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Set the client name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Set max reconnection attempts.
    pub fn with_max_reconnects(mut self, max: usize) -> Self {
        self.max_reconnect_attempts = Some(max);
        self
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}
