//! Core NATS implementation of the message bus port.

use async_nats::client::RequestErrorKind;
use async_trait::async_trait;
use fleetscope_core::ports::{MessageBus, MessageStream};
use fleetscope_core::{Error, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::NatsConfig;
use crate::health::HealthCheck;
use crate::metrics::NatsMetrics;

/// Message bus backed by a plain (non-JetStream) NATS connection.
#[derive(Clone)]
pub struct NatsBus {
    client: async_nats::Client,
    config: NatsConfig,
    metrics: Arc<NatsMetrics>,
}

impl NatsBus {
    /// Connect to a single NATS server with default settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(NatsConfig::new(url)).await
    }

    /// Connect with custom configuration.
    pub async fn connect_with_config(config: NatsConfig) -> Result<Self> {
        if config.urls.is_empty() {
            return Err(Error::Config("No NATS server URL configured".to_string()));
        }

        let urls = config.urls.join(",");
        info!(urls = %urls, "Connecting to NATS");

        let metrics = NatsMetrics::new();
        let event_metrics = metrics.clone();

        let mut options = async_nats::ConnectOptions::new()
            .name(&config.client_name)
            .connection_timeout(config.connection_timeout)
            .request_timeout(Some(config.request_timeout))
            .event_callback(move |event| {
                let metrics = event_metrics.clone();
                async move {
                    match event {
                        async_nats::Event::Connected => {
                            info!("NATS connection established");
                            metrics.set_connected(true);
                        }
                        async_nats::Event::Disconnected => {
                            warn!("NATS connection lost");
                            metrics.set_connected(false);
                        }
                        other => debug!(event = ?other, "NATS client event"),
                    }
                }
            });

        if let Some(max) = config.max_reconnect_attempts {
            options = options.max_reconnects(max);
        }

        let client = options
            .connect(urls.as_str())
            .await
            .map_err(|e| Error::Bus(format!("Failed to connect to NATS: {}", e)))?;

        metrics.set_connected(true);
        info!("Connected to NATS");

        Ok(Self {
            client,
            config,
            metrics,
        })
    }

    /// Get the underlying NATS client.
    pub fn client(&self) -> &async_nats::Client {
        &self.client
    }

    /// Get the configuration this bus was connected with.
    pub fn config(&self) -> &NatsConfig {
        &self.config
    }

    /// Get metrics.
    pub fn metrics(&self) -> &Arc<NatsMetrics> {
        &self.metrics
    }

    /// Check connection health.
    pub fn health_check(&self) -> HealthCheck {
        HealthCheck::from_metrics(&self.metrics, self.is_connected())
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.client.connection_state() == async_nats::connection::State::Connected
    }

    /// Graceful shutdown - drain the connection.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Draining NATS connection");

        if let Err(e) = self.client.drain().await {
            error!("Error draining NATS connection: {}", e);
        }

        self.metrics.set_connected(false);
        Ok(())
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        let payload_len = payload.len() as u64;
        debug!(subject = %subject, bytes = payload_len, "Publishing message");

        match self
            .client
            .publish(subject.to_string(), payload.into())
            .await
        {
            Ok(()) => {
                self.metrics.record_publish(payload_len);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure();
                Err(Error::Bus(format!("Failed to publish to {}: {}", subject, e)))
            }
        }
    }

    async fn subscribe(&self, subject: &str) -> Result<MessageStream> {
        debug!(subject = %subject, "Subscribing");

        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| Error::Bus(format!("Failed to subscribe to {}: {}", subject, e)))?;

        let metrics = self.metrics.clone();
        let stream = subscriber.map(move |msg| {
            metrics.record_receive(msg.payload.len() as u64);
            msg.payload.to_vec()
        });

        Ok(Box::pin(stream))
    }

    async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        debug!(subject = %subject, timeout_ms = timeout.as_millis() as u64, "Sending request");
        self.metrics.record_request();

        let response = tokio::time::timeout(
            timeout,
            self.client.request(subject.to_string(), payload.into()),
        )
        .await;

        let message = match response {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                return Err(match e.kind() {
                    RequestErrorKind::TimedOut => {
                        self.metrics.record_request_timeout();
                        Error::Timeout {
                            subject: subject.to_string(),
                        }
                    }
                    RequestErrorKind::NoResponders => {
                        self.metrics.record_request_timeout();
                        Error::NoResponders {
                            subject: subject.to_string(),
                        }
                    }
                    _ => Error::Bus(format!("Request to {} failed: {}", subject, e)),
                });
            }
            Err(_) => {
                self.metrics.record_request_timeout();
                return Err(Error::Timeout {
                    subject: subject.to_string(),
                });
            }
        };

        self.metrics.record_receive(message.payload.len() as u64);
        Ok(message.payload.to_vec())
    }

    async fn request_many(&self, subject: &str, payload: Vec<u8>) -> Result<MessageStream> {
        let inbox = self.client.new_inbox();
        debug!(subject = %subject, inbox = %inbox, "Sending fan-in request");
        self.metrics.record_request();

        // Subscribe before publishing so no early reply is lost.
        let subscriber = self
            .client
            .subscribe(inbox.clone())
            .await
            .map_err(|e| Error::Bus(format!("Failed to subscribe to inbox: {}", e)))?;

        let payload_len = payload.len() as u64;
        self.client
            .publish_with_reply(subject.to_string(), inbox, payload.into())
            .await
            .map_err(|e| {
                self.metrics.record_publish_failure();
                Error::Bus(format!("Failed to publish request to {}: {}", subject, e))
            })?;
        self.metrics.record_publish(payload_len);

        let metrics = self.metrics.clone();
        let stream = subscriber.map(move |msg| {
            metrics.record_receive(msg.payload.len() as u64);
            msg.payload.to_vec()
        });

        Ok(Box::pin(stream))
    }
}
