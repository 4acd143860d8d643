//! Port traits (hexagonal architecture).
//!
//! The synchronization engine only talks to the bus through [`MessageBus`];
//! adapters live in their own crates.

use crate::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;

/// Stream of raw message payloads.
pub type MessageStream = Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>;

/// Publish/subscribe bus with request/reply.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Fire-and-forget publish.
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()>;

    /// Subscribe to a subject. Dropping the stream unsubscribes.
    async fn subscribe(&self, subject: &str) -> Result<MessageStream>;

    /// Send a request and wait for the first reply.
    ///
    /// Returns [`crate::Error::Timeout`] when nothing arrives within `timeout`.
    async fn request(&self, subject: &str, payload: Vec<u8>, timeout: Duration)
    -> Result<Vec<u8>>;

    /// Send a request whose replies arrive on an ephemeral inbox.
    ///
    /// The stream never ends by itself; callers stop draining it once no
    /// reply shows up within their own per-reply deadline.
    async fn request_many(&self, subject: &str, payload: Vec<u8>) -> Result<MessageStream>;
}
