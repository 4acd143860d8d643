//! In-memory message bus with scripted request/reply behavior.

use async_trait::async_trait;
use fleetscope_core::ports::{MessageBus, MessageStream};
use fleetscope_core::{Error, Result};
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use futures::stream;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Produces a reply for a request payload; `None` means nobody answered.
pub type Responder = Arc<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

#[derive(Default)]
struct Inner {
    subscribers: HashMap<String, Vec<UnboundedSender<Vec<u8>>>>,
    responders: HashMap<String, Responder>,
    fan_in: HashMap<String, Vec<Vec<u8>>>,
    failing: HashSet<String>,
    published: Vec<(String, Vec<u8>)>,
    requests: Vec<(String, Vec<u8>)>,
}

/// [`MessageBus`] whose replies are scripted by the test.
///
/// Requests on a subject without a responder fail with [`Error::Timeout`]
/// straight away. A fan-in request yields the scripted replies and then stays
/// open without further replies, like a real inbox.
#[derive(Default)]
pub struct ScriptedBus {
    inner: Mutex<Inner>,
}

impl ScriptedBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the state from the rest.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer requests on `subject` with `responder`.
    pub fn respond<F>(&self, subject: &str, responder: F)
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.lock()
            .responders
            .insert(subject.to_string(), Arc::new(responder));
    }

    /// Answer every request on `subject` with the same JSON body.
    pub fn respond_json<T: Serialize>(&self, subject: &str, reply: &T) {
        let body = encode(reply);
        self.respond(subject, move |_| Some(body.clone()));
    }

    /// Stop answering requests on `subject`.
    pub fn silence(&self, subject: &str) {
        self.lock().responders.remove(subject);
    }

    /// Replies delivered to the next fan-in request on `subject`.
    pub fn fan_in(&self, subject: &str, replies: Vec<Vec<u8>>) {
        self.lock().fan_in.insert(subject.to_string(), replies);
    }

    /// Make every operation on `subject` fail with a bus error.
    pub fn fail(&self, subject: &str) {
        self.lock().failing.insert(subject.to_string());
    }

    /// Deliver a message to the subscribers of `subject`, as an agent would.
    /// Returns how many subscribers received it.
    pub fn deliver(&self, subject: &str, payload: Vec<u8>) -> usize {
        let mut inner = self.lock();
        let Some(senders) = inner.subscribers.get_mut(subject) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            let _ = tx.unbounded_send(payload.clone());
        }
        senders.len()
    }

    /// Deliver a JSON-encoded message to the subscribers of `subject`.
    pub fn deliver_json<T: Serialize>(&self, subject: &str, message: &T) -> usize {
        self.deliver(subject, encode(message))
    }

    /// Close every subscription stream.
    pub fn close_subscriptions(&self) {
        self.lock().subscribers.clear();
    }

    pub fn subscriber_count(&self, subject: &str) -> usize {
        self.lock()
            .subscribers
            .get(subject)
            .map(|s| s.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Payloads published on `subject`, oldest first.
    pub fn published(&self, subject: &str) -> Vec<Vec<u8>> {
        self.lock()
            .published
            .iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Request payloads sent on `subject`, oldest first.
    pub fn requests(&self, subject: &str) -> Vec<Vec<u8>> {
        self.lock()
            .requests
            .iter()
            .filter(|(s, _)| s == subject)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

#[async_trait]
impl MessageBus for ScriptedBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<()> {
        if self.lock().failing.contains(subject) {
            return Err(Error::Bus(format!("publish to {} failed", subject)));
        }
        self.lock()
            .published
            .push((subject.to_string(), payload.clone()));
        self.deliver(subject, payload);
        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> Result<MessageStream> {
        let mut inner = self.lock();
        if inner.failing.contains(subject) {
            return Err(Error::Bus(format!("subscribe to {} failed", subject)));
        }
        let (tx, rx) = unbounded();
        inner
            .subscribers
            .entry(subject.to_string())
            .or_default()
            .push(tx);
        Ok(Box::pin(rx))
    }

    async fn request(&self, subject: &str, payload: Vec<u8>, _timeout: Duration) -> Result<Vec<u8>> {
        let responder = {
            let mut inner = self.lock();
            if inner.failing.contains(subject) {
                return Err(Error::Bus(format!("request to {} failed", subject)));
            }
            inner.requests.push((subject.to_string(), payload.clone()));
            inner.responders.get(subject).cloned()
        };

        responder
            .and_then(|respond| respond(&payload))
            .ok_or_else(|| Error::Timeout {
                subject: subject.to_string(),
            })
    }

    async fn request_many(&self, subject: &str, payload: Vec<u8>) -> Result<MessageStream> {
        let mut inner = self.lock();
        if inner.failing.contains(subject) {
            return Err(Error::Bus(format!("request to {} failed", subject)));
        }
        inner.requests.push((subject.to_string(), payload));
        let replies = inner.fan_in.remove(subject).unwrap_or_default();

        Ok(stream::iter(replies).chain(stream::pending()).boxed())
    }
}

/// JSON-encode a test message.
pub fn encode<T: Serialize>(message: &T) -> Vec<u8> {
    serde_json::to_vec(message).expect("test message serializes")
}
