//! In-process transport for tests and single-process embedding.
//!
//! [`MemoryHub`] stands in for the external broker: it keeps a map of topic
//! to subscriber channels and fans every published payload out to all
//! current subscribers of that topic. Delivery is best-effort regardless of
//! the requested QoS level.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use super::{Delivery, Outbound, Publisher, QosLevel, Transport};
use crate::utils::error::{Error, Result};

type SubscriberId = u64;

#[derive(Default)]
struct HubInner {
    topics: HashMap<String, Vec<SubscriberId>>,
    clients: HashMap<SubscriberId, UnboundedSender<Delivery>>,
    next_id: SubscriberId,
}

/// Shared in-process message hub. Cloning yields another handle to the same
/// hub; every [`MemoryTransport`] created from it sees the same topics.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Arc<Mutex<HubInner>>,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport attached to this hub.
    pub fn transport(&self) -> MemoryTransport {
        MemoryTransport::new(self.clone())
    }

    fn register(&self, sender: UnboundedSender<Delivery>) -> SubscriberId {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.clients.insert(id, sender);
        id
    }

    fn unregister(&self, id: SubscriberId) {
        let mut inner = self.inner.lock().unwrap();
        inner.clients.remove(&id);
        for subscribers in inner.topics.values_mut() {
            subscribers.retain(|s| *s != id);
        }
    }

    fn subscribe(&self, id: SubscriberId, topic: &str) {
        let mut inner = self.inner.lock().unwrap();
        let subscribers = inner.topics.entry(topic.to_string()).or_default();
        if !subscribers.contains(&id) {
            subscribers.push(id);
        }
    }

    fn unsubscribe(&self, id: SubscriberId, topic: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(subscribers) = inner.topics.get_mut(topic) {
            subscribers.retain(|s| *s != id);
        }
    }

    fn route(&self, topic: &str, payload: Vec<u8>) {
        let inner = self.inner.lock().unwrap();
        let Some(subscribers) = inner.topics.get(topic) else {
            debug!("no subscribers on topic '{topic}'");
            return;
        };
        for subscriber in subscribers {
            if let Some(sender) = inner.clients.get(subscriber) {
                let _ = sender.send(Delivery {
                    topic: topic.to_string(),
                    payload: payload.clone(),
                });
            }
        }
    }
}

/// One attachment of a node to a [`MemoryHub`].
pub struct MemoryTransport {
    hub: MemoryHub,
    outbound_tx: UnboundedSender<Outbound>,
    outbound_rx: Option<UnboundedReceiver<Outbound>>,
    subscriber: Option<SubscriberId>,
    forward: Option<JoinHandle<()>>,
}

impl MemoryTransport {
    pub fn new(hub: MemoryHub) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            hub,
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            subscriber: None,
            forward: None,
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&mut self, delivery: UnboundedSender<Delivery>) -> Result<()> {
        let mut outbound_rx = self
            .outbound_rx
            .take()
            .ok_or_else(|| Error::Connection("transport already connected".to_string()))?;

        self.subscriber = Some(self.hub.register(delivery));

        // Forward queued publishes into the hub on a dedicated task, so
        // publishing stays non-blocking for the caller.
        let hub = self.hub.clone();
        self.forward = Some(tokio::spawn(async move {
            while let Some(outbound) = outbound_rx.recv().await {
                hub.route(&outbound.topic, outbound.payload);
            }
        }));
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, _qos: QosLevel) -> Result<()> {
        let id = self.subscriber.ok_or(Error::NotConnected)?;
        self.hub.subscribe(id, topic);
        Ok(())
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<()> {
        let id = self.subscriber.ok_or(Error::NotConnected)?;
        self.hub.unsubscribe(id, topic);
        Ok(())
    }

    fn publisher(&self) -> Publisher {
        Publisher::new(self.outbound_tx.clone())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(id) = self.subscriber.take() {
            self.hub.unregister(id);
        }
        if let Some(task) = self.forward.take() {
            task.abort();
        }
        Ok(())
    }
}
