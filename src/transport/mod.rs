//! The `transport` module is the boundary to the underlying
//! publish/subscribe system.
//!
//! The core never touches sockets: it drives a [`Transport`] for lifecycle
//! operations, hands it a delivery channel for inbound payloads, and
//! publishes through a [`Publisher`] handle. Two transports ship with the
//! crate: an in-process [`memory`] hub for tests and embedding, and a
//! [`websocket`] client speaking a JSON pub/sub broker protocol.

pub mod memory;
pub mod websocket;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::utils::error::{Error, Result};

/// Delivery-guarantee level requested from the transport.
///
/// The transport implements the guarantee; the core only selects a level and
/// tags outbound traffic with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QosLevel {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

impl QosLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            QosLevel::AtMostOnce => 0,
            QosLevel::AtLeastOnce => 1,
            QosLevel::ExactlyOnce => 2,
        }
    }
}

/// An inbound payload pushed by the transport to its owning node.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// An outbound publish queued towards the transport's I/O task.
#[derive(Debug, Clone)]
pub struct Outbound {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QosLevel,
}

/// Clonable publish handle.
///
/// Publishing is a non-blocking send onto the transport's outbound queue, so
/// it is safe to call from inside the inbound dispatch path (no
/// self-deadlock) and from application threads at the same time.
#[derive(Debug, Clone)]
pub struct Publisher {
    tx: UnboundedSender<Outbound>,
}

impl Publisher {
    pub fn new(tx: UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }

    pub fn publish(&self, topic: &str, payload: Vec<u8>, qos: QosLevel) -> Result<()> {
        self.tx
            .send(Outbound {
                topic: topic.to_string(),
                payload,
                qos,
            })
            .map_err(|_| Error::Connection("transport is closed".to_string()))
    }
}

/// Facade over an external pub/sub client.
///
/// Implementations own their network I/O tasks. The node calls these methods
/// for lifecycle changes and consumes the delivery channel it handed to
/// `connect`; `publisher` returns the handle used for all outbound traffic.
#[async_trait]
pub trait Transport: Send {
    /// Connects and registers the channel inbound payloads are pushed into.
    async fn connect(&mut self, delivery: UnboundedSender<Delivery>) -> Result<()>;

    async fn subscribe(&mut self, topic: &str, qos: QosLevel) -> Result<()>;

    async fn unsubscribe(&mut self, topic: &str) -> Result<()>;

    /// Publish handle; valid for the life of the transport.
    fn publisher(&self) -> Publisher;

    async fn disconnect(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests;
