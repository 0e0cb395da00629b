//! WebSocket transport speaking a JSON pub/sub broker protocol.
//!
//! The client sends tagged `subscribe` / `unsubscribe` / `publish` frames;
//! the broker pushes `message` frames for topics the client subscribed to.
//! The transport owns two tasks: a writer draining the outbound queue and
//! control frames into the socket, and a reader turning broker pushes into
//! [`Delivery`] items for the owning node.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tracing::{debug, error, warn};
use tungstenite::protocol::Message as WsMessage;

use super::{Delivery, Outbound, Publisher, QosLevel, Transport};
use crate::config::ConnectionConfig;
use crate::utils::error::{Error, Result};

/// Frames sent from this client to the broker.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "subscribe")]
    Subscribe { topic: String },

    #[serde(rename = "unsubscribe")]
    Unsubscribe { topic: String },

    #[serde(rename = "publish")]
    Publish {
        topic: String,
        payload: String,
        qos: u8,
    },
}

/// Frames pushed by the broker.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BrokerFrame {
    #[serde(rename = "message")]
    Message {
        topic: String,
        payload: String,
        #[serde(default)]
        timestamp: i64,
    },
}

/// Thin facade over a `tokio-tungstenite` connection to a pub/sub broker.
pub struct WebSocketTransport {
    url: String,
    outbound_tx: UnboundedSender<Outbound>,
    outbound_rx: Option<UnboundedReceiver<Outbound>>,
    frame_tx: Option<UnboundedSender<ClientFrame>>,
    forward: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self::with_url(config.url())
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        Self {
            url: url.into(),
            outbound_tx,
            outbound_rx: Some(outbound_rx),
            frame_tx: None,
            forward: None,
            writer: None,
            reader: None,
        }
    }

    fn send_frame(&self, frame: ClientFrame) -> Result<()> {
        self.frame_tx
            .as_ref()
            .ok_or(Error::NotConnected)?
            .send(frame)
            .map_err(|_| Error::Connection("websocket writer closed".to_string()))
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&mut self, delivery: UnboundedSender<Delivery>) -> Result<()> {
        if self.outbound_rx.is_none() {
            return Err(Error::Connection("transport already connected".to_string()));
        }

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| Error::Connection(format!("websocket connect failed: {e}")))?;
        let (mut ws_sender, mut ws_receiver) = ws_stream.split();

        // The queue receiver is only consumed once the socket is up. A failed
        // or timed-out attempt leaves it (and every Publisher handle over the
        // same channel) intact, and the caller can retry.
        let Some(mut outbound_rx) = self.outbound_rx.take() else {
            return Err(Error::Connection("transport already connected".to_string()));
        };

        // Control frames and publishes funnel through one FIFO queue, so a
        // subscribe issued during join is on the wire before any publish
        // that follows it.
        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<ClientFrame>();
        self.frame_tx = Some(frame_tx.clone());

        // Forward queued publishes into the frame queue.
        self.forward = Some(tokio::spawn(async move {
            while let Some(outbound) = outbound_rx.recv().await {
                let payload = match String::from_utf8(outbound.payload) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!("dropping non-utf8 publish payload: {e}");
                        continue;
                    }
                };
                let frame = ClientFrame::Publish {
                    topic: outbound.topic,
                    payload,
                    qos: outbound.qos.as_u8(),
                };
                if frame_tx.send(frame).is_err() {
                    break;
                }
            }
        }));

        // Writer: drains the frame queue into the socket.
        self.writer = Some(tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        error!("failed to serialize frame: {e}");
                        continue;
                    }
                };
                if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                    error!("websocket send failed: {e}");
                    break;
                }
            }
            debug!("websocket writer closed");
        }));

        // Reader: broker pushes become deliveries.
        self.reader = Some(tokio::spawn(async move {
            while let Some(Ok(msg)) = ws_receiver.next().await {
                if !msg.is_text() {
                    continue;
                }
                let Ok(text) = msg.to_text() else { continue };
                match serde_json::from_str::<BrokerFrame>(text) {
                    Ok(BrokerFrame::Message { topic, payload, .. }) => {
                        let inbound = Delivery {
                            topic,
                            payload: payload.into_bytes(),
                        };
                        if delivery.send(inbound).is_err() {
                            break;
                        }
                    }
                    Err(e) => debug!("ignoring unrecognized broker frame: {e}"),
                }
            }
            debug!("websocket reader closed");
        }));

        Ok(())
    }

    async fn subscribe(&mut self, topic: &str, _qos: QosLevel) -> Result<()> {
        self.send_frame(ClientFrame::Subscribe {
            topic: topic.to_string(),
        })
    }

    async fn unsubscribe(&mut self, topic: &str) -> Result<()> {
        self.send_frame(ClientFrame::Unsubscribe {
            topic: topic.to_string(),
        })
    }

    fn publisher(&self) -> Publisher {
        Publisher::new(self.outbound_tx.clone())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.frame_tx = None;
        if let Some(forward) = self.forward.take() {
            forward.abort();
        }
        if let Some(writer) = self.writer.take() {
            writer.abort();
        }
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        Ok(())
    }
}
