use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ConnectionConfig;
use crate::handler::{HandlerId, HandlerRegistry, HandlerResult};
use crate::message::{self, Audience, Message};
use crate::topic::{TopicScheme, validate_segment};
use crate::transport::{Delivery, Publisher, QosLevel, Transport};
use crate::utils::error::{Error, Result};

/// Lifecycle state of a node.
///
/// `Disconnected` is terminal: a node that left its room cannot re-join, a
/// new instance is required to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    New = 0,
    Connected = 1,
    Disconnected = 2,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => SessionState::Connected,
            2 => SessionState::Disconnected,
            _ => SessionState::New,
        }
    }
}

/// Per-node settings beyond the connection itself.
///
/// Missing room/agent ids are generated, so a node can always be spun up
/// ad hoc for a fresh room.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    pub room_id: Option<String>,
    pub agent_id: Option<String>,
    pub respond_to_group: bool,
    pub respond_to_direct: bool,
    pub qos: QosLevel,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            room_id: None,
            agent_id: None,
            respond_to_group: true,
            respond_to_direct: true,
            qos: QosLevel::default(),
        }
    }
}

/// State shared between the node handle and its dispatch task.
struct NodeShared {
    agent_id: String,
    scheme: TopicScheme,
    respond_to_group: bool,
    respond_to_direct: bool,
    qos: QosLevel,
    state: AtomicU8,
    registry: HandlerRegistry,
    publisher: Publisher,
}

impl NodeShared {
    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Builds, validates and publishes one message. Shared by
    /// `send_message` and the auto-reply path.
    fn publish_message(
        &self,
        content: Value,
        audience: Audience,
        recipient_id: Option<&str>,
        in_reply_to: Option<&str>,
    ) -> Result<String> {
        let mut msg = Message::new(self.agent_id.clone(), content);
        msg.audience = audience;
        // recipient_id is ignored for room broadcasts.
        msg.recipient_id = match audience {
            Audience::Direct => recipient_id.map(str::to_string),
            Audience::Everyone => None,
        };
        msg.in_reply_to = in_reply_to.map(str::to_string);
        msg.validate()?;

        let topic = match audience {
            Audience::Everyone => self.scheme.group(),
            Audience::Direct => self
                .scheme
                .direct(msg.recipient_id.as_deref().unwrap_or_default())?,
        };
        let payload = message::encode(&msg)?;
        self.publisher.publish(&topic, payload, self.qos)?;
        debug!("sent message {} to {topic}", msg.message_id);
        Ok(msg.message_id)
    }

    /// Processes one inbound payload. Runs to completion before the dispatch
    /// loop picks up the next delivery, so handlers are never invoked
    /// concurrently for the same node.
    fn handle_delivery(&self, delivery: Delivery) {
        let msg = match message::decode(&delivery.payload) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("dropping undecodable payload on {}: {e}", delivery.topic);
                return;
            }
        };

        if self.scheme.classify(&delivery.topic).is_none() {
            warn!("dropping message on foreign topic {}", delivery.topic);
            return;
        }

        // Own messages echo back through the room subscriptions; never
        // dispatch them, or a replying handler would loop forever.
        if msg.sender_id == self.agent_id {
            return;
        }

        match msg.audience {
            Audience::Everyone if !self.respond_to_group => return,
            Audience::Direct
                if !self.respond_to_direct
                    || msg.recipient_id.as_deref() != Some(self.agent_id.as_str()) =>
            {
                return;
            }
            _ => {}
        }

        debug!("received message {} from {}", msg.message_id, msg.sender_id);
        let Some(reply) = self.registry.dispatch(&msg) else {
            return;
        };

        // Replies mirror the audience of the original: direct messages get a
        // direct answer to their sender, broadcasts are answered in the room.
        let (audience, recipient) = match msg.audience {
            Audience::Everyone => (Audience::Everyone, None),
            Audience::Direct => (Audience::Direct, Some(msg.sender_id.as_str())),
        };
        if let Err(e) = self.publish_message(reply, audience, recipient, Some(&msg.message_id)) {
            warn!("failed to publish reply to {}: {e}", msg.message_id);
        }
    }
}

/// A single agent's session in a room.
///
/// The node owns its transport exclusively, coordinates the topic scheme,
/// envelope codec and handler registry, and guarantees messages are only
/// processed after the room has been fully joined.
pub struct AgentNode {
    config: ConnectionConfig,
    transport: Box<dyn Transport>,
    shared: Arc<NodeShared>,
    group_topic: String,
    direct_topic: Option<String>,
    dispatch: Option<JoinHandle<()>>,
}

impl AgentNode {
    /// Creates a node for `config` over `transport`.
    ///
    /// Room and agent ids are validated here: ids containing the topic
    /// separator are rejected before any network activity.
    pub fn new(
        config: ConnectionConfig,
        transport: Box<dyn Transport>,
        options: NodeOptions,
    ) -> Result<Self> {
        let room_id = options
            .room_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let agent_id = options
            .agent_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let scheme = TopicScheme::new(&room_id)?;
        validate_segment(&agent_id, "agent_id")?;
        let group_topic = scheme.group();
        let direct_topic = if options.respond_to_direct {
            Some(scheme.direct(&agent_id)?)
        } else {
            None
        };

        let publisher = transport.publisher();
        let shared = Arc::new(NodeShared {
            agent_id,
            scheme,
            respond_to_group: options.respond_to_group,
            respond_to_direct: options.respond_to_direct,
            qos: options.qos,
            state: AtomicU8::new(SessionState::New as u8),
            registry: HandlerRegistry::new(),
            publisher,
        });

        Ok(Self {
            config,
            transport,
            shared,
            group_topic,
            direct_topic,
            dispatch: None,
        })
    }

    pub fn room_id(&self) -> &str {
        self.shared.scheme.room_id()
    }

    pub fn agent_id(&self) -> &str {
        &self.shared.agent_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Registers a message handler; returns the token to remove it again.
    /// Handlers may be added and removed at any point, including while the
    /// node is live.
    pub fn add_message_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Message) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared.registry.add(handler)
    }

    pub fn remove_message_handler(&self, id: HandlerId) -> bool {
        self.shared.registry.remove(id)
    }

    /// Joins the room: connects the transport, subscribes to the room's
    /// group topic (and to this agent's direct topic when enabled), then
    /// starts dispatching inbound messages.
    ///
    /// Valid only from `New`. On failure or timeout the state stays `New`
    /// and the caller decides whether to retry.
    pub async fn join(&mut self) -> Result<()> {
        match self.state() {
            SessionState::New => {}
            SessionState::Connected => {
                return Err(Error::Connection("already joined the room".to_string()));
            }
            SessionState::Disconnected => {
                return Err(Error::Connection(
                    "session is closed; create a new node to rejoin".to_string(),
                ));
            }
        }

        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        let deadline = self.config.connect_timeout();
        match timeout(deadline, self.connect_and_subscribe(delivery_tx)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = self.transport.disconnect().await;
                return Err(e);
            }
            Err(_) => {
                let _ = self.transport.disconnect().await;
                return Err(Error::Connection(format!(
                    "join timed out after {deadline:?}"
                )));
            }
        }

        // Only start processing once the subscriptions are in place.
        let shared = self.shared.clone();
        self.dispatch = Some(tokio::spawn(dispatch_loop(shared, delivery_rx)));
        self.shared.set_state(SessionState::Connected);
        info!("agent {} joined room {}", self.agent_id(), self.room_id());
        Ok(())
    }

    async fn connect_and_subscribe(&mut self, delivery_tx: UnboundedSender<Delivery>) -> Result<()> {
        self.transport.connect(delivery_tx).await?;
        self.transport
            .subscribe(&self.group_topic, self.shared.qos)
            .await?;
        if let Some(direct) = self.direct_topic.clone() {
            self.transport.subscribe(&direct, self.shared.qos).await?;
        }
        Ok(())
    }

    /// Sends a message into the room and returns its generated id.
    ///
    /// Fails with `NotConnected` outside a joined session and with
    /// `InvalidArgument` for a direct message without a usable recipient.
    /// Safe to call from application code and from inside handlers.
    pub fn send_message(
        &self,
        content: Value,
        audience: Audience,
        recipient_id: Option<&str>,
        in_reply_to: Option<&str>,
    ) -> Result<String> {
        if self.state() != SessionState::Connected {
            return Err(Error::NotConnected);
        }
        self.shared
            .publish_message(content, audience, recipient_id, in_reply_to)
    }

    /// Convenience wrapper: broadcast to the whole room.
    pub fn broadcast(&self, content: Value) -> Result<String> {
        self.send_message(content, Audience::Everyone, None, None)
    }

    /// Leaves the room: unsubscribes, disconnects and stops dispatching.
    ///
    /// Idempotent: leaving a node that never joined (or already left) is a
    /// no-op that settles the state at `Disconnected`.
    pub async fn leave(&mut self) -> Result<()> {
        if self.state() != SessionState::Connected {
            self.shared.set_state(SessionState::Disconnected);
            return Ok(());
        }

        // Gate sends first so nothing is queued onto a dying transport.
        self.shared.set_state(SessionState::Disconnected);

        if let Err(e) = self.transport.unsubscribe(&self.group_topic).await {
            warn!("unsubscribe from {} failed: {e}", self.group_topic);
        }
        if let Some(direct) = self.direct_topic.clone() {
            if let Err(e) = self.transport.unsubscribe(&direct).await {
                warn!("unsubscribe from {direct} failed: {e}");
            }
        }
        self.transport.disconnect().await?;

        if let Some(task) = self.dispatch.take() {
            task.abort();
        }
        info!("agent {} left room {}", self.agent_id(), self.room_id());
        Ok(())
    }
}

/// Inbound deliveries are handled one at a time, in arrival order.
async fn dispatch_loop(shared: Arc<NodeShared>, mut delivery_rx: UnboundedReceiver<Delivery>) {
    while let Some(delivery) = delivery_rx.recv().await {
        shared.handle_delivery(delivery);
    }
    debug!("dispatch loop for agent {} finished", shared.agent_id);
}
