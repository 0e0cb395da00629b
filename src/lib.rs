//! # Roomcast
//!
//! `roomcast` is a small agent-to-agent messaging library built on top of a
//! publish/subscribe transport. Agents meet in a *room* (a shared broadcast
//! channel) and exchange structured messages with everyone in the room or
//! directly with a single peer.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `message`: the message envelope and its JSON wire codec.
//! - `topic`: derivation and classification of room topic strings.
//! - `handler`: the ordered registry of inbound message handlers.
//! - `transport`: the pub/sub transport boundary, plus the bundled in-memory
//!   and WebSocket transports.
//! - `node`: the `AgentNode` session that ties the pieces together.
//! - `config`: connection configuration and loading.
//! - `utils`: shared utilities, such as error handling and logging setup.

pub mod config;
pub mod handler;
pub mod message;
pub mod node;
pub mod topic;
pub mod transport;
pub mod utils;

pub use config::ConnectionConfig;
pub use handler::{HandlerId, HandlerRegistry, HandlerResult};
pub use message::{Audience, Message};
pub use node::{AgentNode, NodeOptions, SessionState};
pub use topic::{TopicKind, TopicScheme};
pub use transport::{Publisher, QosLevel, Transport};
pub use utils::error::{Error, Result};
