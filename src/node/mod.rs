//! The `node` module owns the session lifecycle: joining a room, routing
//! inbound messages to the registered handlers, and publishing outbound
//! messages and auto-replies.

pub mod agent_node;

pub use agent_node::{AgentNode, NodeOptions, SessionState};
