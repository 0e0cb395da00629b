//! The `topic` module derives the topic strings a room uses on the
//! pub/sub transport and classifies inbound topics back into the room's
//! namespace.
//!
//! The wire format is a two-segment namespace: `<room_id>/group` for the
//! room broadcast channel and `<room_id>/direct/<agent_id>` for delivery to
//! one agent. Ids may not contain the separator, which keeps the group and
//! direct namespaces disjoint for every valid room/agent pair.

pub mod scheme;

pub use scheme::{SEPARATOR, TopicKind, TopicScheme, validate_segment};
