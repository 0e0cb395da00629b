use crate::utils::error::{Error, Result};

/// Reserved topic separator. Room and agent ids may not contain it.
pub const SEPARATOR: char = '/';

const GROUP_SEGMENT: &str = "group";
const DIRECT_SEGMENT: &str = "direct";

/// Classification of an inbound topic within one room's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicKind {
    /// The room broadcast channel.
    Group,
    /// The direct channel of the named agent.
    Direct(String),
}

/// Pure mapping between one room and its topic strings.
#[derive(Debug, Clone)]
pub struct TopicScheme {
    room_id: String,
}

impl TopicScheme {
    /// Creates the scheme for a room. Fails if the room id is empty or
    /// contains the separator.
    pub fn new(room_id: &str) -> Result<Self> {
        validate_segment(room_id, "room_id")?;
        Ok(Self {
            room_id: room_id.to_string(),
        })
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Broadcast topic shared by every member of the room.
    pub fn group(&self) -> String {
        format!("{}{SEPARATOR}{GROUP_SEGMENT}", self.room_id)
    }

    /// Direct topic of `agent_id`. Only that agent subscribes to it, but any
    /// room member may publish to it.
    pub fn direct(&self, agent_id: &str) -> Result<String> {
        validate_segment(agent_id, "agent_id")?;
        Ok(format!(
            "{}{SEPARATOR}{DIRECT_SEGMENT}{SEPARATOR}{agent_id}",
            self.room_id
        ))
    }

    /// Inverse mapping: decides whether `topic` is this room's group topic,
    /// a direct topic of some agent in this room, or foreign (`None`).
    pub fn classify(&self, topic: &str) -> Option<TopicKind> {
        let rest = topic
            .strip_prefix(self.room_id.as_str())?
            .strip_prefix(SEPARATOR)?;
        if rest == GROUP_SEGMENT {
            return Some(TopicKind::Group);
        }
        let agent_id = rest.strip_prefix(DIRECT_SEGMENT)?.strip_prefix(SEPARATOR)?;
        if agent_id.is_empty() || agent_id.contains(SEPARATOR) {
            return None;
        }
        Some(TopicKind::Direct(agent_id.to_string()))
    }
}

/// Shared id check for room and agent ids: non-empty, no separator.
pub fn validate_segment(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} must not be empty")));
    }
    if value.contains(SEPARATOR) {
        return Err(Error::InvalidArgument(format!(
            "{what} must not contain '{SEPARATOR}'"
        )));
    }
    Ok(())
}
