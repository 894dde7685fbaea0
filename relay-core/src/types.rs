//! Core message and channel types shared by the router, the context assembler and adapters.

use serde::{Deserialize, Serialize};

/// Platform message type. Only [`MessageKind::Default`] (plain text typed by a user or the bot)
/// takes part in conversations; joins, pins, thread notices etc. are [`MessageKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Default,
    Other(u8),
}

impl MessageKind {
    pub fn is_default(&self) -> bool {
        matches!(self, MessageKind::Default)
    }
}

/// A newly created message delivered by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub kind: MessageKind,
    pub content: String,
}

/// One message returned by a channel history fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub author_id: String,
    pub kind: MessageKind,
    pub content: String,
    /// Id of the thread this message started, if any.
    pub thread_id: Option<String>,
}

/// Channel metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub is_thread: bool,
    pub parent_id: Option<String>,
    pub last_message_id: Option<String>,
}

/// The placeholder message progressively edited with the growing answer.
/// Owned by exactly one reply task for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplyTarget {
    pub channel_id: String,
    pub message_id: String,
}

impl ReplyTarget {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}
