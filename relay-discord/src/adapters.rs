//! Adapters from Discord (serenity) types to relay_core types.
//! Depends only on serenity model types and relay_core type definitions.

use relay_core::{ChannelInfo, HistoryMessage, InboundMessage, MessageKind, RelayError, Result};
use serenity::model::channel::{Channel, ChannelType, Message, MessageType};
use std::borrow::Cow;
use tracing::warn;

/// Discord's per-message content limit, in characters.
pub const MESSAGE_CHAR_LIMIT: usize = 2000;
/// Appended when text had to be cut to fit [`MESSAGE_CHAR_LIMIT`].
pub const TRUNCATION_SUFFIX: &str = "… (truncated)";

/// Parses a snowflake id rendered as a string. Zero is not a valid snowflake.
pub fn parse_snowflake(id: &str) -> Result<u64> {
    match id.trim().parse::<u64>() {
        Ok(n) if n != 0 => Ok(n),
        _ => Err(RelayError::Bot(format!("invalid snowflake id: {:?}", id))),
    }
}

pub fn message_kind(kind: MessageType) -> MessageKind {
    match kind {
        MessageType::Regular => MessageKind::Default,
        other => MessageKind::Other(u8::from(other)),
    }
}

pub fn is_thread_type(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::PublicThread | ChannelType::PrivateThread | ChannelType::NewsThread
    )
}

/// `text` unchanged when it fits in one message; otherwise its head followed by
/// [`TRUNCATION_SUFFIX`], [`MESSAGE_CHAR_LIMIT`] characters in total.
pub fn fit_message_length(text: &str) -> Cow<'_, str> {
    if text.char_indices().nth(MESSAGE_CHAR_LIMIT).is_none() {
        return Cow::Borrowed(text);
    }
    let keep = MESSAGE_CHAR_LIMIT - TRUNCATION_SUFFIX.chars().count();
    let cut = text
        .char_indices()
        .nth(keep)
        .map_or(text.len(), |(byte_idx, _)| byte_idx);
    warn!(
        chars = text.chars().count(),
        limit = MESSAGE_CHAR_LIMIT,
        "Message text exceeds Discord limit; truncating"
    );
    Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_SUFFIX))
}

/// Wraps a serenity Message for conversion to core types.
pub struct DiscordMessageWrapper<'a>(pub &'a Message);

impl<'a> DiscordMessageWrapper<'a> {
    pub fn to_inbound(&self) -> InboundMessage {
        InboundMessage {
            id: self.0.id.to_string(),
            channel_id: self.0.channel_id.to_string(),
            author_id: self.0.author.id.to_string(),
            kind: message_kind(self.0.kind),
            content: self.0.content.clone(),
        }
    }

    pub fn to_history(&self) -> HistoryMessage {
        HistoryMessage {
            id: self.0.id.to_string(),
            author_id: self.0.author.id.to_string(),
            kind: message_kind(self.0.kind),
            content: self.0.content.clone(),
            thread_id: self.0.thread.as_ref().map(|t| t.id.to_string()),
        }
    }
}

pub fn channel_info(channel: &Channel) -> ChannelInfo {
    match channel {
        Channel::Guild(c) => ChannelInfo {
            id: c.id.to_string(),
            is_thread: is_thread_type(c.kind),
            parent_id: c.parent_id.map(|p| p.to_string()),
            last_message_id: c.last_message_id.map(|m| m.to_string()),
        },
        Channel::Private(c) => ChannelInfo {
            id: c.id.to_string(),
            is_thread: false,
            parent_id: None,
            last_message_id: c.last_message_id.map(|m| m.to_string()),
        },
        other => ChannelInfo {
            id: other.id().to_string(),
            is_thread: false,
            parent_id: None,
            last_message_id: None,
        },
    }
}
