//! # Prompt
//!
//! Role-tagged conversation turns sent to a chat completion API.
//!
//! ## Ordering
//!
//! A conversation is chronological (oldest first). System turns never take part in that ordering:
//! [`with_system_preamble`] always places every configured system string ahead of the whole
//! conversation, in configured order.
//!
//! ## External interactions
//!
//! - **Completion APIs**: [`ChatMessage`] serialises to one element of the `messages` array
//!   (`{"role": "...", "content": "..."}`).

use serde::{Deserialize, Serialize};

/// Role of a message, one-to-one with the API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single chat turn, one-to-one with one element of the API `messages` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// User turn for messages written by anyone but the bot; assistant turn for the bot's own.
    pub fn from_author(is_bot: bool, content: impl Into<String>) -> Self {
        if is_bot {
            Self::assistant(content)
        } else {
            Self::user(content)
        }
    }
}

/// Returns `preamble` as system turns (configured order) followed by `conversation` unchanged.
///
/// Only the preamble is moved to the front; turns inside `conversation` (system or not) keep
/// their positions after it.
pub fn with_system_preamble<P, S>(preamble: P, conversation: Vec<ChatMessage>) -> Vec<ChatMessage>
where
    P: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut messages: Vec<ChatMessage> = preamble
        .into_iter()
        .map(|s| ChatMessage::system(s.as_ref()))
        .collect();
    messages.reserve(conversation.len());
    messages.extend(conversation);
    messages
}
