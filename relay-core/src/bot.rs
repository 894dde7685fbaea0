//! Chat platform session abstraction.
//!
//! [`Bot`] is transport-agnostic; relay-discord implements it over serenity. Ids are the
//! platform's ids rendered as strings.

use crate::error::Result;
use crate::types::{ChannelInfo, HistoryMessage, ReplyTarget};
use async_trait::async_trait;

/// Operations the reply pipeline needs from the chat platform. Shared across concurrent reply
/// tasks (`Arc<dyn Bot>`), so implementations must be thread-safe.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Posts `text` in `channel_id` and returns the new message id.
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String>;

    /// Replaces the content of an already-sent message.
    async fn edit_message(&self, target: &ReplyTarget, text: &str) -> Result<()>;

    /// Starts a thread on `anchor_message_id` in `channel_id`; returns the thread's channel id.
    async fn start_thread(
        &self,
        channel_id: &str,
        anchor_message_id: &str,
        title: &str,
        auto_archive_minutes: u16,
    ) -> Result<String>;

    /// Channel metadata: thread flag, parent channel, most recent message.
    async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo>;

    /// Up to `limit` messages of `channel_id`, newest first. With `before` set, only messages
    /// older than that id; otherwise starting from the most recent message.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<HistoryMessage>>;
}
