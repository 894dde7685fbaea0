//! Context assembly: turns an inbound message, or a reply thread and its parent channel, into the
//! chronological turn list sent with a completion request.
//!
//! System preamble turns are not added here; [`completion_client::CompletionRequest::new`] puts
//! them ahead of whatever this module returns.

use prompt::ChatMessage;
use relay_core::{Bot, ChannelInfo, HistoryMessage, InboundMessage, RelayError, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Messages fetched from the thread itself.
pub const THREAD_HISTORY_LIMIT: u8 = 100;
/// Recent parent-channel messages searched for the thread's anchor.
pub const ANCHOR_SEARCH_LIMIT: u8 = 15;

/// Context for a brand-new conversation: one user turn with the message text.
pub fn single_message_context(message: &InboundMessage) -> Vec<ChatMessage> {
    vec![ChatMessage::user(message.content.clone())]
}

/// Converts a newest-first history page into chronological turns. Only plain messages are kept;
/// the bot's own messages become assistant turns.
pub fn conversation_from_history(
    history: &[HistoryMessage],
    bot_user_id: &str,
) -> Vec<ChatMessage> {
    history
        .iter()
        .rev()
        .filter(|m| m.kind.is_default())
        .map(|m| ChatMessage::from_author(m.author_id == bot_user_id, m.content.clone()))
        .collect()
}

/// The parent-channel message that spawned `thread_id`, scanning newest to oldest.
pub fn find_anchor<'a>(
    parent_history: &'a [HistoryMessage],
    thread_id: &str,
) -> Option<&'a HistoryMessage> {
    parent_history
        .iter()
        .find(|m| m.thread_id.as_deref() == Some(thread_id))
}

/// Rebuilds thread conversations through the platform's history API.
#[derive(Clone)]
pub struct ContextAssembler {
    bot: Arc<dyn Bot>,
}

impl ContextAssembler {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }

    /// Thread history (oldest first) with the anchor message from `parent_id` prepended as a user
    /// turn when it is still within the recent window.
    ///
    /// Any fetch failure is a [`RelayError::ContextRetrieval`]; no partial context is returned.
    #[instrument(skip(self, thread, bot_user_id), fields(thread_id = %thread.id))]
    pub async fn thread_context(
        &self,
        thread: &ChannelInfo,
        parent_id: &str,
        bot_user_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        let history = self
            .bot
            .fetch_messages(&thread.id, THREAD_HISTORY_LIMIT, None)
            .await
            .map_err(|e| {
                RelayError::ContextRetrieval(format!(
                    "thread {} history: {}",
                    thread.id, e
                ))
            })?;
        let conversation = conversation_from_history(&history, bot_user_id);
        debug!(
            fetched = history.len(),
            kept = conversation.len(),
            "step: thread history converted"
        );

        let parent = self.bot.fetch_channel(parent_id).await.map_err(|e| {
            RelayError::ContextRetrieval(format!("parent channel {}: {}", parent_id, e))
        })?;

        let anchor = if parent.last_message_id.is_some() {
            let recent = self
                .bot
                .fetch_messages(&parent.id, ANCHOR_SEARCH_LIMIT, None)
                .await
                .map_err(|e| {
                    RelayError::ContextRetrieval(format!(
                        "parent channel {} history: {}",
                        parent.id, e
                    ))
                })?;
            find_anchor(&recent, &thread.id).map(|m| m.content.clone())
        } else {
            None
        };

        let mut messages = Vec::with_capacity(conversation.len() + 1);
        match anchor {
            Some(content) => {
                info!(parent_id = %parent.id, "step: anchor message found");
                messages.push(ChatMessage::user(content));
            }
            None => {
                warn!(
                    parent_id = %parent.id,
                    window = ANCHOR_SEARCH_LIMIT,
                    "Anchor message not found in recent parent history; continuing without it"
                );
            }
        }
        messages.extend(conversation);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::MessageKind;

    fn msg(id: &str, author: &str, kind: MessageKind, content: &str) -> HistoryMessage {
        HistoryMessage {
            id: id.into(),
            author_id: author.into(),
            kind,
            content: content.into(),
            thread_id: None,
        }
    }

    #[test]
    fn test_single_message_context() {
        let message = InboundMessage {
            id: "1".into(),
            channel_id: "c".into(),
            author_id: "u".into(),
            kind: MessageKind::Default,
            content: "Hello".into(),
        };
        assert_eq!(single_message_context(&message), vec![ChatMessage::user("Hello")]);
    }

    #[test]
    fn test_history_is_reversed_filtered_and_classified() {
        // Newest first, as returned by the platform.
        let history = vec![
            msg("4", "user-1", MessageKind::Default, "thanks"),
            msg("3", "bot", MessageKind::Default, "answer"),
            msg("2", "user-1", MessageKind::Other(6), "pinned a message"),
            msg("1", "user-1", MessageKind::Default, "question"),
        ];

        let turns = conversation_from_history(&history, "bot");

        assert_eq!(
            turns,
            vec![
                ChatMessage::user("question"),
                ChatMessage::assistant("answer"),
                ChatMessage::user("thanks"),
            ]
        );
    }

    #[test]
    fn test_find_anchor_picks_matching_thread() {
        let mut anchor = msg("10", "user-1", MessageKind::Default, "original question");
        anchor.thread_id = Some("t-1".into());
        let mut other = msg("11", "user-2", MessageKind::Default, "other");
        other.thread_id = Some("t-2".into());
        let parent = vec![other, msg("12", "user-3", MessageKind::Default, "chatter"), anchor];

        assert_eq!(find_anchor(&parent, "t-1").unwrap().content, "original question");
        assert!(find_anchor(&parent, "t-3").is_none());
    }
}
