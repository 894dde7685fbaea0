//! Thread router: one inbound message → new reply thread, continued thread, or nothing.
//!
//! The platform adapter converts gateway events into [`GatewayEvent`] and calls
//! [`ThreadRouter::dispatch`]; the router itself never registers callbacks.

use prompt::ChatMessage;
use relay_core::{Bot, InboundMessage, RelayError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::config::{ChannelProfile, RelayConfig};
use crate::context::{single_message_context, ContextAssembler};
use crate::stream_reply::{ReplySummary, StreamingReplyEngine};

/// Characters of the message used as the new thread's title.
pub const THREAD_TITLE_MAX_CHARS: usize = 50;
/// Auto-archive duration for reply threads, in minutes.
pub const THREAD_AUTO_ARCHIVE_MINUTES: u16 = 60;

/// Gateway events the relay reacts to.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Session is ready; carries the bot's own user id.
    Ready { bot_user_id: String },
    MessageCreate(InboundMessage),
}

/// Why a message produced no reply attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Ready has not been seen yet, so the bot's own messages cannot be recognised.
    IdentityUnknown,
    OwnMessage,
    NotDefaultKind,
    EmptyContent,
    /// Neither the channel nor (for threads) its parent has a profile.
    UnconfiguredChannel,
    /// The thread holds no plain messages to answer.
    EmptyThread,
}

#[derive(Debug)]
pub enum RouteOutcome {
    Ignored(IgnoreReason),
    /// The reply streamed to completion in `reply_channel_id`.
    Replied {
        reply_channel_id: String,
        summary: ReplySummary,
    },
    /// A reply attempt started and was given up; the error has been logged.
    Abandoned(RelayError),
}

/// First [`THREAD_TITLE_MAX_CHARS`] characters of `content` (whole content when shorter).
pub fn thread_title(content: &str) -> String {
    content.chars().take(THREAD_TITLE_MAX_CHARS).collect()
}

#[derive(Clone)]
pub struct ThreadRouter {
    config: Arc<RelayConfig>,
    bot: Arc<dyn Bot>,
    assembler: ContextAssembler,
    engine: StreamingReplyEngine,
    bot_user_id: Arc<RwLock<Option<String>>>,
}

impl ThreadRouter {
    pub fn new(config: Arc<RelayConfig>, bot: Arc<dyn Bot>, engine: StreamingReplyEngine) -> Self {
        Self {
            config,
            assembler: ContextAssembler::new(bot.clone()),
            bot,
            engine,
            bot_user_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Records the bot's own user id (from the ready event).
    pub async fn set_bot_user_id(&self, id: impl Into<String>) {
        *self.bot_user_id.write().await = Some(id.into());
    }

    pub async fn bot_user_id(&self) -> Option<String> {
        self.bot_user_id.read().await.clone()
    }

    /// Typed entry point for the platform adapter. Returns the outcome for message events.
    pub async fn dispatch(&self, event: GatewayEvent) -> Option<RouteOutcome> {
        match event {
            GatewayEvent::Ready { bot_user_id } => {
                info!(bot_user_id = %bot_user_id, "Bot identity set from ready event");
                self.set_bot_user_id(bot_user_id).await;
                None
            }
            GatewayEvent::MessageCreate(message) => Some(self.route(&message).await),
        }
    }

    /// Routes one inbound message and runs the reply attempt to its end.
    #[instrument(skip(self, message), fields(channel_id = %message.channel_id, message_id = %message.id))]
    pub async fn route(&self, message: &InboundMessage) -> RouteOutcome {
        let Some(bot_user_id) = self.bot_user_id().await else {
            info!("step: bot identity not set yet; skip");
            return RouteOutcome::Ignored(IgnoreReason::IdentityUnknown);
        };
        if message.author_id == bot_user_id {
            return RouteOutcome::Ignored(IgnoreReason::OwnMessage);
        }
        if !message.kind.is_default() {
            return RouteOutcome::Ignored(IgnoreReason::NotDefaultKind);
        }
        if message.content.trim().is_empty() {
            info!("step: empty message content; skip");
            return RouteOutcome::Ignored(IgnoreReason::EmptyContent);
        }

        let result = match self.config.find_channel_profile(&message.channel_id) {
            Some(profile) => self.start_new_thread(message, profile).await,
            None => self.continue_thread(message, &bot_user_id).await,
        };

        match result {
            Ok(outcome) => {
                if let RouteOutcome::Replied { reply_channel_id, summary } = &outcome {
                    info!(
                        reply_channel_id = %reply_channel_id,
                        reply_len = summary.text.len(),
                        edits = summary.edits,
                        "step: reply finished"
                    );
                }
                outcome
            }
            Err(e) => {
                error!(error = %e, author_id = %message.author_id, "Reply attempt abandoned");
                RouteOutcome::Abandoned(e)
            }
        }
    }

    /// Message in a configured channel: open a thread on it and answer there.
    async fn start_new_thread(
        &self,
        message: &InboundMessage,
        profile: &ChannelProfile,
    ) -> Result<RouteOutcome> {
        let title = thread_title(&message.content);
        let thread_id = self
            .bot
            .start_thread(
                &message.channel_id,
                &message.id,
                &title,
                THREAD_AUTO_ARCHIVE_MINUTES,
            )
            .await
            .map_err(|e| RelayError::ThreadCreation(e.to_string()))?;
        info!(thread_id = %thread_id, title = %title, "step: reply thread started");

        self.reply_in(thread_id, profile, single_message_context(message))
            .await
    }

    /// Message in a thread whose parent channel is configured: rebuild the thread and answer in it.
    async fn continue_thread(
        &self,
        message: &InboundMessage,
        bot_user_id: &str,
    ) -> Result<RouteOutcome> {
        let channel = self.bot.fetch_channel(&message.channel_id).await.map_err(|e| {
            RelayError::ContextRetrieval(format!("channel {}: {}", message.channel_id, e))
        })?;
        if !channel.is_thread {
            return Ok(RouteOutcome::Ignored(IgnoreReason::UnconfiguredChannel));
        }
        let Some(parent_id) = channel.parent_id.as_deref() else {
            return Ok(RouteOutcome::Ignored(IgnoreReason::UnconfiguredChannel));
        };
        let Some(profile) = self.config.find_channel_profile(parent_id) else {
            return Ok(RouteOutcome::Ignored(IgnoreReason::UnconfiguredChannel));
        };

        let conversation = self
            .assembler
            .thread_context(&channel, parent_id, bot_user_id)
            .await?;
        if conversation.is_empty() {
            return Ok(RouteOutcome::Ignored(IgnoreReason::EmptyThread));
        }
        info!(
            parent_id = %parent_id,
            turns = conversation.len(),
            "step: continuing thread"
        );

        self.reply_in(channel.id.clone(), profile, conversation).await
    }

    async fn reply_in(
        &self,
        reply_channel_id: String,
        profile: &ChannelProfile,
        conversation: Vec<ChatMessage>,
    ) -> Result<RouteOutcome> {
        let summary = self
            .engine
            .reply(&reply_channel_id, profile, conversation)
            .await?;
        Ok(RouteOutcome::Replied {
            reply_channel_id,
            summary,
        })
    }
}
