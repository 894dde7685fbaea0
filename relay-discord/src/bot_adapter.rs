//! Wraps serenity's HTTP client and implements [`relay_core::Bot`]. Production code talks to
//! Discord through it; tests substitute another Bot impl.

use async_trait::async_trait;
use relay_core::{Bot, ChannelInfo, HistoryMessage, RelayError, ReplyTarget, Result};
use serenity::builder::{CreateMessage, CreateThread, EditMessage, GetMessages};
use serenity::http::Http;
use serenity::model::channel::AutoArchiveDuration;
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;

use crate::adapters::{channel_info, fit_message_length, parse_snowflake, DiscordMessageWrapper};

/// Nearest archive duration Discord accepts, rounding up.
pub fn auto_archive_duration(minutes: u16) -> AutoArchiveDuration {
    match minutes {
        0..=60 => AutoArchiveDuration::OneHour,
        61..=1440 => AutoArchiveDuration::OneDay,
        1441..=4320 => AutoArchiveDuration::ThreeDays,
        _ => AutoArchiveDuration::OneWeek,
    }
}

fn channel_id(id: &str) -> Result<ChannelId> {
    parse_snowflake(id).map(ChannelId::new)
}

fn message_id(id: &str) -> Result<MessageId> {
    parse_snowflake(id).map(MessageId::new)
}

fn bot_error(e: serenity::Error) -> RelayError {
    RelayError::Bot(e.to_string())
}

/// Thin wrapper around serenity's `Http` that implements relay-core's Bot trait.
pub struct DiscordBotAdapter {
    http: Arc<Http>,
}

impl DiscordBotAdapter {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Bot for DiscordBotAdapter {
    async fn send_message(&self, channel_id_str: &str, text: &str) -> Result<String> {
        let sent = channel_id(channel_id_str)?
            .send_message(
                &self.http,
                CreateMessage::new().content(fit_message_length(text)),
            )
            .await
            .map_err(bot_error)?;
        Ok(sent.id.to_string())
    }

    async fn edit_message(&self, target: &ReplyTarget, text: &str) -> Result<()> {
        channel_id(&target.channel_id)?
            .edit_message(
                &self.http,
                message_id(&target.message_id)?,
                EditMessage::new().content(fit_message_length(text)),
            )
            .await
            .map_err(bot_error)?;
        Ok(())
    }

    async fn start_thread(
        &self,
        channel_id_str: &str,
        anchor_message_id: &str,
        title: &str,
        auto_archive_minutes: u16,
    ) -> Result<String> {
        let thread = channel_id(channel_id_str)?
            .create_thread_from_message(
                &self.http,
                message_id(anchor_message_id)?,
                CreateThread::new(title)
                    .auto_archive_duration(auto_archive_duration(auto_archive_minutes)),
            )
            .await
            .map_err(bot_error)?;
        Ok(thread.id.to_string())
    }

    async fn fetch_channel(&self, channel_id_str: &str) -> Result<ChannelInfo> {
        let channel = channel_id(channel_id_str)?
            .to_channel(&self.http)
            .await
            .map_err(bot_error)?;
        Ok(channel_info(&channel))
    }

    async fn fetch_messages(
        &self,
        channel_id_str: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<HistoryMessage>> {
        let mut query = GetMessages::new().limit(limit);
        if let Some(before) = before {
            query = query.before(message_id(before)?);
        }
        let messages = channel_id(channel_id_str)?
            .messages(&self.http, query)
            .await
            .map_err(bot_error)?;
        Ok(messages
            .iter()
            .map(|m| DiscordMessageWrapper(m).to_history())
            .collect())
    }
}
