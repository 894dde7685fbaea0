//! Streaming reply engine: posts a placeholder, streams the completion and edits the placeholder
//! with the growing answer.
//!
//! # Edit schedule
//!
//! The accumulate-and-tick loop races a periodic timer against the next response line with
//! `tokio::select!`:
//!
//! - **Tick** (every `edit_interval`, first one an interval after the request): overwrite the
//!   placeholder with the whole buffer. Skipped when nothing new arrived since the last edit.
//! - **Line**: decode and append. On the final chunk do one last edit and stop reading.
//!
//! The select is `biased` toward the tick, so a body that is always readable still gets progress
//! edits. Losing the race never drops bytes: [`ChunkStream::next_line`] is cancel safe and the
//! interrupted read resumes on the next iteration. While chunks arrive faster than the timer there
//! is at most one progress edit per interval; the final edit happens regardless of timer phase.
//!
//! # Failures
//!
//! Every terminal failure after the placeholder exists ends with exactly one best-effort edit to
//! [`ERROR_MARKER`]. Malformed lines are skipped. Nothing is retried.

use completion_client::{ChunkStream, CompletionChunk, CompletionClient, CompletionRequest};
use prompt::ChatMessage;
use relay_core::{Bot, RelayError, ReplyTarget, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{ChannelProfile, DEFAULT_EDIT_INTERVAL_SECS};

/// Text of the placeholder posted before the request is sent.
pub const PLACEHOLDER_TEXT: &str = "Processing your request...";
/// Fixed text the placeholder ends with when the attempt fails.
pub const ERROR_MARKER: &str = "😵 An error occurred in the bot";

/// Result of a reply that reached the final chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySummary {
    pub target: ReplyTarget,
    /// Full answer; equal to the text of the last edit.
    pub text: String,
    /// Successful edits including the final one.
    pub edits: usize,
    /// Lines skipped because they did not decode.
    pub skipped_lines: usize,
}

#[derive(Clone)]
pub struct StreamingReplyEngine {
    bot: Arc<dyn Bot>,
    client: CompletionClient,
    edit_interval: Duration,
}

impl StreamingReplyEngine {
    pub fn new(bot: Arc<dyn Bot>, client: CompletionClient) -> Self {
        Self {
            bot,
            client,
            edit_interval: Duration::from_secs(DEFAULT_EDIT_INTERVAL_SECS),
        }
    }

    /// Minimum spacing of progress edits. Must be non-zero.
    pub fn with_edit_interval(mut self, edit_interval: Duration) -> Self {
        self.edit_interval = edit_interval;
        self
    }

    /// Replies in `channel_id` with the completion for `conversation` under `profile`.
    ///
    /// Returns [`RelayError::Placeholder`] when the placeholder cannot be posted (nothing to edit),
    /// [`RelayError::RequestDispatch`] when the request fails, and the loop errors of
    /// [`run_edit_loop`] otherwise.
    #[instrument(skip(self, profile, conversation), fields(model = %profile.model_name))]
    pub async fn reply(
        &self,
        channel_id: &str,
        profile: &ChannelProfile,
        conversation: Vec<ChatMessage>,
    ) -> Result<ReplySummary> {
        let message_id = self
            .bot
            .send_message(channel_id, PLACEHOLDER_TEXT)
            .await
            .map_err(|e| {
                error!(error = %e, channel_id = %channel_id, "Failed to send placeholder message");
                RelayError::Placeholder(e.to_string())
            })?;
        let target = ReplyTarget::new(channel_id, message_id);
        info!(
            channel_id = %target.channel_id,
            message_id = %target.message_id,
            "step: placeholder posted"
        );

        let request = CompletionRequest::new(
            profile.model_name.clone(),
            &profile.system_role_messages,
            conversation,
        );
        log_turns(request.messages());

        let lines = match self
            .client
            .stream_chat(&profile.api_url, profile.auth_token(), &request)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                error!(error = %e, api_url = %profile.api_url, "Completion request failed");
                mark_failed(self.bot.as_ref(), &target).await;
                return Err(RelayError::RequestDispatch(e.to_string()));
            }
        };

        run_edit_loop(self.bot.as_ref(), target, lines, self.edit_interval).await
    }
}

fn log_turns(messages: &[ChatMessage]) {
    debug!(count = messages.len(), "submit_to_llm: turns submitted");
    for (i, m) in messages.iter().enumerate() {
        debug!(index = i, role = m.role.as_str(), content = %m.content, "submit_to_llm turn");
    }
}

/// Best-effort overwrite of the placeholder with [`ERROR_MARKER`].
async fn mark_failed(bot: &dyn Bot, target: &ReplyTarget) {
    if let Err(e) = bot.edit_message(target, ERROR_MARKER).await {
        error!(
            error = %e,
            channel_id = %target.channel_id,
            message_id = %target.message_id,
            "Failed to write error marker"
        );
    }
}

/// Buffer and edit bookkeeping for one reply target.
struct EditLoopState<'a> {
    bot: &'a dyn Bot,
    target: ReplyTarget,
    buffer: String,
    /// Buffer length at the last successful edit; the buffer is append-only.
    edited_len: usize,
    edits: usize,
    skipped_lines: usize,
}

impl<'a> EditLoopState<'a> {
    async fn edit_with_buffer(&mut self) -> Result<()> {
        self.bot
            .edit_message(&self.target, &self.buffer)
            .await
            .map_err(|e| RelayError::Edit(e.to_string()))?;
        self.edited_len = self.buffer.len();
        self.edits += 1;
        Ok(())
    }

    /// Timer tick: progress edit when there is unseen text.
    async fn on_tick(&mut self) -> Result<()> {
        if self.buffer.is_empty() || self.buffer.len() == self.edited_len {
            debug!(buffered = self.buffer.len(), "tick: nothing new, edit skipped");
            return Ok(());
        }
        debug!(buffered = self.buffer.len(), "tick: progress edit");
        self.edit_with_buffer().await
    }

    /// One line of the body. Returns true once the final chunk has been handled.
    async fn on_line(&mut self, line: &[u8]) -> Result<bool> {
        if line.iter().all(u8::is_ascii_whitespace) {
            return Ok(false);
        }
        let chunk = match CompletionChunk::from_line(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                let decode = RelayError::Decode(e.to_string());
                warn!(
                    error = %decode,
                    line = %String::from_utf8_lossy(line),
                    "Skipping malformed stream line"
                );
                self.skipped_lines += 1;
                return Ok(false);
            }
        };
        self.buffer.push_str(chunk.delta_text());
        if chunk.is_final() {
            self.edit_with_buffer().await?;
            return Ok(true);
        }
        Ok(false)
    }

    fn into_summary(self) -> ReplySummary {
        ReplySummary {
            target: self.target,
            text: self.buffer,
            edits: self.edits,
            skipped_lines: self.skipped_lines,
        }
    }
}

/// Accumulate-and-tick loop over an open response body. See the module docs for the schedule.
///
/// Ends with `Ok` after the final chunk's edit, or with [`RelayError::StreamRead`] (transport
/// error, or the body closed before a final chunk) / [`RelayError::Edit`] after one best-effort
/// edit of `target` to [`ERROR_MARKER`].
pub async fn run_edit_loop(
    bot: &dyn Bot,
    target: ReplyTarget,
    mut lines: ChunkStream,
    edit_interval: Duration,
) -> Result<ReplySummary> {
    let mut ticker = interval_at(Instant::now() + edit_interval, edit_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut state = EditLoopState {
        bot,
        target,
        buffer: String::new(),
        edited_len: 0,
        edits: 0,
        skipped_lines: 0,
    };

    let outcome: Result<()> = loop {
        tokio::select! {
            biased;

            _ = ticker.tick() => {
                if let Err(e) = state.on_tick().await {
                    break Err(e);
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => match state.on_line(&line).await {
                        Ok(true) => break Ok(()),
                        Ok(false) => {}
                        Err(e) => break Err(e),
                    },
                    Ok(None) => {
                        break Err(RelayError::StreamRead(
                            "stream closed before the final chunk".to_string(),
                        ));
                    }
                    Err(e) => break Err(RelayError::StreamRead(e.to_string())),
                }
            }
        }
    };

    match outcome {
        Ok(()) => {
            info!(
                channel_id = %state.target.channel_id,
                message_id = %state.target.message_id,
                reply_len = state.buffer.len(),
                edits = state.edits,
                skipped_lines = state.skipped_lines,
                "step: reply complete"
            );
            Ok(state.into_summary())
        }
        Err(e) => {
            error!(
                error = %e,
                channel_id = %state.target.channel_id,
                message_id = %state.target.message_id,
                buffered = state.buffer.len(),
                "Reply stream aborted"
            );
            mark_failed(bot, &state.target).await;
            Err(e)
        }
    }
}
