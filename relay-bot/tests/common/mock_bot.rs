//! Mock implementation of [`relay_core::Bot`] for integration tests.
//!
//! Records every platform call so tests can assert on the placeholder, the edit sequence and the
//! thread that was started, without talking to Discord. Channels and histories are preset.

use async_trait::async_trait;
use relay_core::{Bot, ChannelInfo, HistoryMessage, MessageKind, RelayError, ReplyTarget, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::time::Instant;

/// One recorded `send_message(channel_id, text)`.
#[derive(Debug, Clone)]
pub struct SendRecord {
    pub channel_id: String,
    pub message_id: String,
    pub text: String,
}

/// One recorded `edit_message(target, text)` with the (possibly paused) tokio clock.
#[derive(Debug, Clone)]
pub struct EditRecord {
    pub target: ReplyTarget,
    pub text: String,
    pub at: Instant,
}

/// One recorded `start_thread(...)`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ThreadRecord {
    pub channel_id: String,
    pub anchor_message_id: String,
    pub title: String,
    pub auto_archive_minutes: u16,
    pub thread_id: String,
}

/// One recorded `fetch_messages(channel_id, limit, before)`.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct FetchRecord {
    pub channel_id: String,
    pub limit: u8,
    pub before: Option<String>,
}

#[derive(Default)]
pub struct MockBot {
    next_id: AtomicU64,
    channels: Mutex<HashMap<String, ChannelInfo>>,
    histories: Mutex<HashMap<String, Vec<HistoryMessage>>>,
    pub sends: Mutex<Vec<SendRecord>>,
    pub edits: Mutex<Vec<EditRecord>>,
    pub threads: Mutex<Vec<ThreadRecord>>,
    pub fetches: Mutex<Vec<FetchRecord>>,
    pub fail_send: AtomicBool,
    pub fail_edit: AtomicBool,
    pub fail_start_thread: AtomicBool,
    pub fail_fetch_messages: AtomicBool,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Default::default()
        }
    }

    pub fn add_channel(&self, info: ChannelInfo) {
        self.channels.lock().unwrap().insert(info.id.clone(), info);
    }

    /// Registers a thread channel under `parent_id`.
    pub fn add_thread(&self, thread_id: &str, parent_id: &str) {
        self.add_channel(ChannelInfo {
            id: thread_id.into(),
            is_thread: true,
            parent_id: Some(parent_id.into()),
            last_message_id: None,
        });
    }

    /// Registers a text channel; `last_message_id` is set when the channel has messages.
    pub fn add_text_channel(&self, channel_id: &str, has_messages: bool) {
        self.add_channel(ChannelInfo {
            id: channel_id.into(),
            is_thread: false,
            parent_id: None,
            last_message_id: has_messages.then(|| "last".to_string()),
        });
    }

    /// Presets the history of `channel_id`, newest first.
    pub fn set_history(&self, channel_id: &str, newest_first: Vec<HistoryMessage>) {
        self.histories
            .lock()
            .unwrap()
            .insert(channel_id.into(), newest_first);
    }

    pub fn sends(&self) -> Vec<SendRecord> {
        self.sends.lock().unwrap().clone()
    }

    pub fn edits(&self) -> Vec<EditRecord> {
        self.edits.lock().unwrap().clone()
    }

    pub fn edit_texts(&self) -> Vec<String> {
        self.edits().into_iter().map(|e| e.text).collect()
    }

    pub fn threads(&self) -> Vec<ThreadRecord> {
        self.threads.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<FetchRecord> {
        self.fetches.lock().unwrap().clone()
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

/// Plain history message helper.
#[allow(dead_code)]
pub fn history(id: &str, author_id: &str, content: &str) -> HistoryMessage {
    HistoryMessage {
        id: id.into(),
        author_id: author_id.into(),
        kind: MessageKind::Default,
        content: content.into(),
        thread_id: None,
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(RelayError::Bot("send rejected".into()));
        }
        let message_id = self.next_id();
        self.sends.lock().unwrap().push(SendRecord {
            channel_id: channel_id.into(),
            message_id: message_id.clone(),
            text: text.into(),
        });
        Ok(message_id)
    }

    async fn edit_message(&self, target: &ReplyTarget, text: &str) -> Result<()> {
        if self.fail_edit.load(Ordering::SeqCst) {
            return Err(RelayError::Bot("edit rejected".into()));
        }
        self.edits.lock().unwrap().push(EditRecord {
            target: target.clone(),
            text: text.into(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn start_thread(
        &self,
        channel_id: &str,
        anchor_message_id: &str,
        title: &str,
        auto_archive_minutes: u16,
    ) -> Result<String> {
        if self.fail_start_thread.load(Ordering::SeqCst) {
            return Err(RelayError::Bot("missing permissions".into()));
        }
        let thread_id = self.next_id();
        self.threads.lock().unwrap().push(ThreadRecord {
            channel_id: channel_id.into(),
            anchor_message_id: anchor_message_id.into(),
            title: title.into(),
            auto_archive_minutes,
            thread_id: thread_id.clone(),
        });
        Ok(thread_id)
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.channels
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .ok_or_else(|| RelayError::Bot(format!("unknown channel {}", channel_id)))
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> Result<Vec<HistoryMessage>> {
        self.fetches.lock().unwrap().push(FetchRecord {
            channel_id: channel_id.into(),
            limit,
            before: before.map(str::to_string),
        });
        if self.fail_fetch_messages.load(Ordering::SeqCst) {
            return Err(RelayError::Bot("history unavailable".into()));
        }
        let all = self
            .histories
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default();
        Ok(all.into_iter().take(limit as usize).collect())
    }
}
