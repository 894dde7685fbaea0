//! Wire envelope for the streaming chat endpoint: one request, many newline-delimited chunks.

use prompt::{with_system_preamble, ChatMessage};
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Request body: `{"model": ..., "stream": true, "messages": [...]}`.
///
/// Built once per call through [`CompletionRequest::new`], which puts the system preamble ahead
/// of the conversation. Fields are read-only after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    model: String,
    stream: bool,
    messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    /// Streaming request for `model`: every `system_preamble` entry as a system turn (configured order),
    /// followed by `conversation` in chronological order.
    pub fn new<P, S>(model: impl Into<String>, system_preamble: P, conversation: Vec<ChatMessage>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            model: model.into(),
            stream: true,
            messages: with_system_preamble(system_preamble, conversation),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// JSON encoding of the request body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Content part of a streamed line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: String,
}

/// One decoded line of the response: `{"done": bool, "message": {"content": "..."}}`.
///
/// Missing fields decode as `done = false` and empty content; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub message: ChunkMessage,
}

impl CompletionChunk {
    /// Decodes one line (without its trailing newline).
    pub fn from_line(line: &[u8]) -> Result<Self, CompletionError> {
        Ok(serde_json::from_slice(line)?)
    }

    /// True for the terminal chunk; nothing after it is read.
    pub fn is_final(&self) -> bool {
        self.done
    }

    /// Text to append to the answer.
    pub fn delta_text(&self) -> &str {
        &self.message.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialises_with_stream_true_and_preamble_first() {
        let request = CompletionRequest::new("m", ["be brief"], vec![ChatMessage::user("Hello")]);
        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "stream": true,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "Hello"}
                ]
            })
        );
    }

    #[test]
    fn test_chunk_decodes_delta_and_done() {
        let chunk = CompletionChunk::from_line(br#"{"done":false,"message":{"content":"hi"}}"#).unwrap();
        assert!(!chunk.is_final());
        assert_eq!(chunk.delta_text(), "hi");

        let last = CompletionChunk::from_line(
            br#"{"model":"llama3","created_at":"2024-01-01T00:00:00Z","message":{"role":"assistant","content":""},"done":true,"eval_count":12}"#,
        )
        .unwrap();
        assert!(last.is_final());
        assert_eq!(last.delta_text(), "");
    }

    #[test]
    fn test_chunk_missing_message_is_empty() {
        let chunk = CompletionChunk::from_line(br#"{"done":true}"#).unwrap();
        assert!(chunk.is_final());
        assert!(chunk.delta_text().is_empty());
    }

    #[test]
    fn test_chunk_malformed_is_decode_error() {
        let err = CompletionChunk::from_line(br#"{"garbage""#).unwrap_err();
        assert!(matches!(err, CompletionError::Decode(_)));
    }
}
