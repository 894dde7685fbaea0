//! # Completion client
//!
//! Streaming chat completion over HTTP with newline-delimited JSON responses
//! (`POST <endpoint>` → one `{"done": bool, "message": {"content": ...}}` object per line).
//! Provides token masking for safe logging, the request/chunk envelope, and a cancel-safe line reader.

mod chunk_stream;
mod error;
mod types;

pub use chunk_stream::ChunkStream;
pub use error::CompletionError;
pub use types::{ChunkMessage, CompletionChunk, CompletionRequest};

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// HTTP client for streaming completions. Cheap to clone; connections are pooled by reqwest.
#[derive(Clone, Default)]
pub struct CompletionClient {
    http: reqwest::Client,
}

impl CompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a client from an existing reqwest client (custom timeouts, proxies).
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sends `request` to `endpoint` and returns the open response body as a [`ChunkStream`].
    ///
    /// `Authorization: Bearer <token>` is attached only when `auth_token` is `Some`. Connection
    /// failures map to [`CompletionError::Dispatch`], non-success statuses to [`CompletionError::Status`].
    pub async fn stream_chat(
        &self,
        endpoint: &str,
        auth_token: Option<&str>,
        request: &CompletionRequest,
    ) -> Result<ChunkStream, CompletionError> {
        tracing::info!(
            endpoint = %endpoint,
            model = %request.model(),
            message_count = request.messages().len(),
            api_key = %auth_token.map(mask_token).unwrap_or_else(|| "<none>".to_string()),
            "completion stream request"
        );
        if let Ok(json) = request.to_json() {
            tracing::debug!(request_json = %json, "completion stream request JSON");
        }

        let mut builder = self.http.post(endpoint).json(request);
        if let Some(token) = auth_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ChunkStream::from_response(response))
    }
}
