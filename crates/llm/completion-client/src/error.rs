use thiserror::Error;

/// Failures of one streaming completion call.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Request could not be sent or the connection could not be established.
    #[error("failed to send completion request: {0}")]
    Dispatch(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("completion endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport failure while reading the response body.
    #[error("failed to read completion stream: {0}")]
    Read(#[from] std::io::Error),

    /// One streamed line is not a valid chunk.
    #[error("failed to decode completion chunk: {0}")]
    Decode(#[from] serde_json::Error),
}
