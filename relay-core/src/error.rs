use thiserror::Error;

/// Error taxonomy for the relay. Startup errors (`Config`, `Connection`) end the process;
/// every other variant is contained in the single reply attempt that raised it.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Context retrieval error: {0}")]
    ContextRetrieval(String),

    #[error("Thread creation error: {0}")]
    ThreadCreation(String),

    #[error("Placeholder error: {0}")]
    Placeholder(String),

    #[error("Request dispatch error: {0}")]
    RequestDispatch(String),

    #[error("Stream read error: {0}")]
    StreamRead(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Edit error: {0}")]
    Edit(String),

    /// Raw failure of a platform call, before the caller classifies it.
    #[error("Bot error: {0}")]
    Bot(String),
}

impl RelayError {
    /// True for errors that must stop the process rather than a single reply attempt.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(self, RelayError::Config(_) | RelayError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
