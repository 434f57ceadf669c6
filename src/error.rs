//! Error type shared by the chat components.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// A required setting was absent or empty.
    #[error("{0} is not set")]
    MissingSetting(&'static str),

    #[error("failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    /// The request never got a response (connection, TLS, body decoding).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed API response: {0}")]
    MalformedResponse(String),

    #[error("embedding dimension mismatch: index holds {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("prompt template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;
