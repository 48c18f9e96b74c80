//! Error types for the WordPress client.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status other than `304`.
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The endpoint answered `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid state: {0}")]
    Model(#[from] mediakit_model::ModelError),

    #[error("template batch error: {0}")]
    Cache(#[from] mediakit_cache::CacheError),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ClientError>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether repeating the request could succeed: any transport failure
    /// and any non-success status. A rejection, a bad payload or a bad
    /// configuration fails the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Status { .. })
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Status { status, .. } => Some(*status),
            ClientError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}
