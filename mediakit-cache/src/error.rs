use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server answered with `success: false`.
    #[error("template batch rejected by server: {0}")]
    Rejected(String),

    #[error("template batch has no version")]
    MissingVersion,
}
