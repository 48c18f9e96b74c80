use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when data crosses the model boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid id: {0}")]
    InvalidId(#[from] mediakit_types::Error),

    #[error("unknown section layout: {0}")]
    UnknownLayout(String),

    #[error("invalid props for {component_type}.{field}: {reason}")]
    InvalidProps {
        component_type: String,
        field: String,
        reason: String,
    },

    #[error("state failed validation with {} violation(s)", .0.len())]
    InvalidState(Vec<crate::Violation>),
}
