//! Error types for rendering.

use crate::coordinator::RenderState;
use mediakit_model::ModelError;
use mediakit_types::RenderKey;
use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors raised while producing markup for a component or section.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A renderer reported a failure.
    #[error("renderer for {component_type} failed: {message}")]
    Renderer {
        component_type: String,
        message: String,
    },

    /// Props did not satisfy the registered schema.
    #[error("props rejected: {0}")]
    Props(#[from] ModelError),

    /// The request payload does not match its key.
    #[error("payload does not match render key {0}")]
    PayloadMismatch(RenderKey),

    /// A state machine transition was refused.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl RenderError {
    /// Shorthand used by renderer implementations.
    pub fn renderer(component_type: impl Into<String>, message: impl Into<String>) -> Self {
        RenderError::Renderer {
            component_type: component_type.into(),
            message: message.into(),
        }
    }
    /// Whether rendering again could succeed. Only renderer failures
    /// qualify; bad props or a mismatched payload fail the same way twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RenderError::Renderer { .. })
    }
}

/// A refused per-key state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render key {key}: cannot move from {from:?} to {to:?}")]
pub struct TransitionError {
    pub key: RenderKey,
    pub from: RenderState,
    pub to: RenderState,
}

/// Problems recorded by [`ComponentRegistry::register`](crate::ComponentRegistry::register).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("component type must not be empty")]
    EmptyType,

    #[error("registration for {0} has no renderer")]
    MissingRenderer(String),
}
