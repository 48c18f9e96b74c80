//! Core type definitions for the media kit builder.
//!
//! This crate defines the fundamental types shared by every other crate:
//! - Component and section identifiers (validated strings)
//! - Render keys (`"type:id"`) used to deduplicate render requests
//! - Millisecond timestamps
//! - A typed publish/subscribe bus used instead of DOM custom events
//!
//! Component payloads, schemas and the state tree live in `mediakit-model`.

pub mod bus;
mod ids;
mod key;
mod timestamp;

pub use bus::EventBus;
pub use ids::{ComponentId, SectionId, MAX_ID_LEN};
pub use key::{Priority, RenderKey, RenderKind};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid id {0:?}: expected 1-100 chars of [a-zA-Z0-9_-]")]
    InvalidId(String),

    #[error("invalid render key {0:?}: expected \"type:id\"")]
    InvalidRenderKey(String),
}
