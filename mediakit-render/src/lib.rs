//! Rendering for the media kit builder.
//!
//! - [`ComponentRegistry`]: component type → renderer and prop schema
//! - [`RenderCoordinator`]: deduplicating render queue with a per-key
//!   state machine, so no component is ever rendered into the page twice
//! - [`Document`]: the in-memory preview the renders land in
//! - [`Preview`]: ties the three together and keeps the document in step
//!   with a [`MediaKitState`](mediakit_model::MediaKitState)

pub mod builtins;
mod component;
pub mod coordinator;
pub mod document;
mod error;
pub mod html;
mod preview;
pub mod registry;
pub mod section;

pub use coordinator::{
    BreakerState, CoordinatorConfig, PassReport, RenderCoordinator, RenderEvent, RenderPayload,
    RenderRequest, RenderState, RenderStats, RenderTarget, RequestOutcome,
};
pub use document::{Control, DEFAULT_CONTAINER, Document, Element, Placement};
pub use error::{RegistrationError, RenderError, RenderResult, TransitionError};
pub use preview::Preview;
pub use registry::{ComponentRegistry, ComponentRenderer, GenericRenderer, Registration, RenderOptions};
