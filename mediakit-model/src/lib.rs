//! Core data model for the media kit builder.
//!
//! Defines the types every other subsystem depends on:
//! - [`Component`]: a content block (hero, biography, ...) with a JSON props payload
//! - [`Section`]: a layout container owning an ordered list of component ids
//! - [`MediaKitState`]: the complete persisted tree (components, layout, sections, settings)
//! - [`ComponentSchema`]: declares a component type's props and validates them at the boundary
//! - [`validate_state`]: structural constraints checked before saving or after loading
//!
//! These types are the contract between the store, the renderers and the
//! WordPress persistence endpoints (via their JSON form).

mod component;
mod error;
mod schema;
mod section;
mod settings;
mod state;
mod validate;

pub use component::Component;
pub use error::{ModelError, ModelResult};
pub use schema::{ComponentSchema, PropField, PropType};
pub use section::{Section, SectionLayout};
pub use settings::{AdvancedSettings, GlobalSettings, LayoutSettings, ThemeSettings};
pub use state::{MediaKitState, STATE_VERSION};
pub use validate::{validate_state, Violation, MAX_COMPONENTS, MAX_TYPE_LEN};
