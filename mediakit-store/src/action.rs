//! Actions accepted by the store.
//!
//! The JSON form mirrors the transaction format used by the builder's
//! front-end: `{"type": "ADD_COMPONENT", "payload": {...}}`.

use mediakit_model::{Component, MediaKitState, Section, SectionLayout};
use mediakit_types::{ComponentId, SectionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a moved component goes within its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    Up,
    Down,
    Index(usize),
}

/// A state mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Adds a component, optionally into a section at a position.
    AddComponent {
        component: Component,
        #[serde(default)]
        section_id: Option<SectionId>,
        #[serde(default)]
        position: Option<usize>,
    },
    RemoveComponent {
        id: ComponentId,
    },
    /// Shallow-merges `props` into the component's props.
    UpdateComponent {
        id: ComponentId,
        props: Map<String, Value>,
    },
    /// Reorders within the owning section, or within the page layout for
    /// unsectioned components.
    MoveComponent {
        id: ComponentId,
        to: MoveTarget,
    },
    MoveToSection {
        id: ComponentId,
        section_id: SectionId,
        #[serde(default)]
        position: Option<usize>,
    },
    /// Copies a component and places the copy right after the original.
    DuplicateComponent {
        id: ComponentId,
        #[serde(default)]
        new_id: Option<ComponentId>,
    },
    SetLayout(Vec<ComponentId>),
    AddSection(Section),
    /// Removes a section; its components become unassigned.
    RemoveSection {
        section_id: SectionId,
    },
    UpdateSection {
        section_id: SectionId,
        layout: SectionLayout,
    },
    UpdateGlobalSettings(Map<String, Value>),
    SetTheme(String),
    SetState(Box<MediaKitState>),
    ClearAll,
    ResetState,
}

/// Payload-free discriminant of an [`Action`], carried in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    AddComponent,
    RemoveComponent,
    UpdateComponent,
    MoveComponent,
    MoveToSection,
    DuplicateComponent,
    SetLayout,
    AddSection,
    RemoveSection,
    UpdateSection,
    UpdateGlobalSettings,
    SetTheme,
    SetState,
    ClearAll,
    ResetState,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::AddComponent { .. } => ActionKind::AddComponent,
            Action::RemoveComponent { .. } => ActionKind::RemoveComponent,
            Action::UpdateComponent { .. } => ActionKind::UpdateComponent,
            Action::MoveComponent { .. } => ActionKind::MoveComponent,
            Action::MoveToSection { .. } => ActionKind::MoveToSection,
            Action::DuplicateComponent { .. } => ActionKind::DuplicateComponent,
            Action::SetLayout(_) => ActionKind::SetLayout,
            Action::AddSection(_) => ActionKind::AddSection,
            Action::RemoveSection { .. } => ActionKind::RemoveSection,
            Action::UpdateSection { .. } => ActionKind::UpdateSection,
            Action::UpdateGlobalSettings(_) => ActionKind::UpdateGlobalSettings,
            Action::SetTheme(_) => ActionKind::SetTheme,
            Action::SetState(_) => ActionKind::SetState,
            Action::ClearAll => ActionKind::ClearAll,
            Action::ResetState => ActionKind::ResetState,
        }
    }

    /// Shorthand for appending a component to the page.
    pub fn add(component: Component) -> Self {
        Action::AddComponent {
            component,
            section_id: None,
            position: None,
        }
    }

    /// Shorthand for appending a component to a section.
    pub fn add_to_section(component: Component, section_id: SectionId) -> Self {
        Action::AddComponent {
            component,
            section_id: Some(section_id),
            position: None,
        }
    }
}
