//! Structural validation of a [`MediaKitState`].
//!
//! Ids are already validated by their types during deserialization; these
//! checks cover cross-references and limits between the parts of the tree.

use crate::MediaKitState;
use mediakit_types::{ComponentId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Maximum number of components in one media kit.
pub const MAX_COMPONENTS: usize = 100;

/// Maximum length of a component type name.
pub const MAX_TYPE_LEN: usize = 50;

/// A single structural problem found in a state tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    TooManyComponents { count: usize },
    KeyMismatch { key: ComponentId, id: ComponentId },
    InvalidType { id: ComponentId },
    DuplicateLayoutEntry { id: ComponentId },
    DanglingLayoutEntry { id: ComponentId },
    DuplicateSection { section_id: SectionId },
    DanglingSectionEntry { section_id: SectionId, id: ComponentId },
    MultipleSections { id: ComponentId },
    SectionMismatch { id: ComponentId, section_id: SectionId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::TooManyComponents { count } => {
                write!(f, "{count} components exceeds the limit of {MAX_COMPONENTS}")
            }
            Violation::KeyMismatch { key, id } => {
                write!(f, "component stored under {key} has id {id}")
            }
            Violation::InvalidType { id } => {
                write!(f, "component {id} has an empty or over-long type")
            }
            Violation::DuplicateLayoutEntry { id } => write!(f, "{id} appears twice in layout"),
            Violation::DanglingLayoutEntry { id } => {
                write!(f, "layout references missing component {id}")
            }
            Violation::DuplicateSection { section_id } => {
                write!(f, "section {section_id} is defined twice")
            }
            Violation::DanglingSectionEntry { section_id, id } => {
                write!(f, "section {section_id} references missing component {id}")
            }
            Violation::MultipleSections { id } => {
                write!(f, "component {id} is listed in more than one section")
            }
            Violation::SectionMismatch { id, section_id } => {
                write!(f, "component {id} claims section {section_id} which does not list it")
            }
        }
    }
}

/// Checks every structural constraint and returns all violations found.
pub fn validate_state(state: &MediaKitState) -> Vec<Violation> {
    let mut violations = Vec::new();

    if state.components.len() > MAX_COMPONENTS {
        violations.push(Violation::TooManyComponents {
            count: state.components.len(),
        });
    }

    for (key, component) in &state.components {
        if key != &component.id {
            violations.push(Violation::KeyMismatch {
                key: key.clone(),
                id: component.id.clone(),
            });
        }
        let len = component.component_type.chars().count();
        if len == 0 || len > MAX_TYPE_LEN {
            violations.push(Violation::InvalidType { id: key.clone() });
        }
    }

    let mut seen_layout = HashSet::new();
    for id in &state.layout {
        if !seen_layout.insert(id) {
            violations.push(Violation::DuplicateLayoutEntry { id: id.clone() });
        }
        if !state.components.contains_key(id) {
            violations.push(Violation::DanglingLayoutEntry { id: id.clone() });
        }
    }

    let mut seen_sections = HashSet::new();
    let mut owner: HashMap<&ComponentId, &SectionId> = HashMap::new();
    for section in &state.sections {
        if !seen_sections.insert(&section.section_id) {
            violations.push(Violation::DuplicateSection {
                section_id: section.section_id.clone(),
            });
        }
        for id in &section.components {
            if !state.components.contains_key(id) {
                violations.push(Violation::DanglingSectionEntry {
                    section_id: section.section_id.clone(),
                    id: id.clone(),
                });
            }
            if owner.insert(id, &section.section_id).is_some() {
                violations.push(Violation::MultipleSections { id: id.clone() });
            }
        }
    }

    for component in state.components.values() {
        if let Some(section_id) = &component.section_id {
            if owner.get(&component.id) != Some(&section_id) {
                violations.push(Violation::SectionMismatch {
                    id: component.id.clone(),
                    section_id: section_id.clone(),
                });
            }
        }
    }

    violations
}
