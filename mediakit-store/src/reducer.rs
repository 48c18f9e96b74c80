//! Pure state transitions.
//!
//! `apply` mutates a working copy of the state and reports whether the
//! action took effect. Returning `false` means the copy is discarded.

use crate::action::{Action, MoveTarget};
use mediakit_model::{Component, MediaKitState, Section};
use mediakit_types::{ComponentId, SectionId, Timestamp};
use std::collections::HashSet;
use tracing::debug;

pub(crate) fn apply(state: &mut MediaKitState, action: Action) -> bool {
    match action {
        Action::AddComponent {
            component,
            section_id,
            position,
        } => add_component(state, component, section_id, position),
        Action::RemoveComponent { id } => remove_component(state, &id),
        Action::UpdateComponent { id, props } => match state.component_mut(&id) {
            Some(component) => {
                component.merge_props(&props);
                true
            }
            None => missing_component("UPDATE_COMPONENT", &id),
        },
        Action::MoveComponent { id, to } => move_component(state, &id, to),
        Action::MoveToSection {
            id,
            section_id,
            position,
        } => move_to_section(state, &id, &section_id, position),
        Action::DuplicateComponent { id, new_id } => duplicate_component(state, &id, new_id),
        Action::SetLayout(ids) => set_layout(state, ids),
        Action::AddSection(section) => add_section(state, section),
        Action::RemoveSection { section_id } => remove_section(state, &section_id),
        Action::UpdateSection { section_id, layout } => match state.section_mut(&section_id) {
            Some(section) if section.section_type != layout => {
                section.section_type = layout;
                section.updated_at = Timestamp::now();
                true
            }
            Some(_) => false,
            None => missing_section("UPDATE_SECTION", &section_id),
        },
        Action::UpdateGlobalSettings(updates) => {
            if updates.is_empty() {
                return false;
            }
            state.global_settings.merge(&updates);
            true
        }
        Action::SetTheme(theme) => {
            if state.theme == theme {
                return false;
            }
            state.theme = theme;
            true
        }
        Action::SetState(next) => {
            *state = *next;
            true
        }
        Action::ClearAll => {
            if state.components.is_empty() && state.layout.is_empty() {
                return false;
            }
            state.components.clear();
            state.layout.clear();
            for section in &mut state.sections {
                section.components.clear();
            }
            true
        }
        Action::ResetState => {
            *state = MediaKitState::default();
            true
        }
    }
}

fn missing_component(action: &str, id: &ComponentId) -> bool {
    debug!(action, component_id = %id, "ignoring action for unknown component");
    false
}

fn missing_section(action: &str, id: &SectionId) -> bool {
    debug!(action, section_id = %id, "ignoring action for unknown section");
    false
}

fn add_component(
    state: &mut MediaKitState,
    mut component: Component,
    section_id: Option<SectionId>,
    position: Option<usize>,
) -> bool {
    if state.components.contains_key(&component.id) {
        debug!(component_id = %component.id, "ignoring duplicate component id");
        return false;
    }
    let id = component.id.clone();
    match section_id {
        Some(section_id) => {
            let Some(section) = state.section_mut(&section_id) else {
                return missing_section("ADD_COMPONENT", &section_id);
            };
            section.insert(id.clone(), position);
            component.section_id = Some(section_id);
            state.layout.push(id.clone());
        }
        None => {
            component.section_id = None;
            let at = position.unwrap_or(state.layout.len()).min(state.layout.len());
            state.layout.insert(at, id.clone());
        }
    }
    state.components.insert(id, component);
    true
}

fn remove_component(state: &mut MediaKitState, id: &ComponentId) -> bool {
    if state.components.remove(id).is_none() {
        return missing_component("REMOVE_COMPONENT", id);
    }
    state.layout.retain(|c| c != id);
    for section in &mut state.sections {
        section.remove(id);
    }
    true
}

fn move_within(list: &mut Vec<ComponentId>, id: &ComponentId, to: MoveTarget) -> bool {
    let Some(from) = list.iter().position(|c| c == id) else {
        return false;
    };
    let target = match to {
        MoveTarget::Up if from > 0 => from - 1,
        MoveTarget::Down if from + 1 < list.len() => from + 1,
        MoveTarget::Index(i) => i.min(list.len() - 1),
        _ => from,
    };
    if target == from {
        return false;
    }
    let item = list.remove(from);
    list.insert(target, item);
    true
}

fn move_component(state: &mut MediaKitState, id: &ComponentId, to: MoveTarget) -> bool {
    let Some(component) = state.components.get(id) else {
        return missing_component("MOVE_COMPONENT", id);
    };
    let owner = component.section_id.clone();
    match owner.and_then(|sid| state.sections.iter_mut().find(|s| s.section_id == sid)) {
        Some(section) => {
            let moved = move_within(&mut section.components, id, to);
            if moved {
                section.updated_at = Timestamp::now();
            }
            moved
        }
        None => move_within(&mut state.layout, id, to),
    }
}

fn move_to_section(
    state: &mut MediaKitState,
    id: &ComponentId,
    section_id: &SectionId,
    position: Option<usize>,
) -> bool {
    if !state.components.contains_key(id) {
        return missing_component("MOVE_TO_SECTION", id);
    }
    if state.section(section_id).is_none() {
        return missing_section("MOVE_TO_SECTION", section_id);
    }
    for section in &mut state.sections {
        if &section.section_id != section_id {
            section.remove(id);
        }
    }
    if let Some(section) = state.section_mut(section_id) {
        section.remove(id);
        section.insert(id.clone(), position);
    }
    if let Some(component) = state.component_mut(id) {
        component.section_id = Some(section_id.clone());
        component.updated_at = Timestamp::now();
    }
    true
}

fn duplicate_component(
    state: &mut MediaKitState,
    id: &ComponentId,
    new_id: Option<ComponentId>,
) -> bool {
    let Some(original) = state.components.get(id) else {
        return missing_component("DUPLICATE_COMPONENT", id);
    };
    let copy_id = new_id.unwrap_or_else(|| ComponentId::generate(&original.component_type));
    if state.components.contains_key(&copy_id) {
        debug!(component_id = %copy_id, "ignoring duplicate with existing id");
        return false;
    }
    let now = Timestamp::now();
    let mut copy = original.clone();
    copy.id = copy_id.clone();
    copy.created_at = now;
    copy.updated_at = now;

    let at = state.layout.iter().position(|c| c == id).map_or(state.layout.len(), |i| i + 1);
    state.layout.insert(at, copy_id.clone());
    if let Some(section_id) = copy.section_id.clone() {
        if let Some(section) = state.section_mut(&section_id) {
            let at = section.position(id).map(|i| i + 1);
            section.insert(copy_id.clone(), at);
        }
    }
    state.components.insert(copy_id, copy);
    true
}

fn set_layout(state: &mut MediaKitState, ids: Vec<ComponentId>) -> bool {
    let mut seen = HashSet::new();
    let valid: Vec<ComponentId> = ids
        .into_iter()
        .filter(|id| state.components.contains_key(id) && seen.insert(id.clone()))
        .collect();
    if valid == state.layout {
        return false;
    }
    state.layout = valid;
    true
}

fn add_section(state: &mut MediaKitState, mut section: Section) -> bool {
    if state.section(&section.section_id).is_some() {
        debug!(section_id = %section.section_id, "ignoring duplicate section id");
        return false;
    }
    let mut seen = HashSet::new();
    section
        .components
        .retain(|id| state.components.contains_key(id) && seen.insert(id.clone()));
    for id in &section.components {
        for other in &mut state.sections {
            other.remove(id);
        }
        if let Some(component) = state.components.get_mut(id) {
            component.section_id = Some(section.section_id.clone());
        }
    }
    state.sections.push(section);
    true
}

fn remove_section(state: &mut MediaKitState, section_id: &SectionId) -> bool {
    let Some(index) = state.sections.iter().position(|s| &s.section_id == section_id) else {
        return missing_section("REMOVE_SECTION", section_id);
    };
    let section = state.sections.remove(index);
    for id in &section.components {
        if let Some(component) = state.components.get_mut(id) {
            component.section_id = None;
        }
    }
    true
}
