//! Section rendering.
//!
//! A section becomes a container with one child container per column.
//! Components are laid out round-robin across the columns and then
//! requested through the coordinator like any other render.

use crate::component::pending_element;
use crate::coordinator::{RenderCoordinator, RenderEvent, RenderRequest};
use crate::document::{DEFAULT_CONTAINER, Document, Element};
use crate::error::RenderResult;
use mediakit_model::{Component, Section};
use mediakit_types::{Priority, RenderKey, SectionId};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

pub fn section_container_id(section_id: &SectionId) -> String {
    format!("section-{section_id}")
}

pub fn column_container_id(section_id: &SectionId, column: usize) -> String {
    format!("section-{section_id}-col-{column}")
}

/// Column a component at `index` goes into.
pub fn column_for(index: usize, columns: usize) -> usize {
    index % columns.max(1)
}

pub(crate) fn render_section(
    document: &Mutex<Document>,
    section: &Section,
    components: &[Component],
    priority: Priority,
    coordinator: &RenderCoordinator,
) -> RenderResult<()> {
    let section_id = &section.section_id;
    let container = section_container_id(section_id);
    let columns = section.section_type.column_count();
    let class = format!("gmkb-section gmkb-section--{}", section.section_type);

    let stale = {
        let mut doc = document.lock().unwrap_or_else(|p| p.into_inner());
        doc.ensure_container(&container, Some(DEFAULT_CONTAINER), &class);

        // Lift out everything currently in the columns, plus any of this
        // section's components living elsewhere, then lay them out again.
        let mut existing: HashMap<String, Element> = HashMap::new();
        for child in doc.child_containers(&container) {
            for element in doc.clear_container(&child) {
                existing.insert(element.id.clone(), element);
            }
        }
        for component in components {
            if let Some(element) = doc.remove(component.id.as_str()) {
                existing.insert(element.id.clone(), element);
            }
        }

        for child in doc.child_containers(&container) {
            let keep = (0..columns).any(|n| column_container_id(section_id, n) == child);
            if !keep {
                doc.remove_container(&child);
            }
        }
        for n in 0..columns {
            doc.ensure_container(
                &column_container_id(section_id, n),
                Some(&container),
                "gmkb-section__column",
            );
        }

        for (index, component) in components.iter().enumerate() {
            let column = column_container_id(section_id, column_for(index, columns));
            let element = existing
                .remove(component.id.as_str())
                .unwrap_or_else(|| pending_element(component));
            doc.insert_or_replace(&column, element);
        }
        existing.into_values().collect::<Vec<_>>()
    };

    // Elements that no longer belong here were dropped from the document;
    // let their keys render again wherever they end up.
    for element in stale {
        coordinator.invalidate(&RenderKey::component(&element.component_type, &element.id));
    }

    for component in components {
        coordinator.request(
            RenderRequest::component(component.clone())
                .with_priority(priority)
                .with_source(format!("section:{section_id}")),
        );
    }

    debug!(section_id = %section_id, columns, components = components.len(), "section rendered");
    coordinator.publish(RenderEvent::SectionRendered {
        section_id: section_id.clone(),
        components: components.len(),
    });
    Ok(())
}
