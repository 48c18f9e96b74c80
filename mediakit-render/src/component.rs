//! Component rendering into the preview document.

use crate::coordinator::{RenderCoordinator, RenderEvent};
use crate::document::{DEFAULT_CONTAINER, Document, Element};
use crate::error::RenderResult;
use crate::html;
use crate::registry::{ComponentRegistry, RenderOptions};
use mediakit_model::Component;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Container a component's element belongs in: wherever it already is,
/// else its section's first column, else the default container.
fn resolve_container(document: &Document, component: &Component) -> String {
    if let Some(current) = document.container_of(component.id.as_str()) {
        return current.to_string();
    }
    if let Some(section_id) = &component.section_id {
        let column = crate::section::column_container_id(section_id, 0);
        if document.has_container(&column) {
            return column;
        }
    }
    DEFAULT_CONTAINER.to_string()
}

fn wrap(component: &Component, markup: String, class: &str) -> Element {
    Element::new(component.id.as_str(), &component.component_type, markup)
        .with_attribute("class", class)
        .with_attribute("data-component-id", component.id.as_str())
        .with_attribute("data-component-type", &component.component_type)
}

/// Element shown while a component waits for its render.
pub(crate) fn pending_element(component: &Component) -> Element {
    wrap(
        component,
        "<div class=\"gmkb-component__loading\">Loading…</div>".to_string(),
        "gmkb-component gmkb-component--pending",
    )
}

fn produce(
    registry: &ComponentRegistry,
    component: &Component,
    options: &RenderOptions,
) -> RenderResult<String> {
    if let Some(schema) = registry.schema(&component.component_type) {
        schema.validate(&component.props)?;
    }
    registry
        .get_renderer(&component.component_type)
        .render(&component.props, options)
}

/// Renders `component` and places it in `document`.
///
/// A failure still leaves an error placeholder in the document so the
/// rest of the page is unaffected; the error is returned so the
/// coordinator marks the key failed.
pub(crate) fn render_component(
    registry: &ComponentRegistry,
    document: &Mutex<Document>,
    component: &Component,
    options: &RenderOptions,
    coordinator: &RenderCoordinator,
) -> RenderResult<()> {
    let options = RenderOptions {
        component_id: Some(component.id.clone()),
        ..options.clone()
    };
    let result = produce(registry, component, &options);

    let mut element = match &result {
        Ok(markup) => wrap(component, markup.clone(), "gmkb-component"),
        Err(error) => {
            warn!(component_id = %component.id, %error, "component render failed");
            wrap(
                component,
                format!(
                    "<div class=\"gmkb-render-error__message\">Failed to render {}: {}</div>",
                    html::escape(&component.component_type),
                    html::escape(&error.to_string())
                ),
                "gmkb-component gmkb-render-error",
            )
        }
    };

    let attached = {
        let mut doc = document.lock().unwrap_or_else(|p| p.into_inner());
        let container = resolve_container(&doc, component);
        if let Some(previous) = doc.find(component.id.as_str()) {
            element.controls = previous.controls.clone();
        }
        let placement = doc.insert_or_replace(&container, element);
        debug!(component_id = %component.id, container = %container, ?placement, "component placed");
        doc.attach_controls(component.id.as_str())
    };
    if attached {
        coordinator.publish(RenderEvent::ControlsAttached {
            element_id: component.id.to_string(),
        });
    }

    result.map(|_| ())
}
