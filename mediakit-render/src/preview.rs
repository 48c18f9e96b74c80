//! The builder preview: a document kept in step with the state tree.

use crate::component::render_component;
use crate::coordinator::{
    PassReport, RenderCoordinator, RenderPayload, RenderRequest, RenderTarget, RequestOutcome,
};
use crate::document::{DEFAULT_CONTAINER, Document};
use crate::error::{RenderError, RenderResult};
use crate::registry::{ComponentRegistry, RenderOptions};
use crate::section::{render_section, section_container_id};
use mediakit_model::{Component, MediaKitState};
use mediakit_types::{Priority, RenderKey};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// Render target that draws into an in-memory [`Document`].
pub struct Preview {
    registry: Arc<ComponentRegistry>,
    document: Mutex<Document>,
    options: RwLock<RenderOptions>,
}

impl Preview {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self {
            registry,
            document: Mutex::new(Document::new()),
            options: RwLock::new(RenderOptions {
                preview: true,
                ..RenderOptions::default()
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Locks the document. Do not hold the guard across a render pass.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn to_html(&self) -> String {
        self.document().to_html()
    }

    /// Queues renders for everything in `state` and prunes what is gone.
    ///
    /// Sections are always re-laid out so order and column changes apply.
    /// Components whose props changed must be invalidated by the caller
    /// (see [`invalidate_component`](Self::invalidate_component)).
    pub fn request_state(
        &self,
        state: &MediaKitState,
        coordinator: &RenderCoordinator,
        priority: Priority,
    ) -> usize {
        {
            let mut options = self.options.write().unwrap_or_else(|p| p.into_inner());
            options.theme = Some(state.theme.clone());
        }
        self.prune(state, coordinator);

        let mut queued = 0;
        for section in &state.sections {
            let components: Vec<Component> = section
                .components
                .iter()
                .filter_map(|id| state.component(id).cloned())
                .collect();
            let key = RenderKey::section(&section.section_id);
            coordinator.invalidate(&key);
            let outcome = coordinator.request(
                RenderRequest::section(section.clone(), components)
                    .with_priority(priority)
                    .with_source("state"),
            );
            queued += usize::from(outcome == RequestOutcome::Queued);
        }

        let mut order = Vec::new();
        for component in state.components_in_layout() {
            let sectioned = component
                .section_id
                .as_ref()
                .is_some_and(|sid| state.section(sid).is_some_and(|s| s.contains(&component.id)));
            if sectioned {
                continue;
            }
            order.push(component.id.as_str());
            let outcome = coordinator.request(
                RenderRequest::component(component.clone())
                    .with_priority(priority)
                    .with_source("state"),
            );
            queued += usize::from(outcome == RequestOutcome::Queued);
        }
        self.document().reorder(DEFAULT_CONTAINER, &order);
        queued
    }

    /// Requests and renders all of `state`, returning the combined report.
    pub fn render_state(&self, state: &MediaKitState, coordinator: &RenderCoordinator) -> PassReport {
        self.request_state(state, coordinator, Priority::Normal);
        let report = coordinator.process_until_idle(self);
        // Unsectioned components may have been appended out of layout order.
        let order: Vec<&str> = state.layout.iter().map(|id| id.as_str()).collect();
        self.document().reorder(DEFAULT_CONTAINER, &order);
        info!(
            rendered = report.rendered,
            failed = report.failed,
            "preview rendered"
        );
        report
    }

    /// Marks a component for re-rendering, e.g. after its props changed.
    pub fn invalidate_component(&self, component: &Component, coordinator: &RenderCoordinator) -> bool {
        coordinator.invalidate(&RenderKey::component(&component.component_type, &component.id))
    }

    /// Drops elements and section containers no longer present in `state`.
    fn prune(&self, state: &MediaKitState, coordinator: &RenderCoordinator) {
        let mut doc = self.document();
        let live_sections: HashSet<String> = state
            .sections
            .iter()
            .map(|s| section_container_id(&s.section_id))
            .collect();
        for container in doc.child_containers(DEFAULT_CONTAINER) {
            if live_sections.contains(&container) {
                continue;
            }
            let Some(removed) = doc.remove_container(&container) else {
                continue;
            };
            if let Some(id) = container.strip_prefix("section-") {
                coordinator.invalidate(&RenderKey::section(id));
            }
            for element in removed {
                coordinator.invalidate(&RenderKey::component(&element.component_type, &element.id));
            }
        }

        let stale: Vec<(String, String)> = doc
            .container_ids()
            .into_iter()
            .filter_map(|c| doc.container(c))
            .flat_map(|c| c.elements.iter())
            .filter(|e| !state.components.keys().any(|id| id.as_str() == e.id))
            .map(|e| (e.id.clone(), e.component_type.clone()))
            .collect();
        for (id, component_type) in stale {
            doc.remove(&id);
            coordinator.invalidate(&RenderKey::component(&component_type, &id));
            debug!(component_id = %id, "removed stale element");
        }
    }
}

impl RenderTarget for Preview {
    fn render(&self, request: &RenderRequest, coordinator: &RenderCoordinator) -> RenderResult<()> {
        let options = self
            .options
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        match &request.payload {
            RenderPayload::Component(component) => {
                if request.key != RenderKey::component(&component.component_type, &component.id) {
                    return Err(RenderError::PayloadMismatch(request.key.clone()));
                }
                render_component(&self.registry, &self.document, component, &options, coordinator)
            }
            RenderPayload::Section {
                section,
                components,
            } => {
                if request.key != RenderKey::section(&section.section_id) {
                    return Err(RenderError::PayloadMismatch(request.key.clone()));
                }
                render_section(&self.document, section, components, request.priority, coordinator)
            }
        }
    }
}
