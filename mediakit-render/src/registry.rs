//! Component registry.
//!
//! Maps component type names to renderers and optional prop schemas.
//! Unknown types resolve to a generic placeholder renderer so a page with
//! an unfamiliar component still renders.

use crate::error::{RegistrationError, RenderResult};
use crate::html;
use mediakit_model::ComponentSchema;
use mediakit_types::ComponentId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, warn};

/// Context passed to every renderer call.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Id of the component being rendered, when known.
    pub component_id: Option<ComponentId>,
    /// Theme name from the state tree.
    pub theme: Option<String>,
    /// Set when rendering inside the builder rather than for the public page.
    pub preview: bool,
}

/// Produces the inner markup of one component type.
pub trait ComponentRenderer: Send + Sync {
    fn render(&self, props: &Value, options: &RenderOptions) -> RenderResult<String>;
}

impl<F> ComponentRenderer for F
where
    F: Fn(&Value, &RenderOptions) -> RenderResult<String> + Send + Sync,
{
    fn render(&self, props: &Value, options: &RenderOptions) -> RenderResult<String> {
        self(props, options)
    }
}

/// Placeholder renderer for unregistered types.
#[derive(Debug, Clone)]
pub struct GenericRenderer {
    component_type: String,
}

impl GenericRenderer {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
        }
    }
}

impl ComponentRenderer for GenericRenderer {
    fn render(&self, _props: &Value, _options: &RenderOptions) -> RenderResult<String> {
        Ok(format!(
            "<div class=\"gmkb-component gmkb-generic\" data-component-type=\"{ty}\">\
             <h3 class=\"gmkb-generic__title\">{title}</h3>\
             <p class=\"gmkb-generic__notice\">No renderer is registered for this component.</p>\
             </div>",
            ty = html::escape(&self.component_type),
            title = html::escape(&html::capitalize(&self.component_type)),
        ))
    }
}

/// What gets registered for a component type.
#[derive(Clone, Default)]
pub struct Registration {
    /// `None` models metadata that arrived without an implementation.
    pub renderer: Option<Arc<dyn ComponentRenderer>>,
    pub schema: Option<ComponentSchema>,
}

impl Registration {
    pub fn new(renderer: impl ComponentRenderer + 'static) -> Self {
        Self {
            renderer: Some(Arc::new(renderer)),
            schema: None,
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: ComponentSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("renderer", &self.renderer.is_some())
            .field("schema", &self.schema)
            .finish()
    }
}

struct Entry {
    renderer: Arc<dyn ComponentRenderer>,
    schema: Option<ComponentSchema>,
}

/// Thread-safe registry of component renderers.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: RwLock<HashMap<String, Entry>>,
    errors: Mutex<Vec<RegistrationError>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the built-in components.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::builtins::register_all(&registry);
        registry
    }

    /// Registers `registration` under `component_type`, replacing any
    /// previous entry.
    ///
    /// Invalid registrations are recorded in [`errors`](Self::errors) and
    /// reported by returning `false`.
    pub fn register(&self, component_type: &str, registration: Registration) -> bool {
        let component_type = component_type.trim();
        let Registration { renderer, schema } = registration;
        let renderer = match renderer {
            _ if component_type.is_empty() => return self.reject(RegistrationError::EmptyType),
            None => {
                return self.reject(RegistrationError::MissingRenderer(
                    component_type.to_string(),
                ));
            }
            Some(renderer) => renderer,
        };
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        if entries
            .insert(component_type.to_string(), Entry { renderer, schema })
            .is_some()
        {
            debug!(component_type, "component renderer replaced");
        } else {
            debug!(component_type, "component renderer registered");
        }
        true
    }

    fn reject(&self, error: RegistrationError) -> bool {
        warn!(%error, "component registration rejected");
        self.errors
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(error);
        false
    }

    /// Renderer for `component_type`, or the generic fallback.
    ///
    /// Lookups trim the type name the same way [`register`](Self::register)
    /// does.
    pub fn get_renderer(&self, component_type: &str) -> Arc<dyn ComponentRenderer> {
        let component_type = component_type.trim();
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        match entries.get(component_type) {
            Some(entry) => Arc::clone(&entry.renderer),
            None => {
                debug!(component_type, "using generic renderer");
                Arc::new(GenericRenderer::new(component_type))
            }
        }
    }

    pub fn schema(&self, component_type: &str) -> Option<ComponentSchema> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.get(component_type.trim()).and_then(|e| e.schema.clone())
    }

    pub fn is_registered(&self, component_type: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        entries.contains_key(component_type.trim())
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        let mut types: Vec<String> = entries.keys().cloned().collect();
        types.sort();
        types
    }

    /// Every rejected registration so far.
    pub fn errors(&self) -> Vec<RegistrationError> {
        self.errors.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
