//! In-memory preview document.
//!
//! A small stand-in for the builder's DOM: named containers holding
//! ordered elements. Element ids are unique across the whole document;
//! inserting an element whose id already exists replaces it instead of
//! adding a second copy.

use crate::html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, trace};

/// Id of the root container every unsectioned component goes into.
pub const DEFAULT_CONTAINER: &str = "media-kit-preview";

/// Per-component action buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Control {
    Edit,
    MoveUp,
    MoveDown,
    Duplicate,
    Delete,
}

impl Control {
    /// The standard control set, in display order.
    pub const ALL: [Control; 5] = [
        Control::Edit,
        Control::MoveUp,
        Control::MoveDown,
        Control::Duplicate,
        Control::Delete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Control::Edit => "edit",
            Control::MoveUp => "move-up",
            Control::MoveDown => "move-down",
            Control::Duplicate => "duplicate",
            Control::Delete => "delete",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Control::Edit => "Edit",
            Control::MoveUp => "Move up",
            Control::MoveDown => "Move down",
            Control::Duplicate => "Duplicate",
            Control::Delete => "Delete",
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered component (or placeholder) in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub component_type: String,
    /// Inner markup produced by the renderer.
    pub html: String,
    /// Attributes of the wrapping element, besides `id`.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub controls: Vec<Control>,
}

impl Element {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>, html: String) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            html,
            attributes: BTreeMap::new(),
            controls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn to_html(&self) -> String {
        let attrs = html::attributes(
            std::iter::once(("id", self.id.as_str()))
                .chain(self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        );
        let mut out = format!("<div{attrs}>");
        if !self.controls.is_empty() {
            out.push_str("<div class=\"gmkb-controls\">");
            for control in &self.controls {
                out.push_str(&format!(
                    "<button type=\"button\" class=\"gmkb-control\" data-action=\"{}\" title=\"{}\"></button>",
                    control.as_str(),
                    control.label()
                ));
            }
            out.push_str("</div>");
        }
        out.push_str(&self.html);
        out.push_str("</div>");
        out
    }
}

/// A named slot elements are placed into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: String,
    pub parent: Option<String>,
    pub class: String,
    pub elements: Vec<Element>,
}

/// How [`Document::insert_or_replace`] placed an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Inserted,
    /// Replaced an existing element in the same container, keeping its slot.
    Replaced,
    /// An element with this id lived in another container and was moved.
    Moved,
}

/// Ordered set of containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    containers: Vec<Container>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding only the default container.
    pub fn new() -> Self {
        Self {
            containers: vec![Container {
                id: DEFAULT_CONTAINER.to_string(),
                parent: None,
                class: "gmkb-preview".to_string(),
                elements: Vec::new(),
            }],
        }
    }

    fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.iter_mut().find(|c| c.id == id)
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.id == id)
    }

    pub fn has_container(&self, id: &str) -> bool {
        self.container(id).is_some()
    }

    /// Creates a container if missing, or updates its class. Returns `true`
    /// when it was created.
    pub fn ensure_container(&mut self, id: &str, parent: Option<&str>, class: &str) -> bool {
        if let Some(existing) = self.container_mut(id) {
            existing.class = class.to_string();
            return false;
        }
        trace!(container = id, "container created");
        self.containers.push(Container {
            id: id.to_string(),
            parent: parent.map(str::to_string),
            class: class.to_string(),
            elements: Vec::new(),
        });
        true
    }

    /// Removes a container and its descendants, returning the elements
    /// they held. The default container cannot be removed.
    pub fn remove_container(&mut self, id: &str) -> Option<Vec<Element>> {
        if id == DEFAULT_CONTAINER || !self.has_container(id) {
            return None;
        }
        let mut doomed = vec![id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i].clone();
            doomed.extend(
                self.containers
                    .iter()
                    .filter(|c| c.parent.as_deref() == Some(current.as_str()))
                    .map(|c| c.id.clone()),
            );
            i += 1;
        }
        let mut removed = Vec::new();
        self.containers.retain_mut(|c| {
            if doomed.contains(&c.id) {
                removed.append(&mut c.elements);
                false
            } else {
                true
            }
        });
        debug!(container = id, containers = doomed.len(), "container removed");
        Some(removed)
    }

    /// Ids of the direct child containers of `id`.
    pub fn child_containers(&self, id: &str) -> Vec<String> {
        self.containers
            .iter()
            .filter(|c| c.parent.as_deref() == Some(id))
            .map(|c| c.id.clone())
            .collect()
    }

    /// Removes and returns every element of a container.
    pub fn clear_container(&mut self, id: &str) -> Vec<Element> {
        self.container_mut(id)
            .map(|c| std::mem::take(&mut c.elements))
            .unwrap_or_default()
    }

    /// Sorts a container's elements by their position in `order`. Elements
    /// not listed keep their relative order after the listed ones.
    pub fn reorder(&mut self, container: &str, order: &[&str]) {
        if let Some(c) = self.container_mut(container) {
            c.elements.sort_by_key(|e| {
                order
                    .iter()
                    .position(|id| *id == e.id)
                    .unwrap_or(usize::MAX)
            });
        }
    }

    /// Places `element` into `container`.
    ///
    /// An element with the same id anywhere in the document is replaced
    /// (same container) or moved (other container). Returns `None` when
    /// `container` does not exist.
    pub fn insert_or_replace(&mut self, container: &str, element: Element) -> Option<Placement> {
        if !self.has_container(container) {
            return None;
        }
        let existing = self.containers.iter().enumerate().find_map(|(ci, c)| {
            c.elements
                .iter()
                .position(|e| e.id == element.id)
                .map(|ei| (ci, ei))
        });
        let placement = match existing {
            Some((ci, ei)) if self.containers[ci].id == container => {
                self.containers[ci].elements[ei] = element;
                Placement::Replaced
            }
            Some((ci, ei)) => {
                self.containers[ci].elements.remove(ei);
                self.container_mut(container)?.elements.push(element);
                Placement::Moved
            }
            None => {
                self.container_mut(container)?.elements.push(element);
                Placement::Inserted
            }
        };
        Some(placement)
    }

    /// Removes an element by id.
    pub fn remove(&mut self, id: &str) -> Option<Element> {
        self.containers.iter_mut().find_map(|c| {
            let at = c.elements.iter().position(|e| e.id == id)?;
            Some(c.elements.remove(at))
        })
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        self.containers
            .iter()
            .flat_map(|c| c.elements.iter())
            .find(|e| e.id == id)
    }

    /// Id of the container holding element `id`.
    pub fn container_of(&self, id: &str) -> Option<&str> {
        self.containers
            .iter()
            .find(|c| c.elements.iter().any(|e| e.id == id))
            .map(|c| c.id.as_str())
    }

    /// Number of elements with this id. Anything other than 0 or 1 is a bug.
    pub fn count(&self, id: &str) -> usize {
        self.containers
            .iter()
            .flat_map(|c| c.elements.iter())
            .filter(|e| e.id == id)
            .count()
    }

    pub fn container_ids(&self) -> Vec<&str> {
        self.containers.iter().map(|c| c.id.as_str()).collect()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.containers.iter().map(|c| c.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches the standard controls to an element. Returns `true` only
    /// when controls were added, i.e. the first time for a given element.
    pub fn attach_controls(&mut self, id: &str) -> bool {
        let Some(element) = self
            .containers
            .iter_mut()
            .flat_map(|c| c.elements.iter_mut())
            .find(|e| e.id == id)
        else {
            return false;
        };
        if !element.controls.is_empty() {
            return false;
        }
        element.controls = Control::ALL.to_vec();
        true
    }

    /// Serializes the document, nesting child containers inside parents.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for root in self.containers.iter().filter(|c| c.parent.is_none()) {
            self.write_container(root, &mut out);
        }
        out
    }

    fn write_container(&self, container: &Container, out: &mut String) {
        out.push_str(&format!(
            "<div{}>",
            html::attributes([("id", container.id.as_str()), ("class", container.class.as_str())])
        ));
        for element in &container.elements {
            out.push_str(&element.to_html());
        }
        for child in self
            .containers
            .iter()
            .filter(|c| c.parent.as_deref() == Some(container.id.as_str()))
        {
            self.write_container(child, out);
        }
        out.push_str("</div>");
    }
}
