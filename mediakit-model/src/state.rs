use crate::{Component, GlobalSettings, ModelResult, Section};
use mediakit_types::{ComponentId, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version stamped on freshly created state trees.
pub const STATE_VERSION: &str = "3.0.0";

fn default_theme() -> String {
    "default".to_string()
}

fn default_version() -> String {
    STATE_VERSION.to_string()
}

/// The complete media kit tree as saved to and loaded from WordPress.
///
/// `layout` is the page order of unsectioned rendering; `sections` carry
/// their own ordered component lists. Both orders survive a JSON round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaKitState {
    #[serde(default)]
    pub components: BTreeMap<ComponentId, Component>,
    #[serde(default)]
    pub layout: Vec<ComponentId>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub global_settings: GlobalSettings,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for MediaKitState {
    fn default() -> Self {
        Self {
            components: BTreeMap::new(),
            layout: Vec::new(),
            sections: Vec::new(),
            global_settings: GlobalSettings::default(),
            theme: default_theme(),
            version: default_version(),
        }
    }
}

impl MediaKitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes the full tree to a JSON string.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON string produced by [`to_json`](Self::to_json) or by the
    /// WordPress save handler.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: &ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| &s.section_id == id)
    }

    pub fn section_mut(&mut self, id: &SectionId) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| &s.section_id == id)
    }

    /// The section currently listing `id`, if any.
    pub fn section_of(&self, id: &ComponentId) -> Option<&Section> {
        self.sections.iter().find(|s| s.contains(id))
    }

    /// Components in layout order, skipping dangling ids.
    pub fn components_in_layout(&self) -> impl Iterator<Item = &Component> {
        self.layout.iter().filter_map(|id| self.components.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.sections.is_empty()
    }
}
