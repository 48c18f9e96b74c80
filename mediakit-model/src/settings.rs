//! Page-wide settings stored alongside the component tree.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Global settings block of a media kit.
///
/// Keys this crate does not model are kept in `extra` so they survive a
/// load/save cycle untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub theme: ThemeSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub advanced: AdvancedSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GlobalSettings {
    /// Shallow-merges a JSON object of updates.
    ///
    /// Known keys are re-parsed into their typed blocks; a typed block that
    /// fails to parse is kept unchanged. Unknown keys go to `extra`.
    pub fn merge(&mut self, updates: &Map<String, Value>) {
        for (key, value) in updates {
            match key.as_str() {
                "theme" => {
                    if let Ok(theme) = serde_json::from_value(value.clone()) {
                        self.theme = theme;
                    }
                }
                "layout" => {
                    if let Ok(layout) = serde_json::from_value(value.clone()) {
                        self.layout = layout;
                    }
                }
                "advanced" => {
                    if let Ok(advanced) = serde_json::from_value(value.clone()) {
                        self.advanced = advanced;
                    }
                }
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeSettings {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub font_size: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            primary_color: "#2196F3".to_string(),
            secondary_color: "#FFC107".to_string(),
            font_family: "system-ui, -apple-system, sans-serif".to_string(),
            font_size: "medium".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    pub max_width: String,
    pub spacing: String,
    pub alignment: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_width: "1200px".to_string(),
            spacing: "normal".to_string(),
            alignment: "center".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    #[serde(rename = "customCSS")]
    pub custom_css: String,
    #[serde(rename = "customJS")]
    pub custom_js: String,
}
