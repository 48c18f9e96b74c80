use crate::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn yes() -> bool {
    true
}

/// One component type's template, as served by the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub html: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    /// Anything else the server sends along.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateEntry {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_time_ms: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response body of `GET /guestify/v1/templates/batch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBatch {
    #[serde(default = "yes")]
    pub success: bool,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateEntry>,
    #[serde(default)]
    pub presets: Map<String, Value>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub meta: BatchMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TemplateBatch {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            success: true,
            templates: BTreeMap::new(),
            presets: Map::new(),
            version: version.into(),
            meta: BatchMeta::default(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_template(mut self, component_type: &str, entry: TemplateEntry) -> Self {
        self.templates.insert(component_type.to_string(), entry);
        self
    }

    /// Parses a response body, rejecting unsuccessful or unversioned batches.
    pub fn from_json(body: &str) -> CacheResult<Self> {
        let batch: Self = serde_json::from_str(body)?;
        if !batch.success {
            return Err(CacheError::Rejected(
                batch.message.unwrap_or_else(|| "no message".to_string()),
            ));
        }
        if batch.version.is_empty() {
            return Err(CacheError::MissingVersion);
        }
        Ok(batch)
    }
}
