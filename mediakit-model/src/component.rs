use mediakit_types::{ComponentId, SectionId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn empty_props() -> Value {
    Value::Object(Map::new())
}

/// A single content block on the media kit page.
///
/// `props` holds the component's JSON payload; its shape is declared by the
/// [`ComponentSchema`](crate::ComponentSchema) registered for `component_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default = "empty_props", alias = "data")]
    pub props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Component {
    /// Creates a component with a generated id and empty props.
    pub fn new(component_type: impl Into<String>) -> Self {
        let component_type = component_type.into();
        Self::with_id(ComponentId::generate(&component_type), component_type)
    }

    /// Creates a component with an explicit id and empty props.
    pub fn with_id(id: ComponentId, component_type: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            component_type: component_type.into(),
            props: empty_props(),
            section_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style props setter.
    #[must_use]
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    /// Shallow-merges `updates` into `props` and bumps `updated_at`.
    ///
    /// Non-object props are replaced by the update object.
    pub fn merge_props(&mut self, updates: &Map<String, Value>) {
        match self.props.as_object_mut() {
            Some(props) => {
                for (k, v) in updates {
                    props.insert(k.clone(), v.clone());
                }
            }
            None => self.props = Value::Object(updates.clone()),
        }
        self.updated_at = Timestamp::now();
    }

    /// Extract a string prop using a JSON pointer (e.g., "/title").
    pub fn get_str(&self, pointer: &str) -> Option<&str> {
        self.props.pointer(pointer).and_then(|v| v.as_str())
    }

    /// Extract a boolean prop using a JSON pointer.
    pub fn get_bool(&self, pointer: &str) -> Option<bool> {
        self.props.pointer(pointer).and_then(|v| v.as_bool())
    }

    /// Extract a numeric prop using a JSON pointer.
    pub fn get_number(&self, pointer: &str) -> Option<f64> {
        self.props.pointer(pointer).and_then(|v| v.as_f64())
    }
}
