use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Describes a component type's props for validation and editor panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    pub component_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub fields: Vec<PropField>,
}

/// A single declared prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropField {
    pub name: String,
    pub field_type: PropType,
    #[serde(default)]
    pub required: bool,
}

impl PropField {
    fn new(name: &str, field_type: PropType, required: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            required,
        }
    }

    /// Shorthand for a plain text field.
    pub fn text(name: &str, required: bool) -> Self {
        Self::new(name, PropType::Text, required)
    }

    /// Shorthand for an HTML-bearing text field.
    pub fn rich_text(name: &str) -> Self {
        Self::new(name, PropType::RichText, false)
    }

    pub fn url(name: &str) -> Self {
        Self::new(name, PropType::Url, false)
    }

    pub fn image(name: &str) -> Self {
        Self::new(name, PropType::Image, false)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, PropType::Number, false)
    }

    pub fn bool(name: &str) -> Self {
        Self::new(name, PropType::Bool, false)
    }

    pub fn list(name: &str) -> Self {
        Self::new(name, PropType::List, false)
    }

    pub fn object(name: &str) -> Self {
        Self::new(name, PropType::Object, false)
    }
}

/// The JSON shape a prop must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    Text,
    RichText,
    Url,
    Image,
    Number,
    Bool,
    List,
    Object,
}

impl PropType {
    /// Whether `value` has this shape. `null` never matches.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PropType::Text | PropType::RichText | PropType::Url => value.is_string(),
            // Media library picks arrive as either a URL or an attachment object.
            PropType::Image => value.is_string() || value.is_object(),
            PropType::Number => {
                value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            PropType::Bool => value.is_boolean(),
            PropType::List => value.is_array(),
            PropType::Object => value.is_object(),
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            PropType::Text => "a string",
            PropType::RichText => "an HTML string",
            PropType::Url => "a URL string",
            PropType::Image => "an image URL or attachment object",
            PropType::Number => "a number",
            PropType::Bool => "a boolean",
            PropType::List => "an array",
            PropType::Object => "an object",
        }
    }
}

impl ComponentSchema {
    pub fn new(component_type: &str, name: &str, category: &str) -> Self {
        Self {
            component_type: component_type.into(),
            name: name.into(),
            category: category.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field append.
    #[must_use]
    pub fn field(mut self, field: PropField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&PropField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validates a props payload.
    ///
    /// Props must be an object, required fields must be present and
    /// non-null, and declared fields must match their type. Undeclared keys
    /// are accepted so older saved data keeps loading.
    pub fn validate(&self, props: &Value) -> ModelResult<()> {
        let Some(obj) = props.as_object() else {
            return Err(self.invalid("<props>", "props must be a JSON object"));
        };
        for field in &self.fields {
            match obj.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(self.invalid(&field.name, "required field is missing"));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.field_type.accepts(value) => {
                    return Err(self.invalid(
                        &field.name,
                        &format!("expected {}", field.field_type.describe()),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &str, reason: &str) -> ModelError {
        ModelError::InvalidProps {
            component_type: self.component_type.clone(),
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
