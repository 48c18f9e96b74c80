//! Render keys and priorities.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix reserved for section render keys.
const SECTION_PREFIX: &str = "section";

/// What a render key refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderKind {
    /// A component of the given type.
    Component { component_type: String },
    /// A layout section.
    Section,
}

/// Deduplication key for render requests, displayed as `"type:id"`.
///
/// Components use their component type as prefix; sections use the
/// reserved prefix `section`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RenderKey {
    kind: RenderKind,
    id: String,
}

impl RenderKey {
    /// Key for a component render.
    pub fn component(component_type: impl Into<String>, id: impl AsRef<str>) -> Self {
        Self {
            kind: RenderKind::Component {
                component_type: component_type.into(),
            },
            id: id.as_ref().to_string(),
        }
    }

    /// Key for a section render.
    pub fn section(id: impl AsRef<str>) -> Self {
        Self {
            kind: RenderKind::Section,
            id: id.as_ref().to_string(),
        }
    }

    pub fn kind(&self) -> &RenderKind {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `type` half of the key.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            RenderKind::Component { component_type } => component_type,
            RenderKind::Section => SECTION_PREFIX,
        }
    }

    pub fn is_section(&self) -> bool {
        matches!(self.kind, RenderKind::Section)
    }
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name(), self.id)
    }
}

impl FromStr for RenderKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, id) = s
            .split_once(':')
            .filter(|(ty, id)| !ty.is_empty() && !id.is_empty())
            .ok_or_else(|| Error::InvalidRenderKey(s.to_string()))?;
        if ty == SECTION_PREFIX {
            Ok(Self::section(id))
        } else {
            Ok(Self::component(ty, id))
        }
    }
}

impl TryFrom<String> for RenderKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RenderKey> for String {
    fn from(key: RenderKey) -> Self {
        key.to_string()
    }
}

/// Render priority. High-priority entries are drained first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    High,
}

impl Priority {
    /// Sort rank; lower drains first.
    pub const fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
        }
    }
}
