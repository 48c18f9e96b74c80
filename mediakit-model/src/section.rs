use crate::ModelError;
use mediakit_types::{ComponentId, SectionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column arrangement of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    #[default]
    FullWidth,
    TwoColumn,
    ThreeColumn,
    Grid,
    Hero,
}

impl SectionLayout {
    /// Number of column containers the section renders.
    pub const fn column_count(self) -> usize {
        match self {
            SectionLayout::FullWidth | SectionLayout::Hero => 1,
            SectionLayout::TwoColumn => 2,
            SectionLayout::ThreeColumn | SectionLayout::Grid => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SectionLayout::FullWidth => "full_width",
            SectionLayout::TwoColumn => "two_column",
            SectionLayout::ThreeColumn => "three_column",
            SectionLayout::Grid => "grid",
            SectionLayout::Hero => "hero",
        }
    }
}

impl fmt::Display for SectionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionLayout {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_width" => Ok(SectionLayout::FullWidth),
            "two_column" => Ok(SectionLayout::TwoColumn),
            "three_column" => Ok(SectionLayout::ThreeColumn),
            "grid" => Ok(SectionLayout::Grid),
            "hero" => Ok(SectionLayout::Hero),
            other => Err(ModelError::UnknownLayout(other.to_string())),
        }
    }
}

/// A layout container holding an ordered list of component ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_id: SectionId,
    #[serde(default)]
    pub section_type: SectionLayout,
    #[serde(default)]
    pub components: Vec<ComponentId>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Section {
    /// Creates an empty section with a generated id.
    pub fn new(layout: SectionLayout) -> Self {
        Self::with_id(SectionId::generate(), layout)
    }

    pub fn with_id(section_id: SectionId, layout: SectionLayout) -> Self {
        let now = Timestamp::now();
        Self {
            section_id,
            section_type: layout,
            components: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components.contains(id)
    }

    pub fn position(&self, id: &ComponentId) -> Option<usize> {
        self.components.iter().position(|c| c == id)
    }

    /// Inserts `id` at `position` (clamped), or appends. No-op if present.
    pub fn insert(&mut self, id: ComponentId, position: Option<usize>) -> bool {
        if self.contains(&id) {
            return false;
        }
        let at = position.unwrap_or(self.components.len()).min(self.components.len());
        self.components.insert(at, id);
        self.updated_at = Timestamp::now();
        true
    }

    /// Removes `id`; returns whether it was present.
    pub fn remove(&mut self, id: &ComponentId) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c != id);
        let removed = self.components.len() != before;
        if removed {
            self.updated_at = Timestamp::now();
        }
        removed
    }
}
