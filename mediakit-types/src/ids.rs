//! Identifier types for components and sections.
//!
//! Ids are plain strings restricted to `[a-zA-Z0-9_-]` so they can be used
//! verbatim as DOM ids and as render-key suffixes. Generated ids embed a
//! UUID v7, which keeps them unique and roughly time-ordered.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a component or section id.
pub const MAX_ID_LEN: usize = 100;

fn validate(raw: &str) -> Result<(), Error> {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidId(raw.to_string()))
    }
}

/// Unique identifier for a component within a media kit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentId(String);

impl ComponentId {
    /// Generates a fresh id of the form `<type>-<uuid>`.
    ///
    /// Characters of `component_type` outside the id alphabet are replaced
    /// with `-`, so any type name yields a valid id.
    #[must_use]
    pub fn generate(component_type: &str) -> Self {
        let prefix: String = component_type
            .chars()
            .take(40)
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
            .collect();
        let prefix = if prefix.is_empty() { "component".to_string() } else { prefix };
        Self(format!("{prefix}-{}", Uuid::now_v7().simple()))
    }

    /// Parses and validates a component id.
    pub fn parse(s: &str) -> Result<Self, Error> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ComponentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ComponentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<ComponentId> for String {
    fn from(id: ComponentId) -> Self {
        id.0
    }
}

impl AsRef<str> for ComponentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a layout section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId(String);

impl SectionId {
    /// Generates a fresh id of the form `section_<uuid>`.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("section_{}", Uuid::now_v7().simple()))
    }

    /// Parses and validates a section id.
    pub fn parse(s: &str) -> Result<Self, Error> {
        validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SectionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SectionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate(&value)?;
        Ok(Self(value))
    }
}

impl From<SectionId> for String {
    fn from(id: SectionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
