use anyhow::{Context, Result};
use mediakit_cache::CacheConfig;
use mediakit_client::{AutoSaveConfig, ClientConfig};
use mediakit_render::CoordinatorConfig;
use mediakit_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Contents of `mediakit.toml`. Every table is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaKitConfig {
    pub wordpress: ClientConfig,
    pub templates: CacheConfig,
    pub store: StoreConfig,
    pub render: CoordinatorConfig,
    pub autosave: AutoSaveConfig,
}

impl MediaKitConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
