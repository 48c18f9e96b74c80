use crate::template::{TemplateBatch, TemplateEntry};
use mediakit_types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Configuration for the template cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age after which a batch is considered expired (seconds).
    pub max_age_secs: u64,
    /// Maximum number of templates kept.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 3600,
            max_entries: 100,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

/// Cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    /// `hits / (hits + misses)`, 0 before any lookup.
    pub hit_rate: f64,
    pub version: Option<String>,
    pub fetched_at: Option<Timestamp>,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, TemplateEntry>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    presets: Map<String, Value>,
    version: Option<String>,
    fetched: Option<(Instant, Timestamp)>,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn insert(&mut self, component_type: String, entry: TemplateEntry, max_entries: usize) {
        if self.entries.insert(component_type.clone(), entry).is_some() {
            self.order.retain(|t| *t != component_type);
        }
        self.order.push_back(component_type);
        while self.entries.len() > max_entries {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(component_type = %oldest, "template evicted");
        }
    }
}

/// In-memory, versioned store of component templates.
///
/// All methods take `&self`; share it behind an `Arc`.
#[derive(Default)]
pub struct TemplateCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl TemplateCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Replaces the cache contents with `batch`.
    pub fn set_batch(&self, batch: TemplateBatch) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
        let count = batch.templates.len();
        for (component_type, entry) in batch.templates {
            inner.insert(component_type, entry, self.config.max_entries);
        }
        inner.presets = batch.presets;
        inner.version = Some(batch.version.clone());
        inner.fetched = Some((Instant::now(), Timestamp::now()));
        info!(
            version = %batch.version,
            templates = count,
            kept = inner.entries.len(),
            "template batch cached"
        );
    }

    /// Looks up a template, counting the hit or miss.
    pub fn get(&self, component_type: &str) -> Option<TemplateEntry> {
        let mut inner = self.lock();
        match inner.entries.get(component_type).cloned() {
            Some(entry) => {
                inner.hits += 1;
                Some(entry)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Adds or replaces a single template.
    pub fn set(&self, component_type: &str, entry: TemplateEntry) {
        self.lock()
            .insert(component_type.to_string(), entry, self.config.max_entries);
        debug!(component_type, "template cached");
    }

    /// Whether a template is cached. Does not touch the counters.
    pub fn has(&self, component_type: &str) -> bool {
        self.lock().entries.contains_key(component_type)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached types, oldest insertion first.
    pub fn types(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }

    pub fn get_version(&self) -> Option<String> {
        self.lock().version.clone()
    }

    pub fn presets(&self) -> Map<String, Value> {
        self.lock().presets.clone()
    }

    /// True when empty, never filled from a batch, or older than `max_age`.
    pub fn is_expired(&self) -> bool {
        let inner = self.lock();
        if inner.entries.is_empty() {
            return true;
        }
        match inner.fetched {
            Some((at, _)) => at.elapsed() >= self.config.max_age(),
            None => true,
        }
    }

    /// Restarts the expiry clock without changing contents, e.g. after the
    /// server confirmed the cached version is current.
    pub fn touch(&self) {
        let mut inner = self.lock();
        if inner.version.is_some() {
            inner.fetched = Some((Instant::now(), Timestamp::now()));
        }
    }

    /// Empties the cache and forgets the version. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.presets.clear();
        inner.version = None;
        inner.fetched = None;
        info!("template cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
            version: inner.version.clone(),
            fetched_at: inner.fetched.map(|(_, ts)| ts),
        }
    }

    /// Current contents as a batch, e.g. for writing to disk.
    pub fn export(&self) -> TemplateBatch {
        let inner = self.lock();
        let mut batch = TemplateBatch::new(inner.version.clone().unwrap_or_default());
        batch.templates = inner
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        batch.presets = inner.presets.clone();
        batch
    }
}
