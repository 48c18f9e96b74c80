use crate::client::{TemplateFetch, WordPressClient};
use crate::error::ClientResult;
use mediakit_cache::TemplateCache;
use std::sync::Arc;
use tracing::{info, warn};

/// What a refresh did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The cache was not expired; no request was made.
    Fresh,
    /// The server confirmed the cached version.
    NotModified,
    Updated { version: String, count: usize },
    /// The request failed and the previous contents were kept.
    Stale { error: String },
}

/// Keeps a [`TemplateCache`] in step with the server's template batch.
pub struct TemplateLoader {
    client: Arc<WordPressClient>,
    cache: Arc<TemplateCache>,
}

impl TemplateLoader {
    pub fn new(client: Arc<WordPressClient>, cache: Arc<TemplateCache>) -> Self {
        Self { client, cache }
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    /// Fetches the batch, sending the cached version.
    ///
    /// A failure is only an error when there is nothing cached to fall
    /// back on.
    pub async fn refresh(&self) -> ClientResult<Refresh> {
        let known = self.cache.get_version();
        match self.client.fetch_templates(known.as_deref()).await {
            Ok(TemplateFetch::NotModified) => {
                self.cache.touch();
                Ok(Refresh::NotModified)
            }
            Ok(TemplateFetch::Fetched(batch)) => {
                let version = batch.version.clone();
                let count = batch.templates.len();
                self.cache.set_batch(batch);
                info!(version = %version, count, "template cache updated");
                Ok(Refresh::Updated { version, count })
            }
            Err(e) if !self.cache.is_empty() => {
                warn!(error = %e, version = ?known, "template fetch failed, keeping cached templates");
                Ok(Refresh::Stale {
                    error: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Refreshes only when the cache is empty or expired.
    pub async fn ensure_fresh(&self) -> ClientResult<Refresh> {
        if !self.cache.is_expired() {
            return Ok(Refresh::Fresh);
        }
        self.refresh().await
    }
}
