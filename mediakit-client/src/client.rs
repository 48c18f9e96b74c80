//! WordPress admin-ajax and REST client.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use mediakit_cache::TemplateBatch;
use mediakit_model::{validate_state, MediaKitState, ModelError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Acknowledgement returned by the save endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveReceipt {
    pub message: Option<String>,
    /// Server time of the save (Unix seconds).
    pub timestamp: Option<u64>,
    pub post_id: Option<u64>,
    pub components_count: Option<u64>,
    pub sections_count: Option<u64>,
    pub data_size: Option<u64>,
}

/// Result of a template batch request.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateFetch {
    /// The server still has the version we sent.
    NotModified,
    Fetched(TemplateBatch),
}

/// Where media kit state is persisted.
#[async_trait]
pub trait StatePersistence: Send + Sync {
    async fn save_state(&self, state: &MediaKitState) -> ClientResult<SaveReceipt>;

    /// `None` when nothing has been saved for the post yet.
    async fn load_state(&self) -> ClientResult<Option<MediaKitState>>;
}

/// `{success, data, message}` as produced by `wp_send_json_*`.
#[derive(Debug, Deserialize)]
struct AjaxEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

impl AjaxEnvelope {
    fn into_data(self) -> ClientResult<Value> {
        if self.success {
            return Ok(self.data.unwrap_or(Value::Null));
        }
        let reason = self
            .message
            .or_else(|| match &self.data {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_else(|| "request rejected".to_string());
        Err(ClientError::Rejected(reason))
    }
}

/// Client for the media kit endpoints of one WordPress post.
pub struct WordPressClient {
    config: ClientConfig,
    http: Client,
}

impl WordPressClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        if config.post_id == 0 {
            return Err(ClientError::Config("post_id must be set".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// the retry policy is used up.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut op: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let policy = &self.config.retry;
        let attempts = policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= attempts => {
                    warn!(operation, attempts, error = %e, "giving up");
                    return Err(ClientError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = policy.backoff(attempt - 1);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn post_ajax(&self, form: &[(&str, String)]) -> ClientResult<Value> {
        let response = self
            .http
            .post(&self.config.ajax_url)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let envelope: AjaxEnvelope = serde_json::from_str(&body)?;
        envelope.into_data()
    }

    async fn get_templates(&self, url: &str, known_version: Option<&str>) -> ClientResult<TemplateFetch> {
        let mut request = self
            .http
            .get(url)
            .timeout(Duration::from_secs(self.config.template_timeout_secs))
            .header("X-WP-Nonce", &self.config.nonce);
        if let Some(version) = known_version {
            request = request.query(&[("version", version)]);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            debug!(version = ?known_version, "templates not modified");
            return Ok(TemplateFetch::NotModified);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let batch = TemplateBatch::from_json(&body)?;
        info!(
            version = %batch.version,
            templates = batch.templates.len(),
            "fetched template batch"
        );
        Ok(TemplateFetch::Fetched(batch))
    }

    /// Requests the template batch. `known_version` is sent so the server
    /// can answer `304 Not Modified`.
    pub async fn fetch_templates(&self, known_version: Option<&str>) -> ClientResult<TemplateFetch> {
        let url = self.config.templates_url();
        let url = url.as_str();
        self.with_retry("fetch_templates", move || self.get_templates(url, known_version))
            .await
    }
}

#[async_trait]
impl StatePersistence for WordPressClient {
    async fn save_state(&self, state: &MediaKitState) -> ClientResult<SaveReceipt> {
        let violations = validate_state(state);
        if !violations.is_empty() {
            return Err(ModelError::InvalidState(violations).into());
        }
        let json = state.to_json()?;
        let form = &[
            ("action", self.config.save_action.clone()),
            ("nonce", self.config.nonce.clone()),
            ("post_id", self.config.post_id.to_string()),
            ("state", json),
        ];

        let data = self.with_retry("save_state", move || self.post_ajax(form)).await?;
        let receipt = match data {
            Value::Object(_) => serde_json::from_value(data)?,
            _ => SaveReceipt::default(),
        };
        info!(
            post_id = self.config.post_id,
            components = state.components.len(),
            "media kit saved"
        );
        Ok(receipt)
    }

    async fn load_state(&self) -> ClientResult<Option<MediaKitState>> {
        let form = &[
            ("action", self.config.load_action.clone()),
            ("nonce", self.config.nonce.clone()),
            ("post_id", self.config.post_id.to_string()),
        ];

        let data = self.with_retry("load_state", move || self.post_ajax(form)).await?;
        let Some(mut state) = data.get("state").cloned().filter(|s| !s.is_null()) else {
            debug!(post_id = self.config.post_id, "no saved media kit");
            return Ok(None);
        };
        normalize_php_maps(&mut state);
        let state: MediaKitState = serde_json::from_value(state)?;
        let violations = validate_state(&state);
        if !violations.is_empty() {
            warn!(
                post_id = self.config.post_id,
                violations = violations.len(),
                "loaded media kit has structural problems"
            );
        }
        info!(
            post_id = self.config.post_id,
            components = state.components.len(),
            "media kit loaded"
        );
        Ok(Some(state))
    }
}

/// PHP encodes an empty associative array as `[]`.
fn normalize_php_maps(state: &mut Value) {
    let Some(object) = state.as_object_mut() else {
        return;
    };
    for key in ["components", "globalSettings"] {
        if object
            .get(key)
            .and_then(Value::as_array)
            .is_some_and(|a| a.is_empty())
        {
            object.insert(key.to_string(), Value::Object(Default::default()));
        }
    }
}
