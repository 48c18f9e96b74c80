use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for a WordPress site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `admin-ajax.php` endpoint.
    pub ajax_url: String,
    /// REST root, e.g. `https://example.com/wp-json`.
    pub rest_base: String,
    /// WordPress nonce sent with every request.
    pub nonce: String,
    /// Post the media kit belongs to.
    pub post_id: u64,
    pub save_action: String,
    pub load_action: String,
    /// Timeout for admin-ajax requests (seconds).
    pub request_timeout_secs: u64,
    /// Timeout for the template batch request (seconds).
    pub template_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ajax_url: "http://localhost/wp-admin/admin-ajax.php".to_string(),
            rest_base: "http://localhost/wp-json".to_string(),
            nonce: String::new(),
            post_id: 0,
            save_action: "guestify_save_media_kit".to_string(),
            load_action: "guestify_load_media_kit".to_string(),
            request_timeout_secs: 30,
            template_timeout_secs: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// URL of the template batch endpoint.
    pub fn templates_url(&self) -> String {
        format!(
            "{}/guestify/v1/templates/batch",
            self.rest_base.trim_end_matches('/')
        )
    }
}

/// Exponential backoff for retryable failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): `initial * 2^retry`,
    /// capped at `max_backoff_ms`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}
