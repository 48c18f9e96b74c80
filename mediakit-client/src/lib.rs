//! WordPress persistence for the media kit builder.
//!
//! - [`WordPressClient`] saves and loads state through `admin-ajax.php`
//!   and fetches the versioned template batch from the REST API, retrying
//!   transient failures with exponential backoff.
//! - [`TemplateLoader`] keeps a [`mediakit_cache::TemplateCache`] current
//!   and falls back to stale templates when the server is unreachable.
//! - [`AutoSavePolicy`] decides when pending edits are worth a round trip;
//!   [`AutoSaver`] runs it against a store in the background.

mod autosave;
mod client;
mod config;
mod error;
mod loader;

pub use autosave::{
    save_if_dirty, AutoSaveConfig, AutoSavePolicy, AutoSaver, SaveDecision, SaveReason,
};
pub use client::{SaveReceipt, StatePersistence, TemplateFetch, WordPressClient};
pub use config::{ClientConfig, RetryPolicy};
pub use error::{ClientError, ClientResult};
pub use loader::{Refresh, TemplateLoader};
