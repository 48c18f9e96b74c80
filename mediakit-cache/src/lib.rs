//! Template cache for the media kit builder.
//!
//! Component templates are fetched from the server in one versioned batch
//! and kept in memory, so opening the component library or adding a
//! component does not cost a round trip. The cache knows the version it
//! holds (sent back to the server to get `304 Not Modified`) and when the
//! batch was fetched, and reports itself expired after `max_age`.

mod cache;
mod error;
mod template;

pub use cache::{CacheConfig, CacheStats, TemplateCache};
pub use error::{CacheError, CacheResult};
pub use template::{BatchMeta, TemplateBatch, TemplateEntry};
