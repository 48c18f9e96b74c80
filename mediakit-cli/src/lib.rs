//! Shared pieces of the `mediakit` command-line tool.

mod config;
mod render;
mod server;

pub use config::MediaKitConfig;
pub use render::{page, read_state, render_state, write_state, RenderOutput};
pub use server::{build_router, EditResponse, PreviewSite};
