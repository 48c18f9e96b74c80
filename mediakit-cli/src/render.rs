use anyhow::{Context, Result};
use mediakit_model::{validate_state, MediaKitState};
use mediakit_render::{
    ComponentRegistry, CoordinatorConfig, PassReport, Preview, RenderCoordinator, RenderStats,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A rendered media kit.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Markup of the preview container.
    pub html: String,
    pub report: PassReport,
    pub stats: RenderStats,
}

pub fn read_state(path: &Path) -> Result<MediaKitState> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    let state = MediaKitState::from_json(&json)
        .with_context(|| format!("Failed to decode state file {}", path.display()))?;
    let violations = validate_state(&state);
    if !violations.is_empty() {
        warn!(path = %path.display(), violations = violations.len(), "state has structural problems");
    }
    Ok(state)
}

pub fn write_state(path: &Path, state: &MediaKitState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to encode state")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write state file {}", path.display()))
}

/// Renders `state` with the built-in component renderers.
pub fn render_state(state: &MediaKitState, config: &CoordinatorConfig) -> RenderOutput {
    let preview = Preview::new(Arc::new(ComponentRegistry::with_builtins()));
    let coordinator = RenderCoordinator::new(config.clone());
    let report = preview.render_state(state, &coordinator);
    if report.failed > 0 {
        warn!(failed = report.failed, "some components failed to render");
    }
    info!(rendered = report.rendered, "media kit rendered");
    RenderOutput {
        html: preview.to_html(),
        report,
        stats: coordinator.stats(),
    }
}

/// Wraps rendered markup in a standalone HTML page.
pub fn page(body: &str, theme: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Media Kit</title>\n</head>\n<body data-gmkb-theme=\"{}\">\n{}\n</body>\n</html>\n",
        mediakit_render::html::escape(theme),
        body
    )
}
