//! Local preview server.
//!
//! Serves the media kit held in a [`StateStore`], rendered fresh on every
//! page load, and accepts store actions so the kit can be edited while it
//! is being previewed.

use crate::config::MediaKitConfig;
use crate::render::{page, render_state};
use axum::{
    extract::State,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use mediakit_model::MediaKitState;
use mediakit_render::CoordinatorConfig;
use mediakit_store::{Action, DispatchOutcome, StateStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// What the preview server hands out.
pub struct PreviewSite {
    store: Arc<StateStore>,
    render: CoordinatorConfig,
}

impl PreviewSite {
    /// Puts `state` in a store built from the `[store]` table.
    pub fn new(state: MediaKitState, config: &MediaKitConfig) -> Self {
        Self {
            store: Arc::new(StateStore::with_state(state, config.store.clone())),
            render: config.render.clone(),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Renders the current state as a standalone page.
    pub fn page(&self) -> String {
        let state = self.store.snapshot();
        let rendered = render_state(&state, &self.render);
        page(&rendered.html, &state.theme)
    }

    fn edit_response(&self, applied: bool) -> EditResponse {
        EditResponse {
            applied,
            revision: self.store.revision(),
            dirty: self.store.is_dirty(),
        }
    }
}

/// Answer to an edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResponse {
    /// Whether the state changed.
    pub applied: bool,
    pub revision: u64,
    /// Changes not yet confirmed saved.
    pub dirty: bool,
}

async fn page_handler(State(site): State<Arc<PreviewSite>>) -> Html<String> {
    Html(site.page())
}

async fn state_handler(State(site): State<Arc<PreviewSite>>) -> Json<MediaKitState> {
    Json(site.store.snapshot().as_ref().clone())
}

async fn action_handler(
    State(site): State<Arc<PreviewSite>>,
    Json(action): Json<Action>,
) -> Json<EditResponse> {
    let outcome = site.store.dispatch(action);
    debug!(?outcome, "preview edit");
    Json(site.edit_response(outcome == DispatchOutcome::Applied))
}

async fn undo_handler(State(site): State<Arc<PreviewSite>>) -> Json<EditResponse> {
    Json(site.edit_response(site.store.undo()))
}

async fn redo_handler(State(site): State<Arc<PreviewSite>>) -> Json<EditResponse> {
    Json(site.edit_response(site.store.redo()))
}

/// Builds the router serving the rendered page, its state, and edits.
pub fn build_router(site: Arc<PreviewSite>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/v1/state", get(state_handler))
        .route("/api/v1/actions", post(action_handler))
        .route("/api/v1/undo", post(undo_handler))
        .route("/api/v1/redo", post(redo_handler))
        .with_state(site)
}
