//! Auto-save: when to save, and a background task that does it.

use crate::client::StatePersistence;
use crate::error::ClientResult;
use mediakit_store::{StateStore, StoreEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    /// Minimum time between two saves.
    pub min_interval_ms: u64,
    /// Pending changes are saved at the latest this long after the first one.
    pub max_interval_ms: u64,
    /// Save once no change has arrived for this long.
    pub quiet_period_ms: u64,
    /// Save as soon as this many changes are pending.
    pub batch_size: usize,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_interval_ms: 2000,
            max_interval_ms: 10_000,
            quiet_period_ms: 1000,
            batch_size: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveReason {
    BatchFull,
    MaxInterval,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    /// Nothing pending.
    Idle,
    /// Ask again after this long.
    Wait(Duration),
    SaveNow(SaveReason),
}

/// Pure save-timing policy. Callers pass the current instant.
#[derive(Debug, Clone)]
pub struct AutoSavePolicy {
    config: AutoSaveConfig,
    pending: usize,
    first_change: Option<Instant>,
    last_change: Option<Instant>,
    last_save: Option<Instant>,
}

impl AutoSavePolicy {
    pub fn new(config: AutoSaveConfig) -> Self {
        Self {
            config,
            pending: 0,
            first_change: None,
            last_change: None,
            last_save: None,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn record_change(&mut self, now: Instant) {
        self.pending += 1;
        self.first_change.get_or_insert(now);
        self.last_change = Some(now);
    }

    pub fn record_saved(&mut self, now: Instant) {
        self.pending = 0;
        self.first_change = None;
        self.last_change = None;
        self.last_save = Some(now);
    }

    /// A failed attempt keeps the pending changes but still counts
    /// against the minimum interval.
    pub fn record_failed(&mut self, now: Instant) {
        self.last_save = Some(now);
    }

    pub fn decide(&self, now: Instant) -> SaveDecision {
        let (Some(first), Some(last)) = (self.first_change, self.last_change) else {
            return SaveDecision::Idle;
        };
        if !self.config.enabled || self.pending == 0 {
            return SaveDecision::Idle;
        }

        let min = Duration::from_millis(self.config.min_interval_ms);
        if let Some(saved) = self.last_save {
            let since = now.saturating_duration_since(saved);
            if since < min {
                return SaveDecision::Wait(min - since);
            }
        }
        if self.pending >= self.config.batch_size {
            return SaveDecision::SaveNow(SaveReason::BatchFull);
        }

        let max = Duration::from_millis(self.config.max_interval_ms);
        let since_first = now.saturating_duration_since(first);
        if since_first >= max {
            return SaveDecision::SaveNow(SaveReason::MaxInterval);
        }
        let quiet = Duration::from_millis(self.config.quiet_period_ms);
        let since_last = now.saturating_duration_since(last);
        if since_last >= quiet {
            return SaveDecision::SaveNow(SaveReason::Quiet);
        }
        SaveDecision::Wait((quiet - since_last).min(max - since_first))
    }
}

/// Saves the store's current state if it has unsaved changes.
///
/// Returns the revision that was saved. Changes made while the request is
/// in flight keep the store dirty.
pub async fn save_if_dirty(
    store: &StateStore,
    persistence: &dyn StatePersistence,
) -> ClientResult<Option<u64>> {
    if !store.is_dirty() {
        return Ok(None);
    }
    let (state, revision) = store.snapshot_with_revision();
    persistence.save_state(&state).await?;
    store.mark_saved(revision);
    debug!(revision, "saved dirty state");
    Ok(Some(revision))
}

/// Background task that saves the store according to an [`AutoSavePolicy`].
pub struct AutoSaver {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl AutoSaver {
    /// Spawns the task on the current tokio runtime.
    pub fn spawn(
        store: Arc<StateStore>,
        persistence: Arc<dyn StatePersistence>,
        config: AutoSaveConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let events = store.subscribe();
        let handle = tokio::spawn(async move {
            Self::run(store, persistence, config, events, shutdown_rx).await;
        });
        Self {
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    async fn run(
        store: Arc<StateStore>,
        persistence: Arc<dyn StatePersistence>,
        config: AutoSaveConfig,
        mut events: broadcast::Receiver<StoreEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let mut policy = AutoSavePolicy::new(config);
        if store.is_dirty() {
            policy.record_change(Instant::now());
        }

        loop {
            let wait = match policy.decide(Instant::now()) {
                SaveDecision::Idle => None,
                SaveDecision::Wait(delay) => Some(delay),
                SaveDecision::SaveNow(reason) => {
                    match save_if_dirty(&store, persistence.as_ref()).await {
                        Ok(revision) => {
                            info!(?reason, ?revision, "auto-saved");
                            policy.record_saved(Instant::now());
                            if store.is_dirty() {
                                policy.record_change(Instant::now());
                            }
                        }
                        Err(e) => {
                            warn!(?reason, error = %e, "auto-save failed");
                            policy.record_failed(Instant::now());
                        }
                    }
                    continue;
                }
            };
            let sleep = tokio::time::sleep(wait.unwrap_or(Duration::MAX));

            tokio::select! {
                _ = &mut shutdown => break,
                event = events.recv() => match event {
                    Ok(StoreEvent::Changed { .. } | StoreEvent::HistoryRestored { .. }) => {
                        policy.record_change(Instant::now());
                    }
                    Ok(StoreEvent::Saved { .. }) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "auto-saver lagged behind store events");
                        policy.record_change(Instant::now());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = sleep, if wait.is_some() => {}
            }
        }

        if let Err(e) = save_if_dirty(&store, persistence.as_ref()).await {
            warn!(error = %e, "final auto-save failed");
        }
    }

    /// Stops the task after a last save of any unsaved changes.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.handle.await {
            warn!(error = %e, "auto-save task ended abnormally");
        }
    }
}
