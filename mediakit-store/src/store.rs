use crate::action::{Action, ActionKind};
use crate::reducer;
use mediakit_model::{Component, MediaKitState};
use mediakit_types::{ComponentId, EventBus};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Configuration for the state store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of undo steps kept.
    pub max_history: usize,
    /// Buffered notifications per subscriber.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: 50,
            event_capacity: 256,
        }
    }
}

/// Result of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// State changed (or will be announced when the open batch ends).
    Applied,
    /// The action referenced a missing id or changed nothing.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryDirection {
    Undo,
    Redo,
}

/// Notifications published by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    /// One dispatch, or one whole batch, changed the state.
    Changed {
        revision: u64,
        actions: Vec<ActionKind>,
    },
    /// Undo or redo replaced the state.
    HistoryRestored {
        revision: u64,
        direction: HistoryDirection,
    },
    /// The persistence layer confirmed a save of `revision`.
    Saved { revision: u64 },
}

struct StoreInner {
    state: Arc<MediaKitState>,
    revision: u64,
    saved_revision: u64,
    batch_depth: usize,
    batch_actions: Vec<ActionKind>,
    batch_base: Option<Arc<MediaKitState>>,
    undo: VecDeque<Arc<MediaKitState>>,
    redo: Vec<Arc<MediaKitState>>,
}

impl StoreInner {
    fn push_history(&mut self, previous: Arc<MediaKitState>, max: usize) {
        if max == 0 {
            return;
        }
        self.undo.push_back(previous);
        while self.undo.len() > max {
            self.undo.pop_front();
        }
        self.redo.clear();
    }
}

/// The single source of truth for a media kit being edited.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct StateStore {
    config: StoreConfig,
    inner: Mutex<StoreInner>,
    bus: EventBus<StoreEvent>,
}

impl StateStore {
    /// Creates a store holding an empty media kit.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_state(MediaKitState::default(), config)
    }

    /// Creates a store holding `state`, treated as already saved.
    pub fn with_state(state: MediaKitState, config: StoreConfig) -> Self {
        let bus = EventBus::with_capacity(config.event_capacity);
        Self {
            config,
            inner: Mutex::new(StoreInner {
                state: Arc::new(state),
                revision: 0,
                saved_revision: 0,
                batch_depth: 0,
                batch_actions: Vec::new(),
                batch_base: None,
                undo: VecDeque::new(),
                redo: Vec::new(),
            }),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A panic inside a reducer leaves the previous Arc untouched, so the
        // guarded data is still consistent after poisoning.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read-only snapshot of the current state.
    pub fn snapshot(&self) -> Arc<MediaKitState> {
        Arc::clone(&self.lock().state)
    }

    /// Looks up a single component in the current state.
    pub fn component(&self, id: &ComponentId) -> Option<Component> {
        self.lock().state.component(id).cloned()
    }

    /// Monotonic counter bumped by every state change.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// Subscribes to store notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.bus.subscribe()
    }

    /// The bus notifications are published on.
    pub fn bus(&self) -> &EventBus<StoreEvent> {
        &self.bus
    }

    /// Applies an action.
    pub fn dispatch(&self, action: Action) -> DispatchOutcome {
        let kind = action.kind();
        let event = {
            let mut inner = self.lock();
            let mut next = (*inner.state).clone();
            if !reducer::apply(&mut next, action) {
                return DispatchOutcome::Ignored;
            }
            let previous = std::mem::replace(&mut inner.state, Arc::new(next));
            inner.revision += 1;
            if inner.batch_depth > 0 {
                inner.batch_actions.push(kind);
                None
            } else {
                inner.push_history(previous, self.config.max_history);
                Some(StoreEvent::Changed {
                    revision: inner.revision,
                    actions: vec![kind],
                })
            }
        };
        if let Some(event) = event {
            debug!(action = ?kind, "state changed");
            self.bus.publish(event);
        }
        DispatchOutcome::Applied
    }

    /// Opens a batch. Notifications are held until every open guard drops.
    ///
    /// Batches nest; only the outermost guard publishes, and only if some
    /// dispatch inside it changed state. The batch is one undo step.
    pub fn begin_batch(&self) -> BatchGuard<'_> {
        let mut inner = self.lock();
        if inner.batch_depth == 0 {
            inner.batch_base = Some(Arc::clone(&inner.state));
            inner.batch_actions.clear();
        }
        inner.batch_depth += 1;
        BatchGuard { store: self }
    }

    /// Runs `f` inside a batch.
    pub fn batch<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.begin_batch();
        f(self)
    }

    pub fn in_batch(&self) -> bool {
        self.lock().batch_depth > 0
    }

    fn end_batch(&self) {
        let event = {
            let mut inner = self.lock();
            inner.batch_depth = inner.batch_depth.saturating_sub(1);
            if inner.batch_depth > 0 {
                return;
            }
            let base = inner.batch_base.take();
            let actions = std::mem::take(&mut inner.batch_actions);
            if actions.is_empty() {
                return;
            }
            if let Some(base) = base {
                inner.push_history(base, self.config.max_history);
            }
            StoreEvent::Changed {
                revision: inner.revision,
                actions,
            }
        };
        debug!("batch committed");
        self.bus.publish(event);
    }

    pub fn can_undo(&self) -> bool {
        !self.lock().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.lock().redo.is_empty()
    }

    /// Restores the state before the last change. Not available mid-batch.
    pub fn undo(&self) -> bool {
        self.step_history(HistoryDirection::Undo)
    }

    /// Re-applies the last undone change. Not available mid-batch.
    pub fn redo(&self) -> bool {
        self.step_history(HistoryDirection::Redo)
    }

    fn step_history(&self, direction: HistoryDirection) -> bool {
        let revision = {
            let mut inner = self.lock();
            if inner.batch_depth > 0 {
                return false;
            }
            let target = match direction {
                HistoryDirection::Undo => inner.undo.pop_back(),
                HistoryDirection::Redo => inner.redo.pop(),
            };
            let Some(target) = target else {
                return false;
            };
            let current = std::mem::replace(&mut inner.state, target);
            match direction {
                HistoryDirection::Undo => inner.redo.push(current),
                HistoryDirection::Redo => inner.undo.push_back(current),
            }
            inner.revision += 1;
            inner.revision
        };
        info!(?direction, revision, "history restored");
        self.bus.publish(StoreEvent::HistoryRestored {
            revision,
            direction,
        });
        true
    }

    /// Records that `revision` has been persisted.
    pub fn mark_saved(&self, revision: u64) {
        {
            let mut inner = self.lock();
            if revision < inner.saved_revision {
                return;
            }
            inner.saved_revision = revision;
        }
        self.bus.publish(StoreEvent::Saved { revision });
    }

    pub fn saved_revision(&self) -> u64 {
        self.lock().saved_revision
    }

    /// Whether changes exist that have not been saved.
    pub fn is_dirty(&self) -> bool {
        let inner = self.lock();
        inner.revision != inner.saved_revision
    }

    /// Snapshot together with the revision it belongs to.
    pub fn snapshot_with_revision(&self) -> (Arc<MediaKitState>, u64) {
        let inner = self.lock();
        (Arc::clone(&inner.state), inner.revision)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

/// Closes a batch on drop.
#[must_use = "the batch ends when the guard is dropped"]
pub struct BatchGuard<'a> {
    store: &'a StateStore,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.store.end_batch();
    }
}
