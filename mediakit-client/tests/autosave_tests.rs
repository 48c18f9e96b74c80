use async_trait::async_trait;
use mediakit_client::{
    save_if_dirty, AutoSaveConfig, AutoSavePolicy, AutoSaver, ClientError, ClientResult,
    SaveDecision, SaveReason, SaveReceipt, StatePersistence,
};
use mediakit_model::{Component, MediaKitState};
use mediakit_store::{Action, StateStore};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct MemoryPersistence {
    saved: Mutex<Vec<MediaKitState>>,
    failing: AtomicBool,
}

impl MemoryPersistence {
    fn saves(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl StatePersistence for MemoryPersistence {
    async fn save_state(&self, state: &MediaKitState) -> ClientResult<SaveReceipt> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected("offline".into()));
        }
        self.saved.lock().unwrap().push(state.clone());
        Ok(SaveReceipt::default())
    }

    async fn load_state(&self) -> ClientResult<Option<MediaKitState>> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ── Policy ──────────────────────────────────────────────────────

#[test]
fn idle_without_changes() {
    let policy = AutoSavePolicy::new(AutoSaveConfig::default());
    assert_eq!(policy.decide(Instant::now()), SaveDecision::Idle);
}

#[test]
fn disabled_policy_never_saves() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig {
        enabled: false,
        ..AutoSaveConfig::default()
    });
    let t0 = Instant::now();
    for _ in 0..10 {
        policy.record_change(t0);
    }
    assert_eq!(policy.decide(t0 + ms(60_000)), SaveDecision::Idle);
}

#[test]
fn waits_for_quiet_period() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig::default());
    let t0 = Instant::now();
    policy.record_change(t0);
    assert_eq!(policy.decide(t0 + ms(400)), SaveDecision::Wait(ms(600)));
    assert_eq!(
        policy.decide(t0 + ms(1000)),
        SaveDecision::SaveNow(SaveReason::Quiet)
    );
}

#[test]
fn full_batch_saves_immediately() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig::default());
    let t0 = Instant::now();
    for _ in 0..5 {
        policy.record_change(t0);
    }
    assert_eq!(policy.decide(t0), SaveDecision::SaveNow(SaveReason::BatchFull));
}

#[test]
fn continuous_editing_hits_max_interval() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig {
        batch_size: 1000,
        ..AutoSaveConfig::default()
    });
    let t0 = Instant::now();
    let mut now = t0;
    while now < t0 + ms(9500) {
        policy.record_change(now);
        now += ms(500);
        assert!(matches!(policy.decide(now), SaveDecision::Wait(_)));
    }
    now += ms(500);
    policy.record_change(now);
    assert_eq!(
        policy.decide(now),
        SaveDecision::SaveNow(SaveReason::MaxInterval)
    );
}

#[test]
fn min_interval_between_saves() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig::default());
    let t0 = Instant::now();
    policy.record_saved(t0);
    for _ in 0..5 {
        policy.record_change(t0 + ms(500));
    }
    assert_eq!(policy.decide(t0 + ms(500)), SaveDecision::Wait(ms(1500)));
    assert_eq!(
        policy.decide(t0 + ms(2000)),
        SaveDecision::SaveNow(SaveReason::BatchFull)
    );
}

#[test]
fn failure_keeps_pending_changes() {
    let mut policy = AutoSavePolicy::new(AutoSaveConfig::default());
    let t0 = Instant::now();
    policy.record_change(t0);
    policy.record_failed(t0 + ms(1000));
    assert_eq!(policy.pending(), 1);
    assert_eq!(policy.decide(t0 + ms(1500)), SaveDecision::Wait(ms(1500)));
    assert_eq!(
        policy.decide(t0 + ms(3000)),
        SaveDecision::SaveNow(SaveReason::Quiet)
    );
}

// ── save_if_dirty ───────────────────────────────────────────────

#[tokio::test]
async fn clean_store_is_not_saved() {
    let store = StateStore::default();
    let persistence = MemoryPersistence::default();
    assert_eq!(save_if_dirty(&store, &persistence).await.unwrap(), None);
    assert_eq!(persistence.saves(), 0);
}

#[tokio::test]
async fn dirty_store_is_saved_and_marked() {
    let store = StateStore::default();
    let persistence = MemoryPersistence::default();
    store.dispatch(Action::add(Component::new("hero")));
    store.dispatch(Action::add(Component::new("topics")));

    assert_eq!(save_if_dirty(&store, &persistence).await.unwrap(), Some(2));
    assert!(!store.is_dirty());
    assert_eq!(store.saved_revision(), 2);
    assert_eq!(persistence.saved.lock().unwrap()[0].components.len(), 2);
}

#[tokio::test]
async fn failed_save_leaves_store_dirty() {
    let store = StateStore::default();
    let persistence = MemoryPersistence::default();
    persistence.failing.store(true, Ordering::SeqCst);
    store.dispatch(Action::add(Component::new("hero")));

    assert!(save_if_dirty(&store, &persistence).await.is_err());
    assert!(store.is_dirty());
}

// ── Background task ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn saves_after_quiet_period() {
    let store = Arc::new(StateStore::default());
    let persistence = Arc::new(MemoryPersistence::default());
    let saver = AutoSaver::spawn(
        Arc::clone(&store),
        persistence.clone(),
        AutoSaveConfig::default(),
    );

    store.dispatch(Action::add(Component::new("hero")));
    tokio::time::sleep(ms(500)).await;
    assert_eq!(persistence.saves(), 0);

    tokio::time::sleep(ms(1000)).await;
    assert_eq!(persistence.saves(), 1);
    assert!(!store.is_dirty());

    saver.shutdown().await;
    assert_eq!(persistence.saves(), 1);
}

#[tokio::test(start_paused = true)]
async fn batch_of_edits_is_one_save() {
    let store = Arc::new(StateStore::default());
    let persistence = Arc::new(MemoryPersistence::default());
    let saver = AutoSaver::spawn(
        Arc::clone(&store),
        persistence.clone(),
        AutoSaveConfig::default(),
    );

    store.batch(|s| {
        for _ in 0..5 {
            s.dispatch(Action::add(Component::new("topics")));
        }
    });
    tokio::time::sleep(ms(1500)).await;
    assert_eq!(persistence.saves(), 1);
    assert_eq!(persistence.saved.lock().unwrap()[0].components.len(), 5);

    saver.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_flushes_pending_changes() {
    let store = Arc::new(StateStore::default());
    let persistence = Arc::new(MemoryPersistence::default());
    let saver = AutoSaver::spawn(
        Arc::clone(&store),
        persistence.clone(),
        AutoSaveConfig::default(),
    );

    store.dispatch(Action::add(Component::new("hero")));
    saver.shutdown().await;
    assert_eq!(persistence.saves(), 1);
    assert!(!store.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn failing_backend_retries_later() {
    let store = Arc::new(StateStore::default());
    let persistence = Arc::new(MemoryPersistence::default());
    persistence.failing.store(true, Ordering::SeqCst);
    let saver = AutoSaver::spawn(
        Arc::clone(&store),
        persistence.clone(),
        AutoSaveConfig::default(),
    );

    store.dispatch(Action::add(Component::new("hero")));
    tokio::time::sleep(ms(1500)).await;
    assert!(store.is_dirty());

    persistence.failing.store(false, Ordering::SeqCst);
    tokio::time::sleep(ms(2500)).await;
    assert_eq!(persistence.saves(), 1);
    assert!(!store.is_dirty());

    saver.shutdown().await;
}
