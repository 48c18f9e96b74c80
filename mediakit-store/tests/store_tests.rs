use mediakit_model::{Component, MediaKitState, Section, SectionLayout};
use mediakit_store::{
    Action, ActionKind, DispatchOutcome, HistoryDirection, MoveTarget, StateStore, StoreConfig,
    StoreEvent,
};
use mediakit_types::{ComponentId, SectionId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

fn cid(s: &str) -> ComponentId {
    ComponentId::parse(s).unwrap()
}

fn sid(s: &str) -> SectionId {
    SectionId::parse(s).unwrap()
}

fn component(id: &str, ty: &str) -> Component {
    Component::with_id(cid(id), ty)
}

fn drain(rx: &mut Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn store_with_section() -> StateStore {
    let store = StateStore::default();
    store.dispatch(Action::AddSection(Section::with_id(sid("s1"), SectionLayout::TwoColumn)));
    store
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_store_is_empty_and_clean() {
    let store = StateStore::default();
    assert!(store.snapshot().is_empty());
    assert_eq!(store.revision(), 0);
    assert!(!store.is_dirty());
    assert!(!store.can_undo());
}

#[test]
fn with_state_uses_given_tree() {
    let mut state = MediaKitState::new();
    let c = component("h1", "hero");
    state.layout.push(c.id.clone());
    state.components.insert(c.id.clone(), c);
    let store = StateStore::with_state(state, StoreConfig::default());
    assert!(store.component(&cid("h1")).is_some());
}

#[test]
fn config_defaults() {
    let cfg = StoreConfig::default();
    assert_eq!(cfg.max_history, 50);
    assert_eq!(cfg.event_capacity, 256);
}

// ── Dispatch ─────────────────────────────────────────────────────

#[test]
fn add_component_appends_to_layout() {
    let store = StateStore::default();
    assert_eq!(store.dispatch(Action::add(component("a", "hero"))), DispatchOutcome::Applied);
    assert_eq!(store.dispatch(Action::add(component("b", "biography"))), DispatchOutcome::Applied);
    let state = store.snapshot();
    assert_eq!(state.layout, vec![cid("a"), cid("b")]);
    assert_eq!(store.revision(), 2);
    assert!(store.is_dirty());
}

#[test]
fn add_component_at_position() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    store.dispatch(Action::AddComponent {
        component: component("b", "hero"),
        section_id: None,
        position: Some(0),
    });
    assert_eq!(store.snapshot().layout, vec![cid("b"), cid("a")]);
}

#[test]
fn add_duplicate_id_is_ignored() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    assert_eq!(store.dispatch(Action::add(component("a", "topics"))), DispatchOutcome::Ignored);
    assert_eq!(store.component(&cid("a")).unwrap().component_type, "hero");
}

#[test]
fn add_to_section_sets_owner() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    let state = store.snapshot();
    assert_eq!(state.section(&sid("s1")).unwrap().components, vec![cid("a")]);
    assert_eq!(state.component(&cid("a")).unwrap().section_id, Some(sid("s1")));
}

#[test]
fn add_to_missing_section_is_ignored() {
    let store = StateStore::default();
    let outcome = store.dispatch(Action::add_to_section(component("a", "hero"), sid("nope")));
    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert!(store.snapshot().components.is_empty());
}

#[test]
fn actions_on_missing_ids_are_noops() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    let ghost = cid("ghost");
    for action in [
        Action::RemoveComponent { id: ghost.clone() },
        Action::UpdateComponent { id: ghost.clone(), props: serde_json::Map::new() },
        Action::MoveComponent { id: ghost.clone(), to: MoveTarget::Up },
        Action::DuplicateComponent { id: ghost.clone(), new_id: None },
        Action::MoveToSection { id: ghost.clone(), section_id: sid("s"), position: None },
        Action::RemoveSection { section_id: sid("s") },
        Action::UpdateSection { section_id: sid("s"), layout: SectionLayout::Grid },
    ] {
        assert_eq!(store.dispatch(action), DispatchOutcome::Ignored);
    }
    assert_eq!(store.revision(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn remove_component_cleans_layout_and_section() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    store.dispatch(Action::RemoveComponent { id: cid("a") });
    let state = store.snapshot();
    assert!(state.components.is_empty());
    assert!(state.layout.is_empty());
    assert!(state.section(&sid("s1")).unwrap().components.is_empty());
}

#[test]
fn update_component_merges_props() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero").with_props(json!({"title": "x", "k": 1}))));
    store.dispatch(Action::UpdateComponent {
        id: cid("a"),
        props: json!({"title": "y"}).as_object().unwrap().clone(),
    });
    assert_eq!(store.component(&cid("a")).unwrap().props, json!({"title": "y", "k": 1}));
}

#[test]
fn move_component_in_layout() {
    let store = StateStore::default();
    for id in ["a", "b", "c"] {
        store.dispatch(Action::add(component(id, "hero")));
    }
    store.dispatch(Action::MoveComponent { id: cid("c"), to: MoveTarget::Up });
    assert_eq!(store.snapshot().layout, vec![cid("a"), cid("c"), cid("b")]);
    store.dispatch(Action::MoveComponent { id: cid("a"), to: MoveTarget::Index(5) });
    assert_eq!(store.snapshot().layout, vec![cid("c"), cid("b"), cid("a")]);
    assert_eq!(
        store.dispatch(Action::MoveComponent { id: cid("c"), to: MoveTarget::Up }),
        DispatchOutcome::Ignored
    );
}

#[test]
fn move_component_within_section() {
    let store = store_with_section();
    for id in ["a", "b"] {
        store.dispatch(Action::add_to_section(component(id, "hero"), sid("s1")));
    }
    store.dispatch(Action::MoveComponent { id: cid("a"), to: MoveTarget::Down });
    let state = store.snapshot();
    assert_eq!(state.section(&sid("s1")).unwrap().components, vec![cid("b"), cid("a")]);
    assert_eq!(state.layout, vec![cid("a"), cid("b")]);
}

#[test]
fn move_to_section_reassigns_owner() {
    let store = store_with_section();
    store.dispatch(Action::AddSection(Section::with_id(sid("s2"), SectionLayout::FullWidth)));
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    store.dispatch(Action::MoveToSection { id: cid("a"), section_id: sid("s2"), position: None });
    let state = store.snapshot();
    assert!(state.section(&sid("s1")).unwrap().components.is_empty());
    assert_eq!(state.section(&sid("s2")).unwrap().components, vec![cid("a")]);
    assert_eq!(state.component(&cid("a")).unwrap().section_id, Some(sid("s2")));
}

#[test]
fn duplicate_inserts_after_original() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    store.dispatch(Action::add_to_section(component("b", "hero"), sid("s1")));
    store.dispatch(Action::DuplicateComponent { id: cid("a"), new_id: Some(cid("a2")) });
    let state = store.snapshot();
    assert_eq!(state.layout, vec![cid("a"), cid("a2"), cid("b")]);
    assert_eq!(
        state.section(&sid("s1")).unwrap().components,
        vec![cid("a"), cid("a2"), cid("b")]
    );
    assert_eq!(state.component(&cid("a2")).unwrap().component_type, "hero");
}

#[test]
fn duplicate_generates_id() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "topics")));
    store.dispatch(Action::DuplicateComponent { id: cid("a"), new_id: None });
    let state = store.snapshot();
    assert_eq!(state.components.len(), 2);
    assert!(state.layout[1].as_str().starts_with("topics-"));
}

#[test]
fn set_layout_filters_unknown_and_repeated() {
    let store = StateStore::default();
    for id in ["a", "b"] {
        store.dispatch(Action::add(component(id, "hero")));
    }
    store.dispatch(Action::SetLayout(vec![cid("b"), cid("zz"), cid("a"), cid("b")]));
    assert_eq!(store.snapshot().layout, vec![cid("b"), cid("a")]);
}

#[test]
fn remove_section_unassigns_components() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    store.dispatch(Action::RemoveSection { section_id: sid("s1") });
    let state = store.snapshot();
    assert!(state.sections.is_empty());
    assert_eq!(state.component(&cid("a")).unwrap().section_id, None);
    assert_eq!(state.layout, vec![cid("a")]);
}

#[test]
fn add_section_claims_existing_components() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    let mut s2 = Section::with_id(sid("s2"), SectionLayout::Grid);
    s2.components = vec![cid("a"), cid("ghost")];
    store.dispatch(Action::AddSection(s2));
    let state = store.snapshot();
    assert!(state.section(&sid("s1")).unwrap().components.is_empty());
    assert_eq!(state.section(&sid("s2")).unwrap().components, vec![cid("a")]);
    assert_eq!(state.component(&cid("a")).unwrap().section_id, Some(sid("s2")));
}

#[test]
fn update_section_layout() {
    let store = store_with_section();
    store.dispatch(Action::UpdateSection { section_id: sid("s1"), layout: SectionLayout::Grid });
    assert_eq!(store.snapshot().sections[0].section_type, SectionLayout::Grid);
    assert_eq!(
        store.dispatch(Action::UpdateSection { section_id: sid("s1"), layout: SectionLayout::Grid }),
        DispatchOutcome::Ignored
    );
}

#[test]
fn global_settings_and_theme() {
    let store = StateStore::default();
    store.dispatch(Action::UpdateGlobalSettings(
        json!({"layout": {"maxWidth": "900px"}}).as_object().unwrap().clone(),
    ));
    store.dispatch(Action::SetTheme("dark".into()));
    let state = store.snapshot();
    assert_eq!(state.global_settings.layout.max_width, "900px");
    assert_eq!(state.theme, "dark");
    assert_eq!(store.dispatch(Action::SetTheme("dark".into())), DispatchOutcome::Ignored);
}

#[test]
fn clear_all_keeps_sections() {
    let store = store_with_section();
    store.dispatch(Action::add_to_section(component("a", "hero"), sid("s1")));
    store.dispatch(Action::ClearAll);
    let state = store.snapshot();
    assert!(state.components.is_empty());
    assert_eq!(state.sections.len(), 1);
    assert!(state.sections[0].components.is_empty());
}

#[test]
fn set_and_reset_state() {
    let store = StateStore::default();
    let mut next = MediaKitState::new();
    next.theme = "bold".into();
    store.dispatch(Action::SetState(Box::new(next)));
    assert_eq!(store.snapshot().theme, "bold");
    store.dispatch(Action::ResetState);
    assert_eq!(*store.snapshot(), MediaKitState::default());
}

#[test]
fn snapshots_are_immutable() {
    let store = StateStore::default();
    let before = store.snapshot();
    store.dispatch(Action::add(component("a", "hero")));
    assert!(before.components.is_empty());
    assert_eq!(store.snapshot().components.len(), 1);
}

// ── Notifications ────────────────────────────────────────────────

#[test]
fn each_dispatch_notifies_once() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    store.dispatch(Action::add(component("a", "hero")));
    store.dispatch(Action::add(component("b", "hero")));
    assert_eq!(
        drain(&mut rx),
        vec![
            StoreEvent::Changed { revision: 1, actions: vec![ActionKind::AddComponent] },
            StoreEvent::Changed { revision: 2, actions: vec![ActionKind::AddComponent] },
        ]
    );
}

#[test]
fn five_adds_in_a_batch_notify_once() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    store.batch(|s| {
        for i in 0..5 {
            s.dispatch(Action::add(component(&format!("c{i}"), "hero")));
        }
        assert!(s.in_batch());
    });
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0],
        StoreEvent::Changed { revision: 5, actions: vec![ActionKind::AddComponent; 5] }
    );
    assert_eq!(store.snapshot().components.len(), 5);
    assert!(!store.in_batch());
}

#[test]
fn nested_batches_notify_once_at_outermost() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    {
        let _outer = store.begin_batch();
        store.dispatch(Action::add(component("a", "hero")));
        {
            let _inner = store.begin_batch();
            store.dispatch(Action::add(component("b", "hero")));
        }
        assert!(drain(&mut rx).is_empty());
    }
    assert_eq!(drain(&mut rx).len(), 1);
}

#[test]
fn empty_batch_is_silent() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    store.batch(|s| {
        s.dispatch(Action::RemoveComponent { id: cid("ghost") });
    });
    assert!(drain(&mut rx).is_empty());
    assert!(!store.can_undo());
}

#[test]
fn batch_guard_closes_on_panic() {
    let store = Arc::new(StateStore::default());
    let cloned = Arc::clone(&store);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: () = cloned.batch(|s| {
            s.dispatch(Action::add(component("a", "hero")));
            panic!("boom");
        });
    }));
    assert!(result.is_err());
    assert!(!store.in_batch());
    assert_eq!(store.snapshot().components.len(), 1);
}

// ── History ──────────────────────────────────────────────────────

#[test]
fn undo_and_redo() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    store.dispatch(Action::add(component("a", "hero")));
    store.dispatch(Action::add(component("b", "hero")));
    drain(&mut rx);

    assert!(store.undo());
    assert_eq!(store.snapshot().layout, vec![cid("a")]);
    assert!(store.can_redo());
    assert!(store.redo());
    assert_eq!(store.snapshot().layout, vec![cid("a"), cid("b")]);

    let events = drain(&mut rx);
    assert_eq!(
        events,
        vec![
            StoreEvent::HistoryRestored { revision: 3, direction: HistoryDirection::Undo },
            StoreEvent::HistoryRestored { revision: 4, direction: HistoryDirection::Redo },
        ]
    );
}

#[test]
fn new_change_clears_redo() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    store.undo();
    store.dispatch(Action::add(component("b", "hero")));
    assert!(!store.can_redo());
    assert!(!store.redo());
}

#[test]
fn batch_is_one_undo_step() {
    let store = StateStore::default();
    store.batch(|s| {
        s.dispatch(Action::add(component("a", "hero")));
        s.dispatch(Action::add(component("b", "hero")));
    });
    assert!(store.undo());
    assert!(store.snapshot().components.is_empty());
    assert!(!store.can_undo());
}

#[test]
fn undo_unavailable_mid_batch() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    let _guard = store.begin_batch();
    assert!(!store.undo());
}

#[test]
fn history_is_bounded() {
    let store = StateStore::new(StoreConfig { max_history: 2, ..Default::default() });
    for i in 0..5 {
        store.dispatch(Action::add(component(&format!("c{i}"), "hero")));
    }
    assert!(store.undo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.snapshot().components.len(), 3);
}

// ── Dirty tracking ───────────────────────────────────────────────

#[test]
fn mark_saved_clears_dirty() {
    let store = StateStore::default();
    let mut rx = store.subscribe();
    store.dispatch(Action::add(component("a", "hero")));
    let (_, revision) = store.snapshot_with_revision();
    store.mark_saved(revision);
    assert!(!store.is_dirty());
    assert_eq!(store.saved_revision(), 1);
    assert_eq!(drain(&mut rx).last(), Some(&StoreEvent::Saved { revision: 1 }));
}

#[test]
fn stale_save_confirmation_is_ignored() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    store.dispatch(Action::add(component("b", "hero")));
    store.mark_saved(2);
    store.mark_saved(1);
    assert_eq!(store.saved_revision(), 2);
}

#[test]
fn change_after_save_is_dirty() {
    let store = StateStore::default();
    store.dispatch(Action::add(component("a", "hero")));
    store.mark_saved(store.revision());
    store.dispatch(Action::SetTheme("x".into()));
    assert!(store.is_dirty());
}

// ── Concurrency ──────────────────────────────────────────────────

#[test]
fn concurrent_dispatches_all_apply() {
    let store = Arc::new(StateStore::default());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..10 {
                    store.dispatch(Action::add(component(&format!("t{t}-{i}"), "hero")));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let state = store.snapshot();
    assert_eq!(state.components.len(), 80);
    assert_eq!(state.layout.len(), 80);
    assert_eq!(store.revision(), 80);
}
