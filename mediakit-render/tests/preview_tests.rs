use mediakit_model::{Component, MediaKitState, Section, SectionLayout};
use mediakit_render::{
    ComponentRegistry, Preview, RenderCoordinator, RenderEvent, RenderRequest, RenderState,
    RequestOutcome,
};
use mediakit_types::{ComponentId, Priority, RenderKey, SectionId};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn cid(s: &str) -> ComponentId {
    ComponentId::parse(s).unwrap()
}

fn sid(s: &str) -> SectionId {
    SectionId::parse(s).unwrap()
}

fn make_preview() -> (Preview, RenderCoordinator) {
    (
        Preview::new(Arc::new(ComponentRegistry::with_builtins())),
        RenderCoordinator::default(),
    )
}

fn add(state: &mut MediaKitState, id: &str, ty: &str, props: serde_json::Value) {
    let component = Component::with_id(cid(id), ty).with_props(props);
    state.layout.push(component.id.clone());
    state.components.insert(component.id.clone(), component);
}

fn add_section(state: &mut MediaKitState, id: &str, layout: SectionLayout, members: &[&str]) {
    let mut section = Section::with_id(sid(id), layout);
    for m in members {
        section.components.push(cid(m));
        if let Some(c) = state.components.get_mut(&cid(m)) {
            c.section_id = Some(sid(id));
        }
    }
    state.sections.push(section);
}

fn column_ids(preview: &Preview, container: &str) -> Vec<String> {
    preview
        .document()
        .container(container)
        .map(|c| c.elements.iter().map(|e| e.id.clone()).collect())
        .unwrap_or_default()
}

// ── Single components ────────────────────────────────────────────

#[test]
fn double_request_yields_one_node() {
    let (preview, coordinator) = make_preview();
    let hero = Component::with_id(cid("hero-1"), "hero").with_props(json!({"title": "Ada"}));
    assert_eq!(coordinator.request(RenderRequest::component(hero.clone())), RequestOutcome::Queued);
    assert_eq!(
        coordinator.request(RenderRequest::component(hero.clone())),
        RequestOutcome::AlreadyQueued
    );
    coordinator.process_queue(&preview);
    assert_eq!(
        coordinator.request(RenderRequest::component(hero)),
        RequestOutcome::AlreadyRendered
    );
    coordinator.process_queue(&preview);

    let doc = preview.document();
    assert_eq!(doc.count("hero-1"), 1);
    assert!(doc.find("hero-1").unwrap().html.contains("Ada"));
}

#[test]
fn rendering_state_twice_keeps_single_nodes() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "a", "hero", json!({}));
    add(&mut state, "b", "biography", json!({"biography": "Bio"}));
    preview.render_state(&state, &coordinator);
    preview.render_state(&state, &coordinator);
    let doc = preview.document();
    assert_eq!(doc.count("a"), 1);
    assert_eq!(doc.count("b"), 1);
    assert_eq!(doc.len(), 2);
}

#[test]
fn unknown_type_renders_generic_placeholder() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "w1", "widget-x", json!({}));
    let report = preview.render_state(&state, &coordinator);
    assert_eq!(report.rendered, 1);
    let html = preview.to_html();
    assert!(html.contains("gmkb-generic"));
    assert!(html.contains("Widget-x"));
}

#[test]
fn wrapper_carries_component_attributes() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "h1", "hero", json!({}));
    preview.render_state(&state, &coordinator);
    let doc = preview.document();
    let element = doc.find("h1").unwrap();
    assert_eq!(element.attribute("class"), Some("gmkb-component"));
    assert_eq!(element.attribute("data-component-id"), Some("h1"));
    assert_eq!(element.controls.len(), 5);
}

#[test]
fn invalid_props_leave_error_placeholder() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "bad", "hero", json!({"title": 42}));
    add(&mut state, "good", "contact", json!({"email": "x@y.z"}));
    let report = preview.render_state(&state, &coordinator);

    assert_eq!((report.rendered, report.failed), (1, 1));
    assert_eq!(coordinator.state(&RenderKey::component("hero", "bad")), RenderState::Failed);
    let doc = preview.document();
    let bad = doc.find("bad").unwrap();
    assert!(bad.attribute("class").unwrap().contains("gmkb-render-error"));
    assert!(bad.html.contains("title"));
    assert!(doc.find("good").unwrap().html.contains("mailto:x@y.z"));
}

#[test]
fn unsectioned_components_follow_layout_order() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "a", "hero", json!({}));
    add(&mut state, "b", "hero", json!({}));
    add(&mut state, "c", "hero", json!({}));
    preview.render_state(&state, &coordinator);
    state.layout = vec![cid("c"), cid("a"), cid("b")];
    preview.render_state(&state, &coordinator);
    assert_eq!(column_ids(&preview, "media-kit-preview"), vec!["c", "a", "b"]);
}

// ── Controls ─────────────────────────────────────────────────────

#[test]
fn controls_attach_once_across_rerenders() {
    let (preview, coordinator) = make_preview();
    let mut rx = coordinator.subscribe();
    let mut state = MediaKitState::new();
    add(&mut state, "h1", "hero", json!({"title": "One"}));
    preview.render_state(&state, &coordinator);

    state.components.get_mut(&cid("h1")).unwrap().props = json!({"title": "Two"});
    assert!(preview.invalidate_component(state.component(&cid("h1")).unwrap(), &coordinator));
    preview.render_state(&state, &coordinator);

    assert!(preview.document().find("h1").unwrap().html.contains("Two"));
    let attached = std::iter::from_fn(|| rx.try_recv().ok())
        .filter(|e| matches!(e, RenderEvent::ControlsAttached { .. }))
        .count();
    assert_eq!(attached, 1);
}

// ── Sections ─────────────────────────────────────────────────────

#[test]
fn section_distributes_components_round_robin() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    for id in ["c0", "c1", "c2"] {
        add(&mut state, id, "hero", json!({}));
    }
    add_section(&mut state, "s1", SectionLayout::TwoColumn, &["c0", "c1", "c2"]);
    let report = preview.render_state(&state, &coordinator);

    assert_eq!(report.rendered, 4);
    assert_eq!(column_ids(&preview, "section-s1-col-0"), vec!["c0", "c2"]);
    assert_eq!(column_ids(&preview, "section-s1-col-1"), vec!["c1"]);
    assert!(column_ids(&preview, "media-kit-preview").is_empty());
    let html = preview.to_html();
    assert!(html.contains("gmkb-section gmkb-section--two_column"));
    assert!(!html.contains("gmkb-component--pending"));
}

#[test]
fn section_render_publishes_event() {
    let (preview, coordinator) = make_preview();
    let mut rx = coordinator.subscribe();
    let mut state = MediaKitState::new();
    add(&mut state, "c0", "hero", json!({}));
    add_section(&mut state, "s1", SectionLayout::FullWidth, &["c0"]);
    preview.render_state(&state, &coordinator);
    let seen = std::iter::from_fn(|| rx.try_recv().ok()).any(|e| {
        e == RenderEvent::SectionRendered { section_id: sid("s1"), components: 1 }
    });
    assert!(seen);
}

#[test]
fn section_components_inherit_priority() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "c0", "hero", json!({}));
    add(&mut state, "loose", "hero", json!({}));
    add_section(&mut state, "s1", SectionLayout::FullWidth, &["c0"]);
    preview.request_state(&state, &coordinator, Priority::High);
    coordinator.process_queue(&preview);
    assert_eq!(coordinator.queued_keys(), vec![RenderKey::component("hero", "c0")]);
    let again = RenderRequest::component(state.component(&cid("c0")).unwrap().clone())
        .with_priority(Priority::High);
    assert_eq!(coordinator.request(again), RequestOutcome::AlreadyQueued);
}

#[test]
fn layout_change_relays_columns() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    for id in ["c0", "c1", "c2"] {
        add(&mut state, id, "hero", json!({}));
    }
    add_section(&mut state, "s1", SectionLayout::ThreeColumn, &["c0", "c1", "c2"]);
    preview.render_state(&state, &coordinator);

    state.sections[0].section_type = SectionLayout::FullWidth;
    preview.render_state(&state, &coordinator);

    assert_eq!(column_ids(&preview, "section-s1-col-0"), vec!["c0", "c1", "c2"]);
    assert!(!preview.document().has_container("section-s1-col-1"));
    assert_eq!(preview.document().count("c1"), 1);
}

#[test]
fn moving_between_sections_keeps_one_node() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "c0", "hero", json!({}));
    add_section(&mut state, "s1", SectionLayout::FullWidth, &["c0"]);
    add_section(&mut state, "s2", SectionLayout::FullWidth, &[]);
    preview.render_state(&state, &coordinator);

    state.sections[0].components.clear();
    state.sections[1].components.push(cid("c0"));
    state.components.get_mut(&cid("c0")).unwrap().section_id = Some(sid("s2"));
    preview.render_state(&state, &coordinator);

    assert!(column_ids(&preview, "section-s1-col-0").is_empty());
    assert_eq!(column_ids(&preview, "section-s2-col-0"), vec!["c0"]);
    assert_eq!(preview.document().count("c0"), 1);
}

// ── Pruning ──────────────────────────────────────────────────────

#[test]
fn removed_components_and_sections_are_pruned() {
    let (preview, coordinator) = make_preview();
    let mut state = MediaKitState::new();
    add(&mut state, "a", "hero", json!({}));
    add(&mut state, "b", "hero", json!({}));
    add_section(&mut state, "s1", SectionLayout::FullWidth, &["b"]);
    preview.render_state(&state, &coordinator);

    state.components.remove(&cid("a"));
    state.layout.retain(|id| id.as_str() != "a");
    state.sections.clear();
    state.components.get_mut(&cid("b")).unwrap().section_id = None;
    preview.render_state(&state, &coordinator);

    let doc = preview.document();
    assert!(doc.find("a").is_none());
    assert!(!doc.has_container("section-s1"));
    assert_eq!(doc.count("b"), 1);
    assert_eq!(doc.container_of("b"), Some("media-kit-preview"));
    drop(doc);
    assert_eq!(coordinator.state(&RenderKey::component("hero", "a")), RenderState::Idle);
}
