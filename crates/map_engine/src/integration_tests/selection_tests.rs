//! Selection state machine driven end to end through `MapEvent`s.

use crate::model::{CommunityId, ListingId};
use crate::selection::{MapEvent, MapNotification};
use crate::spatial_query::{FetchStatus, InMemoryListingSource};
use crate::test_harness::{listing_record, square_community, TestMap};
use crate::viewport::FitKind;
use crate::LoadMapData;

fn two_communities() -> Vec<crate::CommunityRecord> {
    vec![
        square_community("a", "Arcadia", 33.45, -112.05, 0.02, 5),
        square_community("b", "Biltmore", 33.50, -112.02, 0.02, 12),
    ]
}

fn cid(s: &str) -> CommunityId {
    CommunityId::new(s)
}

#[test]
fn test_select_a_then_b_leaves_only_b() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    map.send(MapEvent::select_community(cid("b")));

    map.assert_selected(Some("b"));
    let notes = map.drain_notifications();
    assert!(notes.iter().any(|n| matches!(
        n,
        MapNotification::CommunitySelected { id, url } if id.0 == "b" && url == "/communities/biltmore"
    )));
    // A direct replace never passes through Idle.
    assert!(!notes
        .iter()
        .any(|n| matches!(n, MapNotification::CommunityDeselected(_))));
}

#[test]
fn test_reclick_returns_to_default_viewport() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    map.settle_viewport();
    assert!(map.viewport().zoom > map.config().default_zoom);

    map.send(MapEvent::select_community(cid("a")));
    map.assert_selected(None);
    map.settle_viewport();
    map.assert_viewport_at_default();
    assert_eq!(map.listing_set().status, FetchStatus::Idle);
}

#[test]
fn test_background_click_deselects() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("b")));
    map.send(MapEvent::background_click());
    map.assert_selected(None);
    let notes = map.drain_notifications();
    assert!(notes.contains(&MapNotification::CommunityDeselected(cid("b"))));
}

#[test]
fn test_unknown_community_is_ignored() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("nope")));
    map.assert_selected(None);
    assert!(map.resource::<crate::viewport::ViewportController>().active_fit().is_none());
}

#[test]
fn test_selection_starts_single_fit() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    let controller = map.resource::<crate::viewport::ViewportController>();
    assert_eq!(controller.active_fit(), Some(&FitKind::Community(cid("a"))));
}

#[test]
fn test_hover_does_not_change_selection() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    map.send(MapEvent::hover_community(cid("b")));
    map.assert_selected(Some("a"));
    assert_eq!(map.selection().hovered_community, Some(cid("b")));

    map.send(MapEvent::hover_end_community(cid("b")));
    assert_eq!(map.selection().hovered_community, None);
}

#[test]
fn test_preview_opens_popup_and_select_navigates() {
    let source = InMemoryListingSource::new(vec![listing_record("l1", 33.46, -112.04, 650_000.0)]);
    let mut map = TestMap::new()
        .with_provider(source)
        .with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    assert!(map.wait_for_fetch());

    map.send(MapEvent::preview_listing(ListingId::new("l1")));
    let popup = map.render().markers.popup.clone();
    assert_eq!(popup.map(|p| p.price), Some("$650K".to_string()));

    map.drain_notifications();
    map.send(MapEvent::select_listing(ListingId::new("l1")));
    let notes = map.drain_notifications();
    assert!(notes.contains(&MapNotification::ListingSelected {
        id: ListingId::new("l1"),
        url: "/listing/MLS-l1".to_string(),
    }));
}

#[test]
fn test_close_popup_keeps_community_selected() {
    let source = InMemoryListingSource::new(vec![listing_record("l1", 33.46, -112.04, 650_000.0)]);
    let mut map = TestMap::new()
        .with_provider(source)
        .with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    assert!(map.wait_for_fetch());
    map.send(MapEvent::preview_listing(ListingId::new("l1")));
    map.send(MapEvent::close_popup(ListingId::new("l1")));

    assert!(map.render().markers.popup.is_none());
    map.assert_selected(Some("a"));
}

#[test]
fn test_load_with_selection_selects_once() {
    let mut map = TestMap::new();
    let load = LoadMapData {
        communities: two_communities(),
        selected_community: Some(cid("a")),
        ..Default::default()
    };
    map.load(load.clone());
    map.assert_selected(Some("a"));

    // Re-sending the same selection must not toggle it off.
    map.load(load);
    map.assert_selected(Some("a"));
}

#[test]
fn test_reset_clears_everything() {
    let mut map = TestMap::new().with_communities(two_communities());
    map.send(MapEvent::select_community(cid("a")));
    map.send(MapEvent::hover_community(cid("b")));
    map.reset();

    assert_eq!(*map.selection(), crate::SelectionState::default());
    map.assert_viewport_at_default();
    assert_eq!(map.listing_set().status, FetchStatus::Idle);
    assert_eq!(
        map.resource::<crate::viewport::ViewportController>()
            .last_fit_count(),
        None
    );
}
