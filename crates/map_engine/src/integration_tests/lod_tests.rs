//! Level-of-detail and restyle behavior of the render systems.

use crate::geo::{LatLng, RawPoint};
use crate::model::{CommunityId, CommunityRecord, RawId};
use crate::selection::MapEvent;
use crate::test_harness::{square_community, TestMap};
use crate::LoadMapData;

const CENTER: LatLng = LatLng::new(33.5, -112.0);

/// Three small communities around `CENTER` plus one with only two points.
fn neighborhood() -> Vec<CommunityRecord> {
    vec![
        square_community("a", "Arcadia", 33.49, -112.01, 0.004, 3),
        square_community("b", "Biltmore", 33.50, -112.00, 0.004, 40),
        square_community("c", "Camelback", 33.495, -111.995, 0.004, 0),
        CommunityRecord {
            id: RawId::Number(99),
            name: "Sliver".to_string(),
            slug: None,
            coordinates: vec![RawPoint::Pair([33.5, -112.0]), RawPoint::Pair([33.51, -112.0])],
            bounds: None,
            listings_count: Some(8),
        },
    ]
}

#[test]
fn test_zoom_nine_draws_no_labels_or_badges() {
    let mut map = TestMap::new().with_communities(neighborhood());
    map.jump_to(CENTER, 9.0);
    assert!(map.render().labels.labels.is_empty());
    assert!(map.render().labels.badges.is_empty());
    // Polygons are still drawn.
    assert_eq!(map.render().polygons.len(), 3);
}

#[test]
fn test_zoom_fourteen_labels_every_visible_community() {
    let mut map = TestMap::new().with_communities(neighborhood());
    map.jump_to(CENTER, 14.0);
    let mut labelled: Vec<&str> = map
        .render()
        .labels
        .labels
        .iter()
        .map(|l| l.community.0.as_str())
        .collect();
    labelled.sort();
    assert_eq!(labelled, vec!["a", "b", "c"]);
    assert!(map
        .render()
        .labels
        .labels
        .iter()
        .all(|l| l.font_size == 16.0));
}

#[test]
fn test_low_zoom_skips_small_spread() {
    let mut map = TestMap::new().with_communities(neighborhood());
    map.jump_to(CENTER, 10.5);
    // 0.004 x 0.004 degrees is below the minimum spread.
    assert!(map.render().labels.labels.is_empty());
    // Badges still show for communities with listings.
    assert_eq!(map.render().labels.badges.len(), 2);
}

#[test]
fn test_two_point_community_yields_no_polygon() {
    let mut map = TestMap::new();
    map.load(LoadMapData {
        communities: vec![neighborhood().remove(3)],
        ..Default::default()
    });
    assert_eq!(map.render().polygons.len(), 0);
    assert!(map.data().communities.is_empty());
}

#[test]
fn test_badges_hidden_once_selected() {
    let mut map = TestMap::new().with_communities(neighborhood());
    map.jump_to(CENTER, 14.0);
    assert_eq!(map.render().labels.badges.len(), 2);

    map.send(MapEvent::select_community(CommunityId::new("b")));
    assert!(map.render().labels.badges.is_empty());
}

#[test]
fn test_hover_restyles_without_rebuilding_geometry() {
    let mut map = TestMap::new().with_communities(neighborhood());
    let generation = map.render().polygons.geometry_generation;
    let restyled = map.render().polygons.restyle_count;

    map.send(MapEvent::hover_community(CommunityId::new("a")));
    map.send(MapEvent::hover_end_community(CommunityId::new("a")));

    assert_eq!(map.render().polygons.geometry_generation, generation);
    assert_eq!(map.render().polygons.restyle_count, restyled + 2);
}

#[test]
fn test_repeated_identical_load_has_no_duplicates() {
    let mut map = TestMap::new().with_communities(neighborhood());
    map.load(LoadMapData {
        communities: neighborhood(),
        ..Default::default()
    });
    map.jump_to(CENTER, 14.0);
    assert_eq!(map.render().polygons.len(), 3);
    assert_eq!(map.render().labels.labels.len(), 3);
}
