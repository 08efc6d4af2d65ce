//! Community boundary polygons.
//!
//! Geometry and style are kept apart. [`PolygonLayer::rebuild`] runs only
//! when the community set changes and bumps `geometry_generation`;
//! [`PolygonLayer::restyle`] runs on hover/selection changes and touches only
//! the polygons whose emphasis actually changed.

use serde_json::{json, Value};

use crate::config::BORDER_DARKEN;
use crate::geo::{centroid, close_ring, spread, LatLng};
use crate::model::{Community, CommunityId};
use crate::palette::{border_for, color_for, Rgb};
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Emphasis {
    #[default]
    Default,
    Hovered,
    /// Wins over hover.
    Selected,
}

impl Emphasis {
    pub fn of(id: &CommunityId, selection: &SelectionState) -> Self {
        if selection.selected_community.as_ref() == Some(id) {
            Emphasis::Selected
        } else if selection.hovered_community.as_ref() == Some(id) {
            Emphasis::Hovered
        } else {
            Emphasis::Default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonStyle {
    pub fill: Rgb,
    pub border: Rgb,
    /// Border width in pixels.
    pub weight: f32,
    pub fill_opacity: f32,
}

pub fn style_for(fill: Rgb, emphasis: Emphasis) -> PolygonStyle {
    let (weight, fill_opacity) = match emphasis {
        Emphasis::Default => (1.5, 0.25),
        Emphasis::Hovered => (2.5, 0.4),
        Emphasis::Selected => (3.5, 0.55),
    };
    PolygonStyle {
        fill,
        border: border_for(fill, BORDER_DARKEN),
        weight,
        fill_opacity,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonRender {
    pub id: CommunityId,
    pub name: String,
    pub slug: String,
    /// Closed ring.
    pub ring: Vec<LatLng>,
    pub centroid: LatLng,
    pub spread: f64,
    pub listings_count: u32,
    pub emphasis: Emphasis,
    pub style: PolygonStyle,
}

#[derive(Debug, Default)]
pub struct PolygonLayer {
    pub polygons: Vec<PolygonRender>,
    /// Bumped on every rebuild.
    pub geometry_generation: u64,
    /// Total polygons restyled since creation.
    pub restyle_count: u64,
}

impl PolygonLayer {
    /// Replace every polygon. Communities without a ring are skipped.
    pub fn rebuild(&mut self, communities: &[Community], selection: &SelectionState) {
        self.polygons.clear();
        for community in communities {
            let Some(ring) = community.ring.as_deref() else {
                continue;
            };
            let Some(center) = centroid(ring) else {
                continue;
            };
            let emphasis = Emphasis::of(&community.id, selection);
            self.polygons.push(PolygonRender {
                id: community.id.clone(),
                name: community.name.clone(),
                slug: community.slug.clone(),
                ring: close_ring(ring),
                centroid: center,
                spread: spread(ring),
                listings_count: community.listings_count,
                emphasis,
                style: style_for(color_for(&community.name), emphasis),
            });
        }
        self.geometry_generation += 1;
    }

    /// Update styles for the current hover/selection. Returns how many
    /// polygons changed.
    pub fn restyle(&mut self, selection: &SelectionState) -> usize {
        let mut changed = 0;
        for polygon in &mut self.polygons {
            let emphasis = Emphasis::of(&polygon.id, selection);
            if emphasis != polygon.emphasis {
                polygon.emphasis = emphasis;
                polygon.style = style_for(polygon.style.fill, emphasis);
                changed += 1;
            }
        }
        self.restyle_count += changed as u64;
        changed
    }

    pub fn get(&self, id: &CommunityId) -> Option<&PolygonRender> {
        self.polygons.iter().find(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// GeoJSON `FeatureCollection` of the current polygons.
    pub fn feature_collection(&self) -> Value {
        let features: Vec<Value> = self
            .polygons
            .iter()
            .map(|p| {
                let ring: Vec<[f64; 2]> = p.ring.iter().map(|pt| [pt.lng, pt.lat]).collect();
                json!({
                    "type": "Feature",
                    "id": p.id.0,
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [ring],
                    },
                    "properties": {
                        "id": p.id.0,
                        "name": p.name,
                        "slug": p.slug,
                        "listingsCount": p.listings_count,
                        "fill": p.style.fill.to_hex(),
                        "border": p.style.border.to_hex(),
                    },
                })
            })
            .collect();
        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn community(id: &str, points: usize) -> Community {
        let ring: Vec<LatLng> = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]
            .iter()
            .take(points)
            .map(|&(lat, lng)| LatLng::new(lat, lng))
            .collect();
        Community {
            id: CommunityId::new(id),
            name: format!("Community {id}"),
            slug: id.to_string(),
            ring: (points >= 3).then_some(ring),
            bounds: None,
            listings_count: 3,
        }
    }

    #[test]
    fn test_selected_wins_over_hovered() {
        let id = CommunityId::new("a");
        let selection = SelectionState {
            hovered_community: Some(id.clone()),
            selected_community: Some(id.clone()),
            ..Default::default()
        };
        assert_eq!(Emphasis::of(&id, &selection), Emphasis::Selected);
        let style = style_for(Rgb::new(10, 20, 30), Emphasis::Selected);
        assert_eq!(style.weight, 3.5);
        assert_eq!(style.fill_opacity, 0.55);
    }

    #[test]
    fn test_default_style_values() {
        let style = style_for(Rgb::new(200, 100, 40), Emphasis::Default);
        assert_eq!((style.weight, style.fill_opacity), (1.5, 0.25));
        assert_eq!(style.border, Rgb::new(130, 65, 26));
    }

    #[test]
    fn test_rebuild_skips_ringless_and_closes_rings() {
        let mut layer = PolygonLayer::default();
        layer.rebuild(
            &[community("a", 4), community("b", 2)],
            &SelectionState::default(),
        );
        assert_eq!(layer.len(), 1);
        let ring = &layer.polygons[0].ring;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(layer.polygons[0].centroid, LatLng::new(0.5, 0.5));
    }

    #[test]
    fn test_rebuild_twice_has_no_duplicates() {
        let mut layer = PolygonLayer::default();
        let communities = [community("a", 4), community("c", 3)];
        layer.rebuild(&communities, &SelectionState::default());
        layer.rebuild(&communities, &SelectionState::default());
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.geometry_generation, 2);
    }

    #[test]
    fn test_restyle_only_touches_changed_polygons() {
        let mut layer = PolygonLayer::default();
        layer.rebuild(
            &[community("a", 4), community("b", 4), community("c", 4)],
            &SelectionState::default(),
        );
        let hover = SelectionState {
            hovered_community: Some(CommunityId::new("b")),
            ..Default::default()
        };
        assert_eq!(layer.restyle(&hover), 1);
        assert_eq!(layer.restyle(&hover), 0);
        assert_eq!(layer.geometry_generation, 1);
        let b = layer.get(&CommunityId::new("b")).map(|p| p.style.weight);
        assert_eq!(b, Some(2.5));
    }

    #[test]
    fn test_feature_collection_uses_lng_lat_closed_rings() {
        let mut layer = PolygonLayer::default();
        let mut c = community("a", 3);
        c.ring = Some(vec![
            LatLng::new(33.0, -112.0),
            LatLng::new(33.0, -111.0),
            LatLng::new(34.0, -111.0),
        ]);
        layer.rebuild(&[c], &SelectionState::default());

        let fc = layer.feature_collection();
        assert_eq!(fc["type"], "FeatureCollection");
        let ring = fc["features"][0]["geometry"]["coordinates"][0]
            .as_array()
            .unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
        assert_eq!(ring[0][0], -112.0);
        assert_eq!(ring[0][1], 33.0);
        assert_eq!(fc["features"][0]["properties"]["listingsCount"], 3);
    }
}
