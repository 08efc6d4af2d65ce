//! Zoom-dependent community labels and listing-count badges.
//!
//! Level of detail by zoom:
//!
//! | zoom            | labels                         | badges            |
//! |-----------------|--------------------------------|-------------------|
//! | `< 10`          | none                           | none              |
//! | `10 ..= 11`     | only spread > 0.0001           | if none selected  |
//! | `> 11`          | every in-viewport community    | if none selected  |
//!
//! Candidates are culled against the viewport before anything is built.

use crate::config::{LABEL_MIN_SPREAD, LABEL_MIN_ZOOM, LABEL_SPREAD_CULL_MAX_ZOOM};
use crate::geo::{viewport_contains, Bounds, LatLng};
use crate::model::CommunityId;
use crate::polygon_layer::PolygonRender;
use crate::selection::SelectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDetail {
    Hidden,
    /// Only communities large enough to read at this zoom.
    LargeOnly,
    All,
}

pub fn label_detail(zoom: f64) -> LabelDetail {
    if zoom < LABEL_MIN_ZOOM {
        LabelDetail::Hidden
    } else if zoom <= LABEL_SPREAD_CULL_MAX_ZOOM {
        LabelDetail::LargeOnly
    } else {
        LabelDetail::All
    }
}

/// Label font size in points.
pub fn label_font_size(zoom: f64) -> f32 {
    if zoom < 11.0 {
        10.0
    } else if zoom < 12.0 {
        11.0
    } else if zoom < 13.0 {
        12.0
    } else if zoom < 14.0 {
        14.0
    } else {
        16.0
    }
}

/// Badge circle diameter in pixels.
pub fn badge_diameter(listings_count: u32) -> f32 {
    match listings_count {
        0..=9 => 24.0,
        10..=49 => 30.0,
        50..=99 => 36.0,
        _ => 42.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelRender {
    pub community: CommunityId,
    pub text: String,
    pub position: LatLng,
    pub font_size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BadgeRender {
    pub community: CommunityId,
    pub position: LatLng,
    pub count: u32,
    pub diameter: f32,
}

#[derive(Debug, Default)]
pub struct LabelLayer {
    pub labels: Vec<LabelRender>,
    pub badges: Vec<BadgeRender>,
}

impl LabelLayer {
    /// Clear and rebuild labels and badges for the given view.
    pub fn rebuild(
        &mut self,
        polygons: &[PolygonRender],
        visible: &Bounds,
        zoom: f64,
        selection: &SelectionState,
    ) {
        self.labels.clear();
        self.badges.clear();

        let detail = label_detail(zoom);
        if detail == LabelDetail::Hidden {
            return;
        }
        let font_size = label_font_size(zoom);
        let show_badges = selection.selected_community.is_none();

        for polygon in polygons {
            if !viewport_contains(visible, polygon.centroid) {
                continue;
            }
            if detail == LabelDetail::All || polygon.spread > LABEL_MIN_SPREAD {
                self.labels.push(LabelRender {
                    community: polygon.id.clone(),
                    text: polygon.name.clone(),
                    position: polygon.centroid,
                    font_size,
                });
            }
            if show_badges && polygon.listings_count > 0 {
                self.badges.push(BadgeRender {
                    community: polygon.id.clone(),
                    position: polygon.centroid,
                    count: polygon.listings_count,
                    diameter: badge_diameter(polygon.listings_count),
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.badges.clear();
    }
}
