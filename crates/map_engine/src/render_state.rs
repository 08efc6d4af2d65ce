//! The engine-owned render output and the systems that keep it current.
//!
//! Each layer is rebuilt only when its inputs change. Polygons rebuild on a
//! new data generation and otherwise restyle; labels rebuild on any view,
//! geometry or selection change; markers rebuild on listing or listing-hover
//! changes.

use bevy::prelude::*;

use crate::geo::{Bounds, LatLng};
use crate::labels::LabelLayer;
use crate::markers::MarkerLayer;
use crate::model::{CommunityId, ListingId};
use crate::polygon_layer::PolygonLayer;
use crate::selection::SelectionState;
use crate::spatial_query::ListingSet;
use crate::viewport::ViewportState;
use crate::MapData;

#[derive(Debug, Clone, PartialEq)]
struct LabelKey {
    geometry_generation: u64,
    bounds: Bounds,
    zoom: f64,
    selected: Option<CommunityId>,
}

#[derive(Debug, Clone, PartialEq)]
struct MarkerKey {
    /// Community whose fetched listings are shown; `None` shows the loaded set.
    scope: Option<CommunityId>,
    source_generation: u64,
    hovered: Option<ListingId>,
    selected: Option<ListingId>,
}

#[derive(Resource, Default, Debug)]
pub struct RenderState {
    pub polygons: PolygonLayer,
    pub labels: LabelLayer,
    pub markers: MarkerLayer,
    data_generation: Option<u64>,
    styled_for: SelectionState,
    label_key: Option<LabelKey>,
    marker_key: Option<MarkerKey>,
}

impl RenderState {
    /// Where the detail popup is anchored, if one is open.
    pub fn popup_anchor(&self) -> Option<LatLng> {
        self.markers.popup.as_ref().map(|p| p.position)
    }
}

pub fn sync_polygons(
    data: Res<MapData>,
    selection: Res<SelectionState>,
    mut render: ResMut<RenderState>,
) {
    let render = &mut *render;
    if render.data_generation != Some(data.generation) {
        render.polygons.rebuild(&data.communities, &selection);
        render.data_generation = Some(data.generation);
        render.styled_for = (*selection).clone();
        debug!(
            "Rebuilt {} polygon(s) (generation {})",
            render.polygons.len(),
            render.polygons.geometry_generation
        );
        return;
    }

    let styled = &render.styled_for;
    if styled.hovered_community != selection.hovered_community
        || styled.selected_community != selection.selected_community
    {
        render.polygons.restyle(&selection);
        render.styled_for = (*selection).clone();
    }
}

pub fn sync_labels(
    view: Res<ViewportState>,
    selection: Res<SelectionState>,
    mut render: ResMut<RenderState>,
) {
    let key = LabelKey {
        geometry_generation: render.polygons.geometry_generation,
        bounds: view.bounds(),
        zoom: view.zoom,
        selected: selection.selected_community.clone(),
    };
    if render.label_key.as_ref() == Some(&key) {
        return;
    }
    let render = &mut *render;
    render
        .labels
        .rebuild(&render.polygons.polygons, &key.bounds, key.zoom, &selection);
    render.label_key = Some(key);
}

/// Markers show the fetched listings of the selected community, or the
/// loaded listing set when nothing is selected.
pub fn sync_markers(
    data: Res<MapData>,
    listing_set: Res<ListingSet>,
    selection: Res<SelectionState>,
    mut render: ResMut<RenderState>,
) {
    let scope = selection.selected_community.clone();
    let source_generation = if scope.is_some() {
        listing_set.generation
    } else {
        data.generation
    };
    let key = MarkerKey {
        scope,
        source_generation,
        hovered: selection.hovered_listing.clone(),
        selected: selection.selected_listing.clone(),
    };
    if render.marker_key.as_ref() == Some(&key) {
        return;
    }

    let listings = if key.scope.is_some() {
        &listing_set.listings
    } else {
        &data.listings
    };
    render.markers.rebuild(listings, &selection);
    render.marker_key = Some(key);
}
