use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

pub mod config;
pub mod engine_sets;
pub mod error;
pub mod geo;
pub mod labels;
pub mod markers;
pub mod model;
pub mod palette;
pub mod polygon_layer;
pub mod render_state;
pub mod selection;
pub mod spatial_query;
pub mod viewport;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use config::MapConfig;
pub use engine_sets::MapEngineSet;
pub use error::MapError;
pub use geo::{Bounds, LatLng};
pub use model::{Community, CommunityId, CommunityRecord, Listing, ListingId, ListingRecord};
pub use render_state::RenderState;
pub use selection::{MapAction, MapEvent, MapNotification, MapTarget, SelectionState};
pub use spatial_query::{InMemoryListingSource, ListingProvider, ListingSet, ListingSource};
pub use viewport::{ViewportController, ViewportState};

use model::{
    decode_records, lenient, lenient_seq, normalize_communities, normalize_listings, RawId,
    RejectedRecord,
};
use spatial_query::InFlightFetches;

// ---------------------------------------------------------------------------
// Map data
// ---------------------------------------------------------------------------

/// The normalized community and listing snapshot currently on the map.
#[derive(Resource, Default, Debug)]
pub struct MapData {
    pub communities: Vec<Community>,
    /// Listings supplied with the data load (not the per-community fetch).
    pub listings: Vec<Listing>,
    /// Bumped on every load.
    pub generation: u64,
    community_index: HashMap<CommunityId, usize>,
    listing_index: HashMap<ListingId, usize>,
}

impl MapData {
    pub fn replace(&mut self, communities: Vec<Community>, listings: Vec<Listing>) {
        self.community_index = communities
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        self.listing_index = listings
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.clone(), i))
            .collect();
        self.communities = communities;
        self.listings = listings;
        self.generation += 1;
    }

    pub fn community(&self, id: &CommunityId) -> Option<&Community> {
        self.community_index
            .get(id)
            .and_then(|&i| self.communities.get(i))
    }

    pub fn listing(&self, id: &ListingId) -> Option<&Listing> {
        self.listing_index.get(id).and_then(|&i| self.listings.get(i))
    }
}

// ---------------------------------------------------------------------------
// Inbound requests
// ---------------------------------------------------------------------------

/// Optional framing hints sent with a data load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportHints {
    pub center: Option<LatLng>,
    pub zoom: Option<f64>,
    /// Frame every community after loading (subject to the count dedup).
    pub fit_to_data: bool,
}

impl Default for ViewportHints {
    fn default() -> Self {
        Self {
            center: None,
            zoom: None,
            fit_to_data: true,
        }
    }
}

/// Render entry point: replace the data on the map.
///
/// `selected_community` makes that community selected when it is not
/// already; `None` leaves the current selection alone.
///
/// Decoding never fails on a single record: unreadable ones land in
/// `rejected` and are skipped at ingest like malformed geometry.
#[derive(Event, Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadMapData {
    pub communities: Vec<CommunityRecord>,
    pub listings: Vec<ListingRecord>,
    pub selected_community: Option<CommunityId>,
    pub hints: ViewportHints,
    #[serde(skip)]
    pub rejected: Vec<RejectedRecord>,
}

impl LoadMapData {
    /// Parse a JSON document of the same shape. Only a document that is not
    /// JSON at all is an error.
    pub fn from_json(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Wire form of [`LoadMapData`] with the records still undecoded.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LoadMapDataDocument {
    #[serde(deserialize_with = "lenient_seq")]
    communities: Vec<serde_json::Value>,
    #[serde(deserialize_with = "lenient_seq")]
    listings: Vec<serde_json::Value>,
    #[serde(deserialize_with = "lenient")]
    selected_community: Option<RawId>,
    #[serde(deserialize_with = "lenient")]
    hints: ViewportHints,
}

impl From<LoadMapDataDocument> for LoadMapData {
    fn from(doc: LoadMapDataDocument) -> Self {
        let mut rejected = Vec::new();
        let communities = decode_records(doc.communities, "community", &mut rejected);
        let listings = decode_records(doc.listings, "listing", &mut rejected);
        Self {
            communities,
            listings,
            selected_community: doc.selected_community.map(|id| CommunityId(id.to_string())),
            hints: doc.hints,
            rejected,
        }
    }
}

impl<'de> Deserialize<'de> for LoadMapData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LoadMapDataDocument::deserialize(deserializer).map(Self::from)
    }
}

/// Back to defaults: no selection, default view, no listings, no pending
/// fetches, no fit dedup.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ResetMap;

// ---------------------------------------------------------------------------
// Ingest systems
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn ingest_map_data(
    mut loads: EventReader<LoadMapData>,
    config: Res<MapConfig>,
    selection: Res<SelectionState>,
    mut data: ResMut<MapData>,
    mut view: ResMut<ViewportState>,
    mut controller: ResMut<ViewportController>,
    mut map_events: EventWriter<MapEvent>,
) {
    for load in loads.read() {
        let (communities, mut skipped) = normalize_communities(&load.communities);
        skipped.extend(load.rejected.iter().cloned().map(MapError::from));
        for err in &skipped {
            debug!("Skipping record: {}", err);
        }
        let listings = normalize_listings(&load.listings);
        info!(
            "Loaded {} communities and {} listings ({} records skipped)",
            communities.len(),
            listings.len(),
            skipped.len()
        );
        data.replace(communities, listings);

        if let Some(selected) = &selection.selected_community {
            if data.community(selected).is_none() {
                info!("Selected community {} is gone; deselecting", selected);
                map_events.send(MapEvent::background_click());
            }
        }

        if load.hints.center.is_some() || load.hints.zoom.is_some() {
            let center = load.hints.center.unwrap_or(view.center);
            let zoom = load.hints.zoom.unwrap_or(view.zoom);
            controller.jump_to(&mut view, center, zoom, &config);
        }

        match &load.selected_community {
            Some(id) if selection.selected_community.as_ref() != Some(id) => {
                map_events.send(MapEvent::select_community(id.clone()));
            }
            Some(_) => {}
            None if load.hints.fit_to_data => {
                controller.fit_to_communities(&view, &data.communities, &config);
            }
            None => {}
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle_reset(
    mut resets: EventReader<ResetMap>,
    config: Res<MapConfig>,
    mut selection: ResMut<SelectionState>,
    mut view: ResMut<ViewportState>,
    mut controller: ResMut<ViewportController>,
    mut listing_set: ResMut<ListingSet>,
    mut in_flight: ResMut<InFlightFetches>,
    mut notifications: EventWriter<MapNotification>,
) {
    if resets.is_empty() {
        return;
    }
    resets.clear();

    if let Some(id) = selection.selected_community.take() {
        notifications.send(MapNotification::CommunityDeselected(id));
    }
    *selection = SelectionState::default();
    listing_set.clear();
    in_flight.clear();
    controller.clear();
    controller.jump_to(&mut view, config.default_center, config.default_zoom, &config);
    info!("Map reset to defaults");
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct MapEnginePlugin;

impl Plugin for MapEnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MapConfig>()
            .init_resource::<MapData>()
            .init_resource::<SelectionState>()
            .init_resource::<ViewportState>()
            .init_resource::<ViewportController>()
            .init_resource::<ListingSet>()
            .init_resource::<InFlightFetches>()
            .init_resource::<RenderState>()
            .add_event::<LoadMapData>()
            .add_event::<ResetMap>()
            .add_event::<MapEvent>()
            .add_event::<MapNotification>()
            .add_event::<spatial_query::ListingFetchRequest>()
            .add_event::<spatial_query::ListingFetchCompleted>();

        app.configure_sets(
            Update,
            (
                MapEngineSet::Ingest,
                MapEngineSet::Interaction,
                MapEngineSet::Fetch,
                MapEngineSet::Viewport,
                MapEngineSet::Render,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (handle_reset, ingest_map_data)
                .chain()
                .in_set(MapEngineSet::Ingest),
        )
        .add_systems(
            Update,
            selection::handle_map_events.in_set(MapEngineSet::Interaction),
        )
        .add_systems(
            Update,
            (
                spatial_query::dispatch_listing_fetches,
                spatial_query::collect_listing_fetches,
                spatial_query::commit_listing_results,
            )
                .chain()
                .in_set(MapEngineSet::Fetch),
        )
        .add_systems(
            Update,
            (viewport::animate_viewport, viewport::emit_viewport_bounds)
                .chain()
                .in_set(MapEngineSet::Viewport),
        )
        .add_systems(
            Update,
            (
                render_state::sync_polygons,
                render_state::sync_labels,
                render_state::sync_markers,
            )
                .chain()
                .in_set(MapEngineSet::Render),
        );
    }
}
