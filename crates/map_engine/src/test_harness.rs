//! # TestMap: headless integration test harness for the map engine
//!
//! Wraps `bevy::app::App` + `MinimalPlugins` + `MapEnginePlugin` so tests can
//! load data, send interaction events and assert on engine resources without
//! a window or renderer.

use std::time::Duration;

use bevy::math::DVec2;
use bevy::prelude::*;

use crate::config::MapConfig;
use crate::geo::{LatLng, RawPoint};
use crate::model::{CommunityRecord, ListingRecord, RawId, RawListingCoordinates};
use crate::render_state::RenderState;
use crate::selection::{MapEvent, MapNotification, SelectionState};
use crate::spatial_query::{InFlightFetches, ListingProvider, ListingSet, ListingSource};
use crate::viewport::{ViewportController, ViewportState};
use crate::{LoadMapData, MapData, MapEnginePlugin, ResetMap};

/// Frames `wait_for_fetch` will run before giving up.
const FETCH_WAIT_FRAMES: u32 = 2_000;

/// A headless Bevy App wrapping `MapEnginePlugin` for integration testing.
pub struct TestMap {
    app: App,
}

impl Default for TestMap {
    fn default() -> Self {
        Self::new()
    }
}

impl TestMap {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An empty map with built-in config (environment overrides ignored).
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        // Insert config BEFORE the plugin so init_resource keeps it.
        app.insert_resource(MapConfig::builtin());
        app.add_plugins(MapEnginePlugin);
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Setup (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    pub fn with_provider(mut self, source: impl ListingSource) -> Self {
        self.app.insert_resource(ListingProvider::new(source));
        self
    }

    pub fn with_view_size(mut self, width: f64, height: f64) -> Self {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut controller: Mut<ViewportController>| {
            let mut view = world.resource_mut::<ViewportState>();
            controller.resize(&mut view, DVec2::new(width, height));
        });
        self
    }

    /// Load communities (and fit to them), then settle the view.
    pub fn with_communities(mut self, communities: Vec<CommunityRecord>) -> Self {
        self.load(LoadMapData {
            communities,
            ..Default::default()
        });
        self.settle_viewport();
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    pub fn load(&mut self, load: LoadMapData) {
        self.app.world_mut().send_event(load);
        self.app.update();
    }

    pub fn send(&mut self, event: MapEvent) {
        self.app.world_mut().send_event(event);
        self.app.update();
    }

    pub fn reset(&mut self) {
        self.app.world_mut().send_event(ResetMap);
        self.app.update();
    }

    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Jump the view (cancels any animation) and run one frame.
    pub fn jump_to(&mut self, center: LatLng, zoom: f64) {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut controller: Mut<ViewportController>| {
            let config = world.resource::<MapConfig>().clone();
            let mut view = world.resource_mut::<ViewportState>();
            controller.jump_to(&mut view, center, zoom, &config);
        });
        self.app.update();
    }

    /// Snap any running fit animation to its target and run one frame.
    pub fn settle_viewport(&mut self) {
        let world = self.app.world_mut();
        world.resource_scope(|world, mut controller: Mut<ViewportController>| {
            let mut view = world.resource_mut::<ViewportState>();
            controller.finish(&mut view);
        });
        self.app.update();
    }

    /// Run frames until no listing fetch is pending. Returns `false` if the
    /// fetch did not resolve in time.
    pub fn wait_for_fetch(&mut self) -> bool {
        for _ in 0..FETCH_WAIT_FRAMES {
            let idle = self.listing_set().pending.is_none()
                && self.resource::<InFlightFetches>().is_empty();
            if idle {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
            self.app.update();
        }
        false
    }

    /// Take every notification emitted so far.
    pub fn drain_notifications(&mut self) -> Vec<MapNotification> {
        self.app
            .world_mut()
            .resource_mut::<Events<MapNotification>>()
            .drain()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn selection(&self) -> &SelectionState {
        self.resource::<SelectionState>()
    }

    pub fn viewport(&self) -> &ViewportState {
        self.resource::<ViewportState>()
    }

    pub fn render(&self) -> &RenderState {
        self.resource::<RenderState>()
    }

    pub fn listing_set(&self) -> &ListingSet {
        self.resource::<ListingSet>()
    }

    pub fn data(&self) -> &MapData {
        self.resource::<MapData>()
    }

    pub fn config(&self) -> &MapConfig {
        self.resource::<MapConfig>()
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    pub fn assert_selected(&self, expected: Option<&str>) {
        let actual = self
            .selection()
            .selected_community
            .as_ref()
            .map(|id| id.0.as_str());
        assert_eq!(actual, expected, "unexpected selected community");
    }

    pub fn assert_viewport_at_default(&self) {
        let view = self.viewport();
        let config = self.config();
        assert!(
            (view.center.lat - config.default_center.lat).abs() < 1e-9
                && (view.center.lng - config.default_center.lng).abs() < 1e-9,
            "Expected default center {:?}, got {:?}",
            config.default_center,
            view.center
        );
        assert!(
            (view.zoom - config.default_zoom).abs() < 1e-9,
            "Expected default zoom {}, got {}",
            config.default_zoom,
            view.zoom
        );
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

/// Square community record with its south-west corner at (`lat`, `lng`).
pub fn square_community(
    id: &str,
    name: &str,
    lat: f64,
    lng: f64,
    size: f64,
    listings_count: i64,
) -> CommunityRecord {
    CommunityRecord {
        id: RawId::Text(id.to_string()),
        name: name.to_string(),
        slug: None,
        coordinates: vec![
            RawPoint::Pair([lat, lng]),
            RawPoint::Pair([lat, lng + size]),
            RawPoint::Pair([lat + size, lng + size]),
            RawPoint::Pair([lat + size, lng]),
        ],
        bounds: None,
        listings_count: Some(listings_count),
    }
}

pub fn listing_record(id: &str, lat: f64, lng: f64, price: f64) -> ListingRecord {
    ListingRecord {
        id: RawId::Text(id.to_string()),
        mls_number: Some(format!("MLS-{id}")),
        price: Some(price),
        coordinates: Some(RawListingCoordinates {
            lat: Some(lat),
            lng: Some(lng),
        }),
        status: Some("Active".to_string()),
        address: Some(format!("{id} Desert View Dr")),
        photos: Vec::new(),
    }
}
