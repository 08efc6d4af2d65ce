use std::path::PathBuf;
use std::time::Duration;

use bevy::prelude::*;
use bevy::window::PresentMode;
use bevy::winit::{UpdateMode, WinitSettings};

use map_engine::{
    InMemoryListingSource, ListingProvider, ListingRecord, LoadMapData, MapEngineSet, MapError,
    RenderState,
};

mod demo_data;

/// Simulated listing service latency when none is configured.
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_LATENCY_MS: u64 = 250;

fn main() -> Result<(), MapError> {
    let (load, listing_pool) = initial_data()?;
    let source = InMemoryListingSource::new(listing_pool).with_latency(listing_latency());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Community Map".to_string(),
            resolution: (1280.0, 720.0).into(),
            present_mode: PresentMode::AutoVsync,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(WinitSettings {
        focused_mode: UpdateMode::reactive_low_power(Duration::from_millis(16)),
        unfocused_mode: UpdateMode::reactive_low_power(Duration::from_millis(100)),
    })
    .insert_resource(ListingProvider::new(source))
    .add_plugins((
        map_engine::MapEnginePlugin,
        rendering::RenderingPlugin,
        ui::UiPlugin,
    ));

    app.world_mut().send_event(load);

    // GeoJSON export: writes the drawn polygons once after the first load
    if let Ok(path) = std::env::var("COMMUNITY_MAP_EXPORT_GEOJSON") {
        app.insert_resource(GeoJsonExport(PathBuf::from(path)))
            .add_systems(
                Update,
                export_geojson
                    .after(MapEngineSet::Render)
                    .run_if(resource_exists::<GeoJsonExport>),
            );
    }

    app.run();
    Ok(())
}

/// Map data from `COMMUNITY_MAP_DATA` when set, otherwise the seeded demo.
/// Returns the initial load and the listing pool spatial queries answer from.
fn initial_data() -> Result<(LoadMapData, Vec<ListingRecord>), MapError> {
    match std::env::var("COMMUNITY_MAP_DATA") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)?;
            let load = LoadMapData::from_json(&json)?;
            let pool = load.listings.clone();
            Ok((load, pool))
        }
        Err(_) => {
            let demo = demo_data::demo_map(demo_data::DEMO_SEED);
            Ok((demo.load, demo.listings))
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn listing_latency() -> Duration {
    let ms = std::env::var("COMMUNITY_MAP_LATENCY_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_LATENCY_MS);
    Duration::from_millis(ms)
}

/// The browser main thread cannot block.
#[cfg(target_arch = "wasm32")]
fn listing_latency() -> Duration {
    Duration::ZERO
}

// ---------------------------------------------------------------------------
// GeoJSON export
// ---------------------------------------------------------------------------

#[derive(Resource)]
struct GeoJsonExport(PathBuf);

fn export_geojson(mut commands: Commands, export: Res<GeoJsonExport>, render: Res<RenderState>) {
    if render.polygons.geometry_generation == 0 {
        return;
    }
    let collection = render.polygons.feature_collection();
    let written = serde_json::to_string_pretty(&collection)
        .map_err(MapError::from)
        .and_then(|json| std::fs::write(&export.0, json).map_err(MapError::from));
    match written {
        Ok(()) => info!(
            "Exported {} community polygons to {}",
            render.polygons.len(),
            export.0.display()
        ),
        Err(e) => warn!("GeoJSON export to {} failed: {}", export.0.display(), e),
    }
    commands.remove_resource::<GeoJsonExport>();
}
