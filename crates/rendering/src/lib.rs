use bevy::prelude::*;

use map_engine::MapEngineSet;

pub mod colors;
pub mod map_surface;
pub mod tiles;

use map_surface::SurfaceHover;

/// Systems that paint the map surface and read its input. Runs after the
/// engine has synced `RenderState` for the frame; side panels must run
/// before it so egui lays them out ahead of the central panel.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapSurfaceSet;

pub struct RenderingPlugin;

impl Plugin for RenderingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SurfaceHover>()
            .insert_resource(ClearColor(Color::srgb_u8(236, 233, 226)))
            .configure_sets(Update, MapSurfaceSet.after(MapEngineSet::Render))
            .add_systems(Startup, map_surface::setup_camera)
            .add_systems(
                Update,
                (
                    map_surface::keyboard_navigation,
                    map_surface::map_surface_ui,
                )
                    .chain()
                    .in_set(MapSurfaceSet),
            );
    }
}
