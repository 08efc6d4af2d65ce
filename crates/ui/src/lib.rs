use bevy::prelude::*;
use bevy_egui::EguiPlugin;

use rendering::MapSurfaceSet;

pub mod listings_panel;
pub mod navigation;
pub mod theme;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin)
            .init_resource::<navigation::NavigationLog>()
            .init_resource::<listings_panel::PanelHover>()
            .add_systems(Startup, theme::apply_map_theme)
            .add_systems(
                Update,
                (
                    navigation::record_notifications,
                    navigation::status_bar_ui,
                    listings_panel::listings_panel_ui,
                )
                    .chain()
                    .before(MapSurfaceSet),
            );
    }
}
