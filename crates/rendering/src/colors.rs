//! Engine colors to egui colors, plus the fixed surface palette.

use bevy_egui::egui::Color32;
use map_engine::palette::Rgb;

pub const SURFACE_BACKGROUND: Color32 = Color32::from_rgb(236, 233, 226);
pub const TILE_LINE: Color32 = Color32::from_rgba_premultiplied(24, 24, 24, 40);
pub const TILE_SHADE: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 6);
pub const LABEL_TEXT: Color32 = Color32::from_rgb(30, 32, 40);
pub const LABEL_HALO: Color32 = Color32::from_rgba_premultiplied(192, 192, 192, 200);
pub const BADGE_FILL: Color32 = Color32::from_rgb(31, 78, 140);
pub const MARKER_OUTLINE: Color32 = Color32::WHITE;

/// Opaque egui color.
pub fn to_color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

/// egui color with `opacity` in `[0, 1]` applied.
pub fn with_opacity(rgb: Rgb, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}
