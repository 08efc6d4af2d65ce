//! Light egui theme for the panels around the map.

use bevy_egui::{egui, EguiContexts};

const PANEL: egui::Color32 = egui::Color32::from_rgb(248, 247, 244);
const INACTIVE: egui::Color32 = egui::Color32::from_rgb(232, 230, 224);
const HOVER: egui::Color32 = egui::Color32::from_rgb(214, 226, 240);
/// Pressed widgets, links and the selection outline.
const ACCENT: egui::Color32 = egui::Color32::from_rgb(31, 78, 140);
const WIDGET_RADIUS: egui::CornerRadius = egui::CornerRadius::same(6);

pub fn apply_map_theme(mut contexts: EguiContexts) {
    let ctx = contexts.ctx_mut();
    let mut style = (*ctx.style()).clone();
    style.visuals = map_visuals();
    // Tighter rows so long listing lists fit the side panel
    style.spacing.item_spacing = egui::vec2(6.0, 3.0);
    style.spacing.button_padding = egui::vec2(6.0, 2.0);
    ctx.set_style(style);
}

/// `Visuals::light()` with warm panels and a blue accent.
pub fn map_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::light();

    for (widget, fill) in [
        (&mut visuals.widgets.inactive, INACTIVE),
        (&mut visuals.widgets.hovered, HOVER),
        (&mut visuals.widgets.active, ACCENT),
    ] {
        widget.bg_fill = fill;
        widget.weak_bg_fill = fill;
        widget.corner_radius = WIDGET_RADIUS;
    }
    visuals.widgets.noninteractive.bg_fill = PANEL;
    visuals.widgets.noninteractive.corner_radius = WIDGET_RADIUS;
    // Dark text disappears on the accent fill
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.5, egui::Color32::WHITE);

    visuals.panel_fill = PANEL;
    visuals.window_fill = PANEL;
    visuals.window_corner_radius = egui::CornerRadius::same(8);
    // Text edits and scroll tracks: off-white rather than pure white
    visuals.extreme_bg_color = egui::Color32::from_rgb(253, 252, 250);
    visuals.faint_bg_color = egui::Color32::from_rgb(240, 238, 233);
    visuals.hyperlink_color = ACCENT;

    visuals.selection.bg_fill = HOVER;
    visuals.selection.stroke = egui::Stroke::new(1.0, ACCENT);
    visuals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_visuals_stay_light() {
        let visuals = map_visuals();
        assert!(!visuals.dark_mode);
        assert_eq!(visuals.panel_fill, PANEL);
        assert_ne!(visuals.extreme_bg_color, egui::Color32::WHITE);
    }

    #[test]
    fn test_pressed_widgets_use_light_text_on_accent() {
        let active = map_visuals().widgets.active;
        assert_eq!(active.bg_fill, ACCENT);
        assert_eq!(active.fg_stroke.color, egui::Color32::WHITE);
    }
}
