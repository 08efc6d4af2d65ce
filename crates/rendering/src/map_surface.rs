//! The map drawing surface.
//!
//! A full-window egui painter behind the side panels. Each frame it tracks the
//! surface size, turns pointer and keyboard input into viewport moves and
//! `MapEvent`s, then paints the tile backdrop, polygons, labels, badges,
//! markers and the listing popup from `RenderState`.

use bevy::math::DVec2;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use map_engine::markers::PopupRender;
use map_engine::{
    LatLng, MapConfig, MapEvent, MapTarget, RenderState, ResetMap, SelectionState,
    ViewportController, ViewportState,
};

use crate::colors;
use crate::hit_test::{click_event, hit_test, hover_transition, marker_half_extent};
use crate::tiles::visible_tiles;

/// Zoom levels per point of scroll.
const ZOOM_PER_SCROLL: f64 = 1.0 / 120.0;
/// Keyboard pan speed in pixels per second.
const KEY_PAN_SPEED: f64 = 600.0;
const BADGE_OFFSET_Y: f32 = 22.0;
const MARKER_FONT: f32 = 12.0;
const POPUP_WIDTH: f32 = 240.0;
/// Extra margin so shapes straddling the edge are still drawn.
const CULL_MARGIN: f32 = 48.0;

// =============================================================================
// Resources
// =============================================================================

/// What the pointer was over last frame, for hover enter/leave events.
#[derive(Resource, Default, Debug)]
pub struct SurfaceHover {
    pub current: Option<MapTarget>,
}

// =============================================================================
// Systems
// =============================================================================

pub fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Arrow keys pan, +/- zoom about the center, Escape closes the popup or
/// clears the selection, Home resets the map.
#[allow(clippy::too_many_arguments)]
pub fn keyboard_navigation(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut contexts: EguiContexts,
    selection: Res<SelectionState>,
    config: Res<MapConfig>,
    mut view: ResMut<ViewportState>,
    mut controller: ResMut<ViewportController>,
    mut map_events: EventWriter<MapEvent>,
    mut reset: EventWriter<ResetMap>,
) {
    if contexts.ctx_mut().wants_keyboard_input() {
        return;
    }

    let mut pan = DVec2::ZERO;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        pan.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        pan.x += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        pan.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        pan.y += 1.0;
    }
    if pan != DVec2::ZERO {
        let step = pan.normalize() * KEY_PAN_SPEED * time.delta_secs() as f64;
        controller.pan_by(&mut view, step);
    }

    let center = view.size * 0.5;
    if keyboard.any_just_pressed([KeyCode::Equal, KeyCode::NumpadAdd]) {
        controller.zoom_at(&mut view, 1.0, center, &config);
    }
    if keyboard.any_just_pressed([KeyCode::Minus, KeyCode::NumpadSubtract]) {
        controller.zoom_at(&mut view, -1.0, center, &config);
    }

    if keyboard.just_pressed(KeyCode::Escape) {
        if let Some(listing) = selection.selected_listing.clone() {
            map_events.send(MapEvent::close_popup(listing));
        } else if selection.selected_community.is_some() {
            map_events.send(MapEvent::background_click());
        }
    }
    if keyboard.just_pressed(KeyCode::Home) {
        reset.send(ResetMap);
    }
}

/// Central panel: input handling followed by painting.
#[allow(clippy::too_many_arguments)]
pub fn map_surface_ui(
    mut contexts: EguiContexts,
    render: Res<RenderState>,
    config: Res<MapConfig>,
    mut view: ResMut<ViewportState>,
    mut controller: ResMut<ViewportController>,
    mut hover: ResMut<SurfaceHover>,
    mut map_events: EventWriter<MapEvent>,
) {
    let ctx = contexts.ctx_mut();
    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(colors::SURFACE_BACKGROUND))
        .show(ctx, |ui| {
            let size = ui.available_size();
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
            let rect = response.rect;
            controller.resize(&mut view, DVec2::new(rect.width() as f64, rect.height() as f64));

            // --- Pointer input ---
            if response.dragged() {
                let delta = response.drag_delta();
                controller.pan_by(&mut view, DVec2::new(-delta.x as f64, -delta.y as f64));
            }
            if let Some(pos) = response.hover_pos() {
                let (scroll, pinch) = ui.input(|i| (i.smooth_scroll_delta.y, i.zoom_delta()));
                let zoom_delta = scroll as f64 * ZOOM_PER_SCROLL + (pinch as f64).log2();
                if zoom_delta != 0.0 {
                    controller.zoom_at(&mut view, zoom_delta, local(rect, pos), &config);
                }
            }

            let target = response
                .hover_pos()
                .filter(|_| !response.dragged())
                .map(|pos| hit_test(&render, &view, local(rect, pos)));
            for event in hover_transition(hover.current.as_ref(), target.as_ref()) {
                map_events.send(event);
            }
            hover.current = target;

            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    map_events.send(click_event(&hit_test(&render, &view, local(rect, pos))));
                }
            }

            // --- Painting ---
            let painter = painter.with_clip_rect(rect);
            draw_tiles(&painter, rect, &view);
            draw_polygons(&painter, rect, &view, &render);
            draw_labels(&painter, rect, &view, &render);
            draw_markers(&painter, rect, &view, &render);

            if let Some(popup) = render.markers.popup.as_ref() {
                let anchor = screen_pos(rect, &view, popup.position);
                if rect.contains(anchor) {
                    listing_popup(ui.ctx(), anchor, popup, &mut map_events);
                }
            }
        });
}

// =============================================================================
// Painting
// =============================================================================

fn screen_pos(rect: egui::Rect, view: &ViewportState, p: LatLng) -> egui::Pos2 {
    let s = view.to_screen(p);
    rect.min + egui::vec2(s.x as f32, s.y as f32)
}

fn local(rect: egui::Rect, pos: egui::Pos2) -> DVec2 {
    let offset = pos - rect.min;
    DVec2::new(offset.x as f64, offset.y as f64)
}

fn draw_tiles(painter: &egui::Painter, rect: egui::Rect, view: &ViewportState) {
    let stroke = egui::Stroke::new(1.0, colors::TILE_LINE);
    for tile in visible_tiles(view) {
        let tile_rect = egui::Rect::from_min_max(
            rect.min + egui::vec2(tile.min.x as f32, tile.min.y as f32),
            rect.min + egui::vec2(tile.max.x as f32, tile.max.y as f32),
        );
        if tile.is_odd() {
            painter.rect_filled(tile_rect, 0.0, colors::TILE_SHADE);
        }
        painter.rect_stroke(tile_rect, 0.0, stroke, egui::StrokeKind::Inside);
    }
}

/// egui tessellates filled paths as convex fans, so a concave ring's fill is
/// approximate; its border is exact.
fn draw_polygons(
    painter: &egui::Painter,
    rect: egui::Rect,
    view: &ViewportState,
    render: &RenderState,
) {
    let visible = rect.expand(CULL_MARGIN);
    for polygon in &render.polygons.polygons {
        let open = &polygon.ring[..polygon.ring.len().saturating_sub(1)];
        let points: Vec<egui::Pos2> = open.iter().map(|p| screen_pos(rect, view, *p)).collect();
        if points.len() < 3 || !egui::Rect::from_points(&points).intersects(visible) {
            continue;
        }
        let style = &polygon.style;
        painter.add(egui::Shape::convex_polygon(
            points,
            colors::with_opacity(style.fill, style.fill_opacity),
            egui::Stroke::new(style.weight, colors::to_color32(style.border)),
        ));
    }
}

fn draw_labels(painter: &egui::Painter, rect: egui::Rect, view: &ViewportState, render: &RenderState) {
    for label in &render.labels.labels {
        let galley = painter.layout_no_wrap(
            label.text.clone(),
            egui::FontId::proportional(label.font_size),
            colors::LABEL_TEXT,
        );
        let text_rect =
            egui::Rect::from_center_size(screen_pos(rect, view, label.position), galley.size());
        painter.rect_filled(text_rect.expand(2.0), 3.0, colors::LABEL_HALO);
        painter.galley(text_rect.min, galley, colors::LABEL_TEXT);
    }

    for badge in &render.labels.badges {
        let center = screen_pos(rect, view, badge.position) + egui::vec2(0.0, BADGE_OFFSET_Y);
        painter.circle(
            center,
            badge.diameter * 0.5,
            colors::BADGE_FILL,
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        );
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            badge.count,
            egui::FontId::proportional(badge.diameter * 0.45),
            egui::Color32::WHITE,
        );
    }
}

/// Markers arrive sorted by z, so painting in order stacks highlighted ones on top.
fn draw_markers(painter: &egui::Painter, rect: egui::Rect, view: &ViewportState, render: &RenderState) {
    let visible = rect.expand(CULL_MARGIN);
    for marker in &render.markers.markers {
        let center = screen_pos(rect, view, marker.position);
        if !visible.contains(center) {
            continue;
        }
        let half = marker_half_extent(marker);
        let pill = egui::Rect::from_center_size(
            center,
            egui::vec2(half.x as f32 * 2.0, half.y as f32 * 2.0),
        );
        painter.rect(
            pill,
            egui::CornerRadius::same(10),
            colors::to_color32(marker.tier.color()),
            egui::Stroke::new(1.5, colors::MARKER_OUTLINE),
            egui::StrokeKind::Outside,
        );
        painter.text(
            center,
            egui::Align2::CENTER_CENTER,
            &marker.label,
            egui::FontId::proportional(MARKER_FONT * marker.tier.scale()),
            egui::Color32::WHITE,
        );
    }
}

fn listing_popup(
    ctx: &egui::Context,
    anchor: egui::Pos2,
    popup: &PopupRender,
    map_events: &mut EventWriter<MapEvent>,
) {
    egui::Area::new(egui::Id::new("listing_popup"))
        .fixed_pos(anchor + egui::vec2(14.0, -14.0))
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_width(POPUP_WIDTH);
                ui.horizontal(|ui| {
                    ui.heading(popup.price.as_str());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("x").clicked() {
                            map_events.send(MapEvent::close_popup(popup.listing.clone()));
                        }
                    });
                });
                ui.label(popup.address.as_str());
                ui.label(format!("{} | {} photos", popup.status, popup.photo_count));
                if let Some(photo) = popup.first_photo.as_deref() {
                    ui.small(photo);
                }
                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    if ui.button("View details").clicked() {
                        map_events.send(MapEvent::select_listing(popup.listing.clone()));
                    }
                    ui.weak(popup.url.as_str());
                });
            });
        });
}
