//! Side panel listing communities, or the selected community's listings.
//!
//! Rows and map shapes share one `SelectionState`: hovering a row highlights
//! the polygon or marker, and a hover that starts on the map scrolls the
//! matching row into view.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use map_engine::markers::price_label;
use map_engine::spatial_query::{FetchStatus, ListingSet};
use map_engine::{
    Community, CommunityId, Listing, ListingId, MapData, MapEvent, MapTarget, SelectionState,
};
use rendering::hit_test::hover_transition;

const PANEL_WIDTH: f32 = 300.0;

// =============================================================================
// Resources
// =============================================================================

#[derive(Resource, Default, Debug)]
pub struct PanelHover {
    /// Row under the pointer last frame.
    pub current: Option<MapTarget>,
    /// Map hover already scrolled into view.
    scrolled_to: Option<MapTarget>,
}

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CommunityRow {
    pub id: CommunityId,
    pub name: String,
    pub listings_count: u32,
}

/// Communities by name, case-insensitive.
pub fn community_rows(communities: &[Community]) -> Vec<CommunityRow> {
    let mut rows: Vec<CommunityRow> = communities
        .iter()
        .map(|c| CommunityRow {
            id: c.id.clone(),
            name: c.name.clone(),
            listings_count: c.listings_count,
        })
        .collect();
    rows.sort_by_cached_key(|r| r.name.to_lowercase());
    rows
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub id: ListingId,
    pub price: String,
    pub address: String,
    pub status: String,
}

/// Listings priced high to low; unpriced ones last.
pub fn listing_rows(listings: &[Listing]) -> Vec<ListingRow> {
    let mut sorted: Vec<&Listing> = listings.iter().collect();
    sorted.sort_by(|a, b| b.price.unwrap_or(0.0).total_cmp(&a.price.unwrap_or(0.0)));
    sorted
        .into_iter()
        .map(|l| ListingRow {
            id: l.id.clone(),
            price: price_label(l.price).unwrap_or_else(|| "N/A".to_string()),
            address: if l.address.is_empty() {
                format!("MLS {}", l.mls_number)
            } else {
                l.address.clone()
            },
            status: l.status.to_string(),
        })
        .collect()
}

/// Map-side hover worth scrolling to: a hover the panel did not cause.
fn external_hover(selection: &SelectionState, panel: &PanelHover) -> Option<MapTarget> {
    let hovered = if selection.selected_community.is_some() {
        selection.hovered_listing.clone().map(MapTarget::Listing)
    } else {
        selection.hovered_community.clone().map(MapTarget::Community)
    };
    hovered.filter(|t| panel.current.as_ref() != Some(t))
}

// =============================================================================
// System
// =============================================================================

pub fn listings_panel_ui(
    mut contexts: EguiContexts,
    data: Res<MapData>,
    selection: Res<SelectionState>,
    listing_set: Res<ListingSet>,
    mut panel: ResMut<PanelHover>,
    mut map_events: EventWriter<MapEvent>,
) {
    let scroll_target = external_hover(&selection, &panel).filter(|t| panel.scrolled_to.as_ref() != Some(t));
    let mut hovered_row: Option<MapTarget> = None;

    egui::SidePanel::left("listings_panel")
        .resizable(true)
        .default_width(PANEL_WIDTH)
        .show(contexts.ctx_mut(), |ui| {
            match selection.selected_community.as_ref().and_then(|id| data.community(id)) {
                Some(community) => {
                    ui.horizontal(|ui| {
                        if ui.small_button("< All").clicked() {
                            map_events.send(MapEvent::background_click());
                        }
                        ui.heading(community.name.as_str());
                    });
                    match &listing_set.status {
                        FetchStatus::Pending => {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label("Loading listings");
                            });
                        }
                        FetchStatus::Failed(message) => {
                            ui.colored_label(
                                egui::Color32::from_rgb(190, 40, 40),
                                format!("Listings unavailable: {message}"),
                            );
                        }
                        _ => {
                            ui.label(format!("{} listings", listing_set.listings.len()));
                        }
                    }
                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for row in listing_rows(&listing_set.listings) {
                            let target = MapTarget::Listing(row.id.clone());
                            let highlighted = selection.hovered_listing.as_ref() == Some(&row.id)
                                || selection.selected_listing.as_ref() == Some(&row.id);
                            let text = format!("{}  {}  ({})", row.price, row.address, row.status);
                            let response = ui.selectable_label(highlighted, text);
                            if response.hovered() {
                                hovered_row = Some(target.clone());
                            }
                            if scroll_target.as_ref() == Some(&target) {
                                response.scroll_to_me(Some(egui::Align::Center));
                            }
                            if response.double_clicked() {
                                map_events.send(MapEvent::select_listing(row.id));
                            } else if response.clicked() {
                                map_events.send(MapEvent::preview_listing(row.id));
                            }
                        }
                    });
                }
                None => {
                    ui.heading("Communities");
                    ui.label(format!("{} on the map", data.communities.len()));
                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        for row in community_rows(&data.communities) {
                            let target = MapTarget::Community(row.id.clone());
                            let highlighted = selection.hovered_community.as_ref() == Some(&row.id);
                            let text = if row.listings_count > 0 {
                                format!("{}  ({})", row.name, row.listings_count)
                            } else {
                                row.name.clone()
                            };
                            let response = ui.selectable_label(highlighted, text);
                            if response.hovered() {
                                hovered_row = Some(target.clone());
                            }
                            if scroll_target.as_ref() == Some(&target) {
                                response.scroll_to_me(Some(egui::Align::Center));
                            }
                            if response.clicked() {
                                map_events.send(MapEvent::select_community(row.id));
                            }
                        }
                    });
                }
            }
        });

    for event in hover_transition(panel.current.as_ref(), hovered_row.as_ref()) {
        map_events.send(event);
    }
    panel.current = hovered_row;
    if scroll_target.is_some() {
        panel.scrolled_to = scroll_target;
    }
}
