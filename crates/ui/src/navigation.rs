//! Navigation intents and the bottom status bar.
//!
//! The map never routes by itself: selecting a community or opening a
//! listing's details emits a notification carrying the target path. This
//! module records those paths, hands them to the host (the location hash on
//! the web, a log line on desktop) and shows the latest one with the current
//! view in a status bar.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use map_engine::spatial_query::{FetchStatus, ListingSet};
use map_engine::{MapNotification, ResetMap, ViewportState};

/// Number of paths kept for the status bar history popup.
const HISTORY_LEN: usize = 20;

// =============================================================================
// Resources
// =============================================================================

/// Recent navigation targets, newest last.
#[derive(Resource, Default, Debug)]
pub struct NavigationLog {
    pub history: Vec<String>,
    /// Last fetch failure, cleared on the next successful selection.
    pub last_error: Option<String>,
}

impl NavigationLog {
    pub fn latest(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    fn push(&mut self, url: String) {
        if self.history.len() == HISTORY_LEN {
            self.history.remove(0);
        }
        self.history.push(url);
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Record navigation intents and fetch failures from the engine.
pub fn record_notifications(
    mut notifications: EventReader<MapNotification>,
    mut log: ResMut<NavigationLog>,
) {
    for notification in notifications.read() {
        match notification {
            MapNotification::CommunitySelected { url, .. } => {
                log.last_error = None;
                navigate(url);
                log.push(url.clone());
            }
            MapNotification::ListingSelected { url, .. } => {
                navigate(url);
                log.push(url.clone());
            }
            MapNotification::ListingFetchFailed { community, message } => {
                log.last_error = Some(format!("{community}: {message}"));
            }
            _ => {}
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn navigate(url: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash(url);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn navigate(url: &str) {
    info!("navigate to {}", url);
}

/// Bottom bar: latest navigation, fetch state, view position and a reset button.
pub fn status_bar_ui(
    mut contexts: EguiContexts,
    log: Res<NavigationLog>,
    view: Res<ViewportState>,
    listing_set: Res<ListingSet>,
    mut reset: EventWriter<ResetMap>,
) {
    egui::TopBottomPanel::bottom("status_bar").show(contexts.ctx_mut(), |ui| {
        ui.horizontal(|ui| {
            if ui.button("Reset map").clicked() {
                reset.send(ResetMap);
            }
            ui.separator();
            let latest = log.latest().unwrap_or("-");
            ui.label(format!("Route: {latest}")).on_hover_ui(|ui| {
                for url in log.history.iter().rev() {
                    ui.label(url.as_str());
                }
            });
            ui.separator();
            ui.label(fetch_summary(&listing_set.status));
            if let Some(error) = log.last_error.as_deref() {
                ui.colored_label(egui::Color32::from_rgb(190, 40, 40), error);
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!(
                    "{:.4}, {:.4}  z{:.1}",
                    view.center.lat, view.center.lng, view.zoom
                ));
            });
        });
    });
}

fn fetch_summary(status: &FetchStatus) -> &'static str {
    match status {
        FetchStatus::Idle => "Listings: all",
        FetchStatus::Pending => "Listings: loading",
        FetchStatus::Loaded => "Listings: loaded",
        FetchStatus::Failed(_) => "Listings: unavailable",
    }
}
