//! Hover / selection state machine.
//!
//! Layers never mutate selection themselves; they emit [`MapEvent`]s tagged
//! by action and target kind. [`handle_map_events`] consumes the channel
//! once per frame, runs each event through [`SelectionState::apply`], and
//! turns the resulting [`SelectionEffect`]s into viewport moves, listing
//! fetches and outgoing [`MapNotification`]s.
//!
//! Top-level states are `Idle` and `CommunitySelected(id)`. Hover is an
//! overlay on either state and never changes it.

use bevy::prelude::*;

use crate::config::MapConfig;
use crate::geo::Bounds;
use crate::model::{CommunityId, ListingId};
use crate::spatial_query::{ListingFetchRequest, ListingSet, SpatialArea};
use crate::viewport::{ViewportController, ViewportState};
use crate::MapData;

// =============================================================================
// State
// =============================================================================

#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub hovered_community: Option<CommunityId>,
    pub selected_community: Option<CommunityId>,
    pub hovered_listing: Option<ListingId>,
    /// Listing whose detail popup is open.
    pub selected_listing: Option<ListingId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    CommunitySelected(CommunityId),
}

// =============================================================================
// Event channel
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapAction {
    Hover,
    HoverEnd,
    Select,
    Deselect,
    /// Lightweight listing preview (marker click opens the popup).
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapTarget {
    Community(CommunityId),
    Listing(ListingId),
    /// Empty map area.
    Background,
}

/// Interaction emitted by the drawing surface or surrounding UI.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct MapEvent {
    pub action: MapAction,
    pub target: MapTarget,
}

impl MapEvent {
    pub fn new(action: MapAction, target: MapTarget) -> Self {
        Self { action, target }
    }

    pub fn hover_community(id: CommunityId) -> Self {
        Self::new(MapAction::Hover, MapTarget::Community(id))
    }

    pub fn hover_end_community(id: CommunityId) -> Self {
        Self::new(MapAction::HoverEnd, MapTarget::Community(id))
    }

    pub fn select_community(id: CommunityId) -> Self {
        Self::new(MapAction::Select, MapTarget::Community(id))
    }

    pub fn hover_listing(id: ListingId) -> Self {
        Self::new(MapAction::Hover, MapTarget::Listing(id))
    }

    pub fn hover_end_listing(id: ListingId) -> Self {
        Self::new(MapAction::HoverEnd, MapTarget::Listing(id))
    }

    pub fn preview_listing(id: ListingId) -> Self {
        Self::new(MapAction::Preview, MapTarget::Listing(id))
    }

    pub fn select_listing(id: ListingId) -> Self {
        Self::new(MapAction::Select, MapTarget::Listing(id))
    }

    pub fn close_popup(id: ListingId) -> Self {
        Self::new(MapAction::Deselect, MapTarget::Listing(id))
    }

    pub fn background_click() -> Self {
        Self::new(MapAction::Deselect, MapTarget::Background)
    }
}

/// Outgoing notifications for page-level UI (the callback surface).
#[derive(Event, Debug, Clone, PartialEq)]
pub enum MapNotification {
    CommunityHovered(Option<CommunityId>),
    CommunitySelected { id: CommunityId, url: String },
    CommunityDeselected(CommunityId),
    ListingHovered(Option<ListingId>),
    ListingSelected { id: ListingId, url: String },
    ViewportBoundsChanged(Bounds),
    ListingFetchFailed { community: CommunityId, message: String },
}

/// What a single transition asks the rest of the engine to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEffect {
    CommunityHoverChanged(Option<CommunityId>),
    ListingHoverChanged(Option<ListingId>),
    /// Entered `CommunitySelected(id)`, either from `Idle` or by replacing
    /// another community directly.
    CommunitySelected(CommunityId),
    /// Returned to `Idle` from `CommunitySelected(id)`.
    CommunityDeselected(CommunityId),
    PopupOpened(ListingId),
    PopupClosed(ListingId),
    ListingChosen(ListingId),
}

impl SelectionState {
    pub fn phase(&self) -> SelectionPhase {
        match &self.selected_community {
            Some(id) => SelectionPhase::CommunitySelected(id.clone()),
            None => SelectionPhase::Idle,
        }
    }

    /// Run one event through the state machine.
    pub fn apply(&mut self, event: &MapEvent) -> Vec<SelectionEffect> {
        let mut effects = Vec::new();
        match (&event.action, &event.target) {
            (MapAction::Hover, MapTarget::Community(id)) => {
                if self.hovered_community.as_ref() != Some(id) {
                    self.hovered_community = Some(id.clone());
                    effects.push(SelectionEffect::CommunityHoverChanged(Some(id.clone())));
                }
            }
            (MapAction::HoverEnd, MapTarget::Community(id)) => {
                if self.hovered_community.as_ref() == Some(id) {
                    self.hovered_community = None;
                    effects.push(SelectionEffect::CommunityHoverChanged(None));
                }
            }
            (MapAction::Hover, MapTarget::Listing(id)) => {
                if self.hovered_listing.as_ref() != Some(id) {
                    self.hovered_listing = Some(id.clone());
                    effects.push(SelectionEffect::ListingHoverChanged(Some(id.clone())));
                }
            }
            (MapAction::HoverEnd, MapTarget::Listing(id)) => {
                if self.hovered_listing.as_ref() == Some(id) {
                    self.hovered_listing = None;
                    effects.push(SelectionEffect::ListingHoverChanged(None));
                }
            }
            (MapAction::Hover | MapAction::HoverEnd, MapTarget::Background) => {
                self.clear_hover(&mut effects);
            }

            (MapAction::Select, MapTarget::Community(id)) => {
                if self.selected_community.as_ref() == Some(id) {
                    self.deselect_community(&mut effects);
                } else {
                    self.close_popup(&mut effects);
                    self.hovered_listing = None;
                    self.selected_community = Some(id.clone());
                    effects.push(SelectionEffect::CommunitySelected(id.clone()));
                }
            }
            (MapAction::Deselect, MapTarget::Community(id)) => {
                if self.selected_community.as_ref() == Some(id) {
                    self.deselect_community(&mut effects);
                }
            }
            (MapAction::Deselect | MapAction::Select, MapTarget::Background) => {
                if self.selected_community.is_some() {
                    self.deselect_community(&mut effects);
                } else {
                    self.close_popup(&mut effects);
                }
            }
            (MapAction::Preview, MapTarget::Community(_) | MapTarget::Background) => {}

            (MapAction::Preview, MapTarget::Listing(id)) => {
                if self.selected_listing.as_ref() != Some(id) {
                    self.close_popup(&mut effects);
                    self.selected_listing = Some(id.clone());
                    effects.push(SelectionEffect::PopupOpened(id.clone()));
                }
            }
            (MapAction::Select, MapTarget::Listing(id)) => {
                self.selected_listing = Some(id.clone());
                effects.push(SelectionEffect::ListingChosen(id.clone()));
            }
            (MapAction::Deselect, MapTarget::Listing(id)) => {
                if self.selected_listing.as_ref() == Some(id) {
                    self.close_popup(&mut effects);
                }
            }
        }
        effects
    }

    fn clear_hover(&mut self, effects: &mut Vec<SelectionEffect>) {
        if self.hovered_community.take().is_some() {
            effects.push(SelectionEffect::CommunityHoverChanged(None));
        }
        if self.hovered_listing.take().is_some() {
            effects.push(SelectionEffect::ListingHoverChanged(None));
        }
    }

    fn close_popup(&mut self, effects: &mut Vec<SelectionEffect>) {
        if let Some(id) = self.selected_listing.take() {
            effects.push(SelectionEffect::PopupClosed(id));
        }
    }

    fn deselect_community(&mut self, effects: &mut Vec<SelectionEffect>) {
        self.close_popup(effects);
        self.hovered_listing = None;
        if let Some(id) = self.selected_community.take() {
            effects.push(SelectionEffect::CommunityDeselected(id));
        }
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Returns `true` when the event refers to something the engine knows about.
/// Hover-end and close events are always accepted so state never gets stuck.
fn event_target_known(event: &MapEvent, data: &MapData, listings: &ListingSet) -> bool {
    if matches!(event.action, MapAction::HoverEnd | MapAction::Deselect) {
        return true;
    }
    match &event.target {
        MapTarget::Community(id) => data.community(id).is_some(),
        MapTarget::Listing(id) => {
            listings.listings.iter().any(|l| &l.id == id) || data.listing(id).is_some()
        }
        MapTarget::Background => true,
    }
}

/// The SelectionController: the single consumer of [`MapEvent`]s.
#[allow(clippy::too_many_arguments)]
pub fn handle_map_events(
    mut events: EventReader<MapEvent>,
    data: Res<MapData>,
    config: Res<MapConfig>,
    view: Res<ViewportState>,
    mut selection: ResMut<SelectionState>,
    mut controller: ResMut<ViewportController>,
    mut listing_set: ResMut<ListingSet>,
    mut fetches: EventWriter<ListingFetchRequest>,
    mut notifications: EventWriter<MapNotification>,
) {
    for event in events.read() {
        if !event_target_known(event, &data, &listing_set) {
            warn!("Ignoring map event for unknown target: {:?}", event);
            continue;
        }

        for effect in selection.apply(event) {
            match effect {
                SelectionEffect::CommunityHoverChanged(id) => {
                    notifications.send(MapNotification::CommunityHovered(id));
                }
                SelectionEffect::ListingHoverChanged(id) => {
                    notifications.send(MapNotification::ListingHovered(id));
                }
                SelectionEffect::CommunitySelected(id) => {
                    let Some(community) = data.community(&id) else {
                        continue;
                    };
                    controller.fit_to_community(&view, community, &config);

                    // No markers until the scoped query answers.
                    let token = listing_set.begin(id.clone());
                    match SpatialArea::for_community(community) {
                        Some(area) => {
                            debug!(
                                "Selected community {} ({}); querying listings by {}",
                                community.name,
                                id,
                                area.kind()
                            );
                            fetches.send(ListingFetchRequest {
                                token,
                                area,
                                limit: config.listing_page_size,
                            });
                        }
                        None => {
                            listing_set.fail(&token, "community has no footprint");
                        }
                    }
                    notifications.send(MapNotification::CommunitySelected {
                        id,
                        url: community.url(),
                    });
                }
                SelectionEffect::CommunityDeselected(id) => {
                    controller.reset_to_default(&view, &config);
                    listing_set.clear();
                    notifications.send(MapNotification::CommunityDeselected(id));
                }
                SelectionEffect::PopupOpened(_) | SelectionEffect::PopupClosed(_) => {}
                SelectionEffect::ListingChosen(id) => {
                    let url = listing_set
                        .listings
                        .iter()
                        .find(|l| l.id == id)
                        .or_else(|| data.listing(&id))
                        .map(|l| l.url())
                        .unwrap_or_else(|| format!("/listing/{id}"));
                    notifications.send(MapNotification::ListingSelected { id, url });
                }
            }
        }
    }
}
