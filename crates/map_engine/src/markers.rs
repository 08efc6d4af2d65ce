//! Listing markers and the detail popup.
//!
//! Markers are kept sorted by z ascending; the drawing surface paints them in
//! order, so hovered and selected markers always end up on top.

use bevy::prelude::*;

use crate::geo::LatLng;
use crate::model::{Listing, ListingId};
use crate::palette::Rgb;
use crate::selection::SelectionState;

/// `$450K` below a million, `$1.2M` / `$2M` once the thousands would round
/// to four digits. `None` when the listing has no price.
pub fn price_label(price: Option<f64>) -> Option<String> {
    let price = price.filter(|p| p.is_finite() && *p > 0.0)?;
    let thousands = (price / 1_000.0).round();
    if thousands < 1_000.0 {
        return Some(format!("${}K", thousands as u64));
    }
    let millions = format!("{:.1}", price / 1_000_000.0);
    let millions = millions.strip_suffix(".0").unwrap_or(&millions);
    Some(format!("${millions}M"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerTier {
    Normal,
    Hovered,
    Selected,
}

impl MarkerTier {
    pub fn of(id: &ListingId, selection: &SelectionState) -> Self {
        if selection.selected_listing.as_ref() == Some(id) {
            MarkerTier::Selected
        } else if selection.hovered_listing.as_ref() == Some(id) {
            MarkerTier::Hovered
        } else {
            MarkerTier::Normal
        }
    }

    pub fn z_index(self) -> i32 {
        match self {
            MarkerTier::Normal => 0,
            MarkerTier::Hovered => 1000,
            MarkerTier::Selected => 2000,
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            MarkerTier::Normal => 1.0,
            MarkerTier::Hovered => 1.15,
            MarkerTier::Selected => 1.3,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            MarkerTier::Normal => Rgb::new(0x1f, 0x4e, 0x8c),
            MarkerTier::Hovered => Rgb::new(0xf5, 0x82, 0x31),
            MarkerTier::Selected => Rgb::new(0xe6, 0x19, 0x4b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRender {
    pub listing: ListingId,
    pub position: LatLng,
    pub label: String,
    pub tier: MarkerTier,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRender {
    pub listing: ListingId,
    pub position: LatLng,
    pub address: String,
    pub price: String,
    pub status: String,
    pub photo_count: usize,
    pub first_photo: Option<String>,
    pub url: String,
}

impl PopupRender {
    fn new(listing: &Listing, position: LatLng, price: String) -> Self {
        Self {
            listing: listing.id.clone(),
            position,
            address: listing.address.clone(),
            price,
            status: listing.status.to_string(),
            photo_count: listing.photos.len(),
            first_photo: listing.photos.first().cloned(),
            url: listing.url(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MarkerLayer {
    pub markers: Vec<MarkerRender>,
    pub popup: Option<PopupRender>,
    /// Listings skipped on the last rebuild for lacking coordinates.
    pub skipped: usize,
}

impl MarkerLayer {
    /// Clear and rebuild markers (and the popup) from `listings`.
    pub fn rebuild(&mut self, listings: &[Listing], selection: &SelectionState) {
        self.markers.clear();
        self.popup = None;
        self.skipped = 0;

        for listing in listings {
            let position = match listing.marker_position() {
                Ok(p) => p,
                Err(err) => {
                    debug!("{}", err);
                    self.skipped += 1;
                    continue;
                }
            };
            let label = price_label(listing.price).unwrap_or_else(|| "N/A".to_string());
            let tier = MarkerTier::of(&listing.id, selection);
            if tier == MarkerTier::Selected {
                self.popup = Some(PopupRender::new(listing, position, label.clone()));
            }
            self.markers.push(MarkerRender {
                listing: listing.id.clone(),
                position,
                label,
                tier,
                z_index: tier.z_index(),
            });
        }
        // Stable: equal tiers keep input order.
        self.markers.sort_by_key(|m| m.z_index);
    }

    pub fn get(&self, id: &ListingId) -> Option<&MarkerRender> {
        self.markers.iter().find(|m| &m.listing == id)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
        self.popup = None;
        self.skipped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ListingRecord, RawId, RawListingCoordinates};

    fn listing(id: &str, price: f64, coords: Option<(f64, f64)>) -> Listing {
        Listing::from_record(&ListingRecord {
            id: RawId::Text(id.to_string()),
            mls_number: Some(format!("MLS{id}")),
            price: Some(price),
            coordinates: coords.map(|(lat, lng)| RawListingCoordinates {
                lat: Some(lat),
                lng: Some(lng),
            }),
            status: Some("active".to_string()),
            address: Some(format!("{id} Main St")),
            photos: vec!["a.jpg".to_string(), "b.jpg".to_string()],
        })
    }

    #[test]
    fn test_price_labels() {
        assert_eq!(price_label(Some(450_000.0)).as_deref(), Some("$450K"));
        assert_eq!(price_label(Some(1_260_000.0)).as_deref(), Some("$1.3M"));
        assert_eq!(price_label(Some(2_000_000.0)).as_deref(), Some("$2M"));
        assert_eq!(price_label(Some(1_000_000.0)).as_deref(), Some("$1M"));
        assert_eq!(price_label(Some(999_400.0)).as_deref(), Some("$999K"));
        assert_eq!(price_label(None), None);
        assert_eq!(price_label(Some(-1.0)), None);
    }

    #[test]
    fn test_price_just_under_a_million_uses_millions() {
        assert_eq!(price_label(Some(999_499.0)).as_deref(), Some("$999K"));
        assert_eq!(price_label(Some(999_500.0)).as_deref(), Some("$1M"));
        assert_eq!(price_label(Some(999_999.0)).as_deref(), Some("$1M"));
    }

    #[test]
    fn test_missing_coordinates_are_skipped() {
        let mut layer = MarkerLayer::default();
        let listings = [
            listing("1", 300_000.0, Some((33.5, -112.0))),
            listing("2", 300_000.0, None),
        ];
        layer.rebuild(&listings, &SelectionState::default());
        assert_eq!(layer.markers.len(), 1);
        assert_eq!(layer.skipped, 1);
    }

    #[test]
    fn test_highlighted_markers_sort_last() {
        let mut layer = MarkerLayer::default();
        let listings = [
            listing("1", 300_000.0, Some((33.5, -112.0))),
            listing("2", 400_000.0, Some((33.5, -112.0))),
            listing("3", 500_000.0, Some((33.5, -112.0))),
        ];
        let selection = SelectionState {
            hovered_listing: Some(ListingId::new("1")),
            selected_listing: Some(ListingId::new("2")),
            ..Default::default()
        };
        layer.rebuild(&listings, &selection);
        let order: Vec<&str> = layer.markers.iter().map(|m| m.listing.0.as_str()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);
        assert_eq!(layer.markers[2].tier, MarkerTier::Selected);
    }

    #[test]
    fn test_popup_follows_selected_listing() {
        let mut layer = MarkerLayer::default();
        let listings = [listing("7", 1_500_000.0, Some((33.5, -112.0)))];
        let selection = SelectionState {
            selected_listing: Some(ListingId::new("7")),
            ..Default::default()
        };
        layer.rebuild(&listings, &selection);
        let popup = layer.popup.as_ref().unwrap();
        assert_eq!(popup.price, "$1.5M");
        assert_eq!(popup.photo_count, 2);
        assert_eq!(popup.first_photo.as_deref(), Some("a.jpg"));
        assert_eq!(popup.url, "/listing/MLS7");

        layer.rebuild(&listings, &SelectionState::default());
        assert!(layer.popup.is_none());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut layer = MarkerLayer::default();
        let listings = [listing("1", 300_000.0, Some((33.5, -112.0)))];
        layer.rebuild(&listings, &SelectionState::default());
        layer.rebuild(&listings, &SelectionState::default());
        assert_eq!(layer.markers.len(), 1);
    }
}
