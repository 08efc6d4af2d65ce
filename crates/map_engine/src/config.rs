use bevy::prelude::*;

use crate::geo::LatLng;

// ---------------------------------------------------------------------------
// Level of detail
// ---------------------------------------------------------------------------

/// Below this zoom no labels or badges are drawn at all.
pub const LABEL_MIN_ZOOM: f64 = 10.0;
/// Up to (and including) this zoom, labels are limited to large communities.
pub const LABEL_SPREAD_CULL_MAX_ZOOM: f64 = 11.0;
/// Minimum bounding-box spread (squared degrees) for a label at low zoom.
pub const LABEL_MIN_SPREAD: f64 = 0.0001;

// ---------------------------------------------------------------------------
// Styling
// ---------------------------------------------------------------------------

/// Number of entries in the community fill palette.
pub const PALETTE_SIZE: usize = 20;
/// How much darker a polygon border is than its fill.
pub const BORDER_DARKEN: f32 = 0.35;

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Pixel size of one map tile at integer zoom levels.
pub const TILE_SIZE: f64 = 256.0;
/// Padding kept around fitted bounds, in screen pixels.
pub const FIT_PADDING_PX: f64 = 50.0;
/// Zoom cap when framing a single community.
pub const SINGLE_FIT_MAX_ZOOM: f64 = 15.0;
/// Duration of fit and reset animations, in seconds.
pub const FIT_ANIMATION_SECS: f32 = 0.6;

pub const MIN_ZOOM: f64 = 3.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Screen size assumed until the drawing surface reports its real size.
pub const DEFAULT_VIEW_SIZE: (f64, f64) = (1280.0, 720.0);

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// Page-size limit passed to spatial listing queries.
pub const DEFAULT_LISTING_PAGE_SIZE: usize = 200;

/// Runtime map settings. Values can be overridden through environment
/// variables.
#[derive(Resource, Clone, Debug)]
pub struct MapConfig {
    /// Center the view returns to on reset / deselect.
    pub default_center: LatLng,
    /// Zoom the view returns to on reset / deselect.
    pub default_zoom: f64,
    pub fit_padding_px: f64,
    pub single_fit_max_zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub animation_secs: f32,
    /// Maximum number of listings requested per spatial query.
    pub listing_page_size: usize,
}

impl MapConfig {
    /// Built-in defaults, ignoring the environment.
    pub fn builtin() -> Self {
        Self {
            default_center: LatLng::new(33.4484, -112.0740),
            default_zoom: 10.0,
            fit_padding_px: FIT_PADDING_PX,
            single_fit_max_zoom: SINGLE_FIT_MAX_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            animation_secs: FIT_ANIMATION_SECS,
            listing_page_size: DEFAULT_LISTING_PAGE_SIZE,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        let builtin = Self::builtin();
        let lat = std::env::var("COMMUNITY_MAP_LAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(builtin.default_center.lat);
        let lng = std::env::var("COMMUNITY_MAP_LNG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(builtin.default_center.lng);
        let default_zoom = std::env::var("COMMUNITY_MAP_ZOOM")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|z| z.clamp(builtin.min_zoom, builtin.max_zoom))
            .unwrap_or(builtin.default_zoom);
        let listing_page_size = std::env::var("COMMUNITY_MAP_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(builtin.listing_page_size);

        Self {
            default_center: LatLng::new(lat, lng),
            default_zoom,
            listing_page_size,
            ..builtin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_zoom_within_limits() {
        let cfg = MapConfig::builtin();
        assert!(cfg.default_zoom >= cfg.min_zoom && cfg.default_zoom <= cfg.max_zoom);
        assert!(cfg.single_fit_max_zoom <= cfg.max_zoom);
    }

    #[test]
    fn test_lod_thresholds_ordered() {
        assert!(LABEL_MIN_ZOOM <= LABEL_SPREAD_CULL_MAX_ZOOM);
        assert!(LABEL_MIN_SPREAD > 0.0);
    }
}
