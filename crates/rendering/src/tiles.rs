//! Slippy-map tile grid covering the viewport.
//!
//! Tile imagery is not fetched; the grid is drawn as a faint backdrop so pans
//! and zooms read as movement over a map.

use bevy::math::DVec2;
use map_engine::config::TILE_SIZE;
use map_engine::geo::project;
use map_engine::ViewportState;

const MAX_TILE_ZOOM: f64 = 22.0;

/// One tile and where it lands on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRect {
    pub x: i64,
    pub y: i64,
    pub z: u8,
    /// Screen-space top-left corner in pixels.
    pub min: DVec2,
    pub max: DVec2,
}

impl TileRect {
    /// Checkerboard parity, used to shade alternating tiles.
    pub fn is_odd(&self) -> bool {
        (self.x + self.y).rem_euclid(2) == 1
    }
}

/// Tiles at `floor(zoom)` intersecting the viewport. Columns wrap around the
/// antimeridian; rows outside the world are skipped.
pub fn visible_tiles(view: &ViewportState) -> Vec<TileRect> {
    let z = view.zoom.floor().clamp(0.0, MAX_TILE_ZOOM);
    let tile_px = TILE_SIZE * 2f64.powf(view.zoom - z);
    let per_axis = 2i64.pow(z as u32);

    let top_left = project(view.center, view.zoom) - view.size * 0.5;
    let bottom_right = top_left + view.size;
    let first = (top_left / tile_px).floor();
    let last = (bottom_right / tile_px).ceil();

    let mut tiles = Vec::new();
    for ty in first.y as i64..last.y as i64 {
        if ty < 0 || ty >= per_axis {
            continue;
        }
        for tx in first.x as i64..last.x as i64 {
            let min = DVec2::new(tx as f64, ty as f64) * tile_px - top_left;
            tiles.push(TileRect {
                x: tx.rem_euclid(per_axis),
                y: ty,
                z: z as u8,
                min,
                max: min + DVec2::splat(tile_px),
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_engine::LatLng;

    fn covered_area(tiles: &[TileRect], size: DVec2) -> f64 {
        tiles
            .iter()
            .map(|t| {
                let min = t.min.max(DVec2::ZERO);
                let max = t.max.min(size);
                let extent = (max - min).max(DVec2::ZERO);
                extent.x * extent.y
            })
            .sum()
    }

    #[test]
    fn test_tiles_cover_the_screen() {
        let size = DVec2::new(800.0, 600.0);
        let view = ViewportState::new(LatLng::new(33.45, -112.07), 11.0, size);
        let tiles = visible_tiles(&view);
        assert!(!tiles.is_empty());
        assert!((covered_area(&tiles, size) - size.x * size.y).abs() < 1e-6);
        assert!(tiles.iter().all(|t| t.z == 11));
    }

    #[test]
    fn test_fractional_zoom_scales_tiles() {
        let view = ViewportState::new(LatLng::new(33.45, -112.07), 11.5, DVec2::new(800.0, 600.0));
        let tile = visible_tiles(&view)[0];
        let edge = tile.max.x - tile.min.x;
        assert!((edge - TILE_SIZE * 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rows_outside_world_are_skipped() {
        // At zoom 0 the whole world is a single 256px tile.
        let view = ViewportState::new(LatLng::new(0.0, 0.0), 0.0, DVec2::new(1024.0, 1024.0));
        let tiles = visible_tiles(&view);
        assert!(tiles.iter().all(|t| t.y == 0 && t.x == 0));
        assert!(tiles.len() >= 3, "columns repeat across the antimeridian");
    }

    #[test]
    fn test_checkerboard_parity() {
        let a = TileRect {
            x: 0,
            y: 0,
            z: 1,
            min: DVec2::ZERO,
            max: DVec2::ONE,
        };
        let b = TileRect { x: 1, ..a };
        assert_ne!(a.is_odd(), b.is_odd());
    }
}
