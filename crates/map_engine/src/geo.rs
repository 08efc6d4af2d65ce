//! Geographic primitives and the pure geometry helpers the layers share.
//!
//! Everything downstream of ingestion works on [`LatLng`]. Raw records may
//! carry points as `[lat, lng]` pairs or `{ "lat": .., "lng": .. }` objects;
//! [`RawPoint`] accepts both and is converted exactly once.

use bevy::math::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::TILE_SIZE;

/// Latitude limit of the Web Mercator projection.
const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_6;

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A point as it arrives from the data layer, in either supported shape.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawPoint {
    Pair([f64; 2]),
    Object {
        lat: f64,
        #[serde(alias = "lon")]
        lng: f64,
    },
}

impl From<RawPoint> for LatLng {
    fn from(raw: RawPoint) -> Self {
        match raw {
            RawPoint::Pair([lat, lng]) => LatLng::new(lat, lng),
            RawPoint::Object { lat, lng } => LatLng::new(lat, lng),
        }
    }
}

/// Axis-aligned geographic box, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Bounds::new(first.lat, first.lat, first.lng, first.lng);
        for p in iter {
            b.extend(*p);
        }
        Some(b)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.north = self.north.max(p.lat);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lng);
        self.west = self.west.min(p.lng);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.north.max(other.north),
            self.south.min(other.south),
            self.east.max(other.east),
            self.west.min(other.west),
        )
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.north + self.south) * 0.5,
            (self.east + self.west) * 0.5,
        )
    }

    /// A box is usable when its edges are finite and not inverted.
    pub fn is_valid(&self) -> bool {
        [self.north, self.south, self.east, self.west]
            .iter()
            .all(|v| v.is_finite())
            && self.north >= self.south
            && self.east >= self.west
    }

    /// Ring tracing the box edges, closed.
    pub fn to_ring(&self) -> Vec<LatLng> {
        vec![
            LatLng::new(self.north, self.west),
            LatLng::new(self.north, self.east),
            LatLng::new(self.south, self.east),
            LatLng::new(self.south, self.west),
            LatLng::new(self.north, self.west),
        ]
    }
}

// ---------------------------------------------------------------------------
// Ring helpers
// ---------------------------------------------------------------------------

/// Return a copy of `points` that ends where it begins.
pub fn close_ring(points: &[LatLng]) -> Vec<LatLng> {
    let mut ring = points.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if first != last {
            ring.push(*first);
        }
    }
    ring
}

/// Arithmetic mean of the points. Used as a label anchor, so concave shapes
/// may place it outside the polygon.
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng::new(lat / n, lng / n))
}

/// Bounding-box area in squared degrees. A culling heuristic, not true area.
pub fn spread(points: &[LatLng]) -> f64 {
    match Bounds::from_points(points) {
        Some(b) => (b.north - b.south) * (b.east - b.west),
        None => 0.0,
    }
}

/// Inclusive rectangular containment.
pub fn viewport_contains(bounds: &Bounds, point: LatLng) -> bool {
    point.lat >= bounds.south
        && point.lat <= bounds.north
        && point.lng >= bounds.west
        && point.lng <= bounds.east
}

/// Even-odd ray casting. Works on open or closed rings.
pub fn point_in_ring(ring: &[LatLng], point: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > point.lat) != (b.lat > point.lat) {
            let cross_lng = (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if point.lng < cross_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

// ---------------------------------------------------------------------------
// Web Mercator
// ---------------------------------------------------------------------------

/// World pixel size of the whole map at `zoom`.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project to world pixel coordinates (origin top-left, y down) at `zoom`.
pub fn project(p: LatLng, zoom: f64) -> DVec2 {
    let scale = world_size(zoom);
    let lat = p.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (p.lng + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) * 0.5 * scale;
    DVec2::new(x, y)
}

/// Inverse of [`project`].
pub fn unproject(px: DVec2, zoom: f64) -> LatLng {
    let scale = world_size(zoom);
    let lng = px.x / scale * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * px.y / scale);
    let lat = n.sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Largest continuous zoom at which `bounds` fits inside `size` minus
/// `padding` on every side. A zero-extent box yields `f64::INFINITY`; callers
/// clamp to their own cap.
pub fn zoom_to_fit(bounds: &Bounds, size: DVec2, padding: f64) -> f64 {
    let nw = project(LatLng::new(bounds.north, bounds.west), 0.0);
    let se = project(LatLng::new(bounds.south, bounds.east), 0.0);
    let extent = (se - nw).abs();
    let avail = (size - DVec2::splat(padding * 2.0)).max(DVec2::ONE);

    let zx = if extent.x > 0.0 {
        (avail.x / extent.x).log2()
    } else {
        f64::INFINITY
    };
    let zy = if extent.y > 0.0 {
        (avail.y / extent.y).log2()
    } else {
        f64::INFINITY
    };
    zx.min(zy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(2.0, 2.0),
            LatLng::new(2.0, 0.0),
        ]
    }

    #[test]
    fn test_close_ring_appends_first_point() {
        let ring = close_ring(&square());
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_close_ring_idempotent() {
        let once = close_ring(&square());
        let twice = close_ring(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_close_ring_does_not_mutate_input() {
        let input = square();
        let _ = close_ring(&input);
        assert_eq!(input.len(), 4);
    }

    #[test]
    fn test_centroid_of_square() {
        let c = centroid(&square()).unwrap();
        assert!((c.lat - 1.0).abs() < 1e-12);
        assert!((c.lng - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_spread_of_square() {
        assert!((spread(&square()) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_viewport_contains_is_inclusive() {
        let b = Bounds::new(2.0, 0.0, 2.0, 0.0);
        assert!(viewport_contains(&b, LatLng::new(2.0, 0.0)));
        assert!(viewport_contains(&b, LatLng::new(1.0, 1.0)));
        assert!(!viewport_contains(&b, LatLng::new(2.0001, 1.0)));
    }

    #[test]
    fn test_point_in_ring() {
        let ring = square();
        assert!(point_in_ring(&ring, LatLng::new(1.0, 1.0)));
        assert!(!point_in_ring(&ring, LatLng::new(3.0, 1.0)));
        assert!(point_in_ring(&close_ring(&ring), LatLng::new(0.5, 1.5)));
    }

    #[test]
    fn test_raw_point_shapes_normalize_identically() {
        let pair: RawPoint = serde_json::from_str("[33.5, -112.1]").unwrap();
        let obj: RawPoint = serde_json::from_str(r#"{"lat": 33.5, "lng": -112.1}"#).unwrap();
        assert_eq!(LatLng::from(pair), LatLng::from(obj));
    }

    #[test]
    fn test_project_unproject_inverse() {
        let p = LatLng::new(33.4484, -112.074);
        let back = unproject(project(p, 12.5), 12.5);
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_to_fit_grows_for_smaller_boxes() {
        let size = DVec2::new(1000.0, 800.0);
        let big = Bounds::new(34.0, 33.0, -111.0, -112.0);
        let small = Bounds::new(33.51, 33.50, -112.00, -112.01);
        assert!(zoom_to_fit(&small, size, 50.0) > zoom_to_fit(&big, size, 50.0));
    }

    #[test]
    fn test_bounds_union_and_center() {
        let a = Bounds::new(1.0, 0.0, 1.0, 0.0);
        let b = Bounds::new(3.0, 2.0, 3.0, 2.0);
        let u = a.union(&b);
        assert_eq!(u, Bounds::new(3.0, 0.0, 3.0, 0.0));
        assert_eq!(u.center(), LatLng::new(1.5, 1.5));
    }
}
