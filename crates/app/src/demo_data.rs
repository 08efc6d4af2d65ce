//! Seeded demo neighbourhoods and listings around central Phoenix.
//!
//! Used when no data file is given. The same seed always yields the same
//! map, so manual checks and tests are repeatable.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use map_engine::geo::{point_in_ring, Bounds, LatLng, RawPoint};
use map_engine::model::{RawId, RawListingCoordinates};
use map_engine::{CommunityRecord, ListingRecord, LoadMapData};

pub const DEMO_SEED: u64 = 42;

const ORIGIN: LatLng = LatLng::new(33.38, -112.20);
const ROWS: usize = 5;
const COLS: usize = 6;
/// Grid cell edge in degrees.
const CELL: f64 = 0.045;
const MAX_LISTINGS_PER_COMMUNITY: usize = 12;
const PLACEMENT_ATTEMPTS: usize = 50;

const NAMES: [&str; ROWS * COLS] = [
    "Arcadia",
    "Biltmore",
    "Camelback East",
    "Desert Ridge",
    "Encanto",
    "Willo",
    "Coronado",
    "Roosevelt",
    "Garfield",
    "Moon Valley",
    "Ahwatukee",
    "Laveen",
    "Maryvale",
    "Deer Valley",
    "Paradise Valley",
    "Sunnyslope",
    "North Mountain",
    "Estrella",
    "Alhambra",
    "South Mountain",
    "Central City",
    "Palmcroft",
    "Story",
    "Fairview Place",
    "Medlock Place",
    "Windsor Square",
    "Pierson Place",
    "Country Club",
    "Arcadia Lite",
    "Squaw Peak",
];

const STREETS: [&str; 8] = [
    "E Camelback Rd",
    "N 24th St",
    "E Indian School Rd",
    "N Central Ave",
    "W McDowell Rd",
    "E Thomas Rd",
    "N 7th St",
    "E Lincoln Dr",
];

const STATUSES: [&str; 5] = ["Active", "Active", "Active", "Pending", "Sold"];

/// Demo map: communities for the initial load and the listing pool the
/// in-memory listing source answers queries from.
pub struct DemoMap {
    pub load: LoadMapData,
    pub listings: Vec<ListingRecord>,
}

pub fn demo_map(seed: u64) -> DemoMap {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Longitude degrees shrink away from the equator; stretch them so cells are square.
    let lng_scale = 1.0 / ORIGIN.lat.to_radians().cos();
    let mut communities = Vec::with_capacity(ROWS * COLS);
    let mut listings = Vec::new();

    for (index, name) in NAMES.iter().enumerate() {
        let (row, col) = (index / COLS, index % COLS);
        let center = LatLng::new(
            ORIGIN.lat + (row as f64 + 0.5 + rng.gen_range(-0.1..0.1)) * CELL,
            ORIGIN.lng + (col as f64 + 0.5 + rng.gen_range(-0.1..0.1)) * CELL * lng_scale,
        );
        let ring = irregular_ring(&mut rng, center, lng_scale);

        let wanted = rng.gen_range(0..=MAX_LISTINGS_PER_COMMUNITY);
        let mut placed = 0;
        for _ in 0..wanted {
            let Some(position) = point_inside(&mut rng, &ring) else {
                continue;
            };
            let listing = demo_listing(&mut rng, listings.len(), position);
            if listing.coordinates.and_then(|c| c.lng).is_some() {
                placed += 1;
            }
            listings.push(listing);
        }

        communities.push(CommunityRecord {
            id: RawId::Number(index as i64 + 1),
            name: name.to_string(),
            slug: None,
            coordinates: ring.iter().map(|p| RawPoint::Pair([p.lat, p.lng])).collect(),
            bounds: None,
            listings_count: Some(placed),
        });
    }

    DemoMap {
        load: LoadMapData {
            communities,
            ..Default::default()
        },
        listings,
    }
}

/// Star-shaped ring around `center`: monotonic angles keep it simple, and a
/// radius under 0.4 cells keeps neighbours (at least 0.8 cells apart) disjoint.
fn irregular_ring(rng: &mut ChaCha8Rng, center: LatLng, lng_scale: f64) -> Vec<LatLng> {
    let vertices = rng.gen_range(6..=9);
    (0..vertices)
        .map(|k| {
            let angle = (k as f64 + rng.gen_range(-0.3..0.3)) * std::f64::consts::TAU
                / vertices as f64;
            let radius = CELL * rng.gen_range(0.28..0.4);
            LatLng::new(
                center.lat + radius * angle.sin(),
                center.lng + radius * angle.cos() * lng_scale,
            )
        })
        .collect()
}

fn point_inside(rng: &mut ChaCha8Rng, ring: &[LatLng]) -> Option<LatLng> {
    let bounds = Bounds::from_points(ring)?;
    (0..PLACEMENT_ATTEMPTS)
        .map(|_| {
            LatLng::new(
                rng.gen_range(bounds.south..bounds.north),
                rng.gen_range(bounds.west..bounds.east),
            )
        })
        .find(|p| point_in_ring(ring, *p))
}

fn demo_listing(rng: &mut ChaCha8Rng, index: usize, position: LatLng) -> ListingRecord {
    let mls = format!("{}", 6_100_000 + index);
    let price = (!rng.gen_bool(0.06)).then(|| rng.gen_range(250..2_500) as f64 * 1_000.0);
    // A few upstream records arrive without a longitude.
    let lng = (!rng.gen_bool(0.03)).then_some(position.lng);
    let photos = (1..=rng.gen_range(0..=4))
        .map(|k| format!("/photos/{mls}/{k}.jpg"))
        .collect();
    let street = STREETS.choose(rng).copied().unwrap_or("N Central Ave");
    let status = STATUSES.choose(rng).copied().unwrap_or("Active");

    ListingRecord {
        id: RawId::Text(format!("demo-{index}")),
        address: Some(format!("{} {street}", rng.gen_range(100..9_999))),
        mls_number: Some(mls),
        price,
        coordinates: Some(RawListingCoordinates {
            lat: Some(position.lat),
            lng,
        }),
        status: Some(status.to_string()),
        photos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_engine::model::{normalize_communities, normalize_listings};

    #[test]
    fn test_same_seed_same_map() {
        let a = demo_map(DEMO_SEED);
        let b = demo_map(DEMO_SEED);
        assert_eq!(a.load.communities, b.load.communities);
        assert_eq!(a.listings, b.listings);
    }

    #[test]
    fn test_different_seed_differs() {
        assert_ne!(demo_map(1).listings, demo_map(2).listings);
    }

    #[test]
    fn test_every_community_is_drawable() {
        let demo = demo_map(DEMO_SEED);
        let (communities, skipped) = normalize_communities(&demo.load.communities);
        assert!(skipped.is_empty());
        assert_eq!(communities.len(), ROWS * COLS);
        assert!(communities.iter().all(|c| c.has_polygon()));
    }

    #[test]
    fn test_listing_counts_match_placed_listings() {
        let demo = demo_map(DEMO_SEED);
        let (communities, _) = normalize_communities(&demo.load.communities);
        let listings = normalize_listings(&demo.listings);
        for community in &communities {
            let Some(ring) = community.ring.as_deref() else {
                continue;
            };
            let inside = listings
                .iter()
                .filter_map(|l| l.position)
                .filter(|p| point_in_ring(ring, *p))
                .count() as u32;
            // Neighbouring rings never overlap, so every placed listing
            // belongs to exactly one community.
            assert_eq!(inside, community.listings_count, "{}", community.name);
        }
    }
}
