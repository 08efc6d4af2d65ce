//! Spatial listing fetch for the selected community.
//!
//! Selecting a community issues a [`ListingFetchRequest`] scoped to its ring
//! (or its bounding box when no ring exists). The request runs on bevy's
//! `IoTaskPool` against whatever [`ListingSource`] the app installed.
//!
//! Every request carries a [`FetchToken`]. Only the token stored in
//! [`ListingSet::pending`] may commit; tasks for any other token are dropped
//! (cancelled) before they are polled, and completions that still slip
//! through are discarded on arrival if the token no longer matches the
//! selected community.

use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;
use bevy::tasks::{block_on, IoTaskPool, Task};

use crate::error::MapError;
use crate::geo::{close_ring, point_in_ring, viewport_contains, Bounds, LatLng};
use crate::model::{normalize_listings, Community, CommunityId, Listing, ListingRecord};
use crate::selection::{MapNotification, SelectionState};

// =============================================================================
// Query area and the provider seam
// =============================================================================

/// Area a spatial listing query is scoped to. The ring form is preferred;
/// the bounding box may over-match.
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialArea {
    /// Closed polygon ring.
    Ring(Vec<LatLng>),
    Bounds(Bounds),
}

impl SpatialArea {
    pub fn for_community(community: &Community) -> Option<Self> {
        match (&community.ring, community.bounds) {
            (Some(ring), _) => Some(SpatialArea::Ring(close_ring(ring))),
            (None, Some(bounds)) => Some(SpatialArea::Bounds(bounds)),
            (None, None) => None,
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        match self {
            SpatialArea::Ring(ring) => point_in_ring(ring, point),
            SpatialArea::Bounds(bounds) => viewport_contains(bounds, point),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SpatialArea::Ring(_) => "polygon",
            SpatialArea::Bounds(_) => "bounding box",
        }
    }
}

/// Answers spatial listing queries. Implementations run off the main thread.
pub trait ListingSource: Send + Sync + 'static {
    fn query(&self, area: &SpatialArea, limit: usize) -> Result<Vec<ListingRecord>, MapError>;
}

/// The installed listing source. Without one, selections resolve to an
/// empty, failed listing set.
#[derive(Resource, Clone)]
pub struct ListingProvider(pub Arc<dyn ListingSource>);

impl ListingProvider {
    pub fn new(source: impl ListingSource) -> Self {
        Self(Arc::new(source))
    }
}

/// Listing source over a fixed in-memory record set.
pub struct InMemoryListingSource {
    records: Vec<ListingRecord>,
    latency: Duration,
}

impl InMemoryListingSource {
    pub fn new(records: Vec<ListingRecord>) -> Self {
        Self {
            records,
            latency: Duration::ZERO,
        }
    }

    /// Sleep this long before answering, to mimic a remote service.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl ListingSource for InMemoryListingSource {
    fn query(&self, area: &SpatialArea, limit: usize) -> Result<Vec<ListingRecord>, MapError> {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        Ok(self
            .records
            .iter()
            .filter(|r| {
                r.coordinates
                    .and_then(|c| Some(LatLng::new(c.lat?, c.lng?)))
                    .is_some_and(|p| area.contains(p))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Tokens, requests and the listing set
// =============================================================================

/// Identifies one issued query: the community it was issued for plus a
/// monotonically increasing sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchToken {
    pub community: CommunityId,
    pub seq: u64,
}

#[derive(Event, Debug, Clone)]
pub struct ListingFetchRequest {
    pub token: FetchToken,
    pub area: SpatialArea,
    pub limit: usize,
}

#[derive(Event, Debug)]
pub struct ListingFetchCompleted {
    pub token: FetchToken,
    pub result: Result<Vec<ListingRecord>, MapError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Pending,
    Loaded,
    Failed(String),
}

/// Listings scoped to the selected community.
#[derive(Resource, Default, Debug)]
pub struct ListingSet {
    pub listings: Vec<Listing>,
    pub status: FetchStatus,
    /// The only token allowed to commit.
    pub pending: Option<FetchToken>,
    /// Bumped whenever `listings` changes.
    pub generation: u64,
    next_seq: u64,
}

impl ListingSet {
    /// Start a new query for `community`: drop current listings and make the
    /// returned token the only one allowed to commit.
    pub fn begin(&mut self, community: CommunityId) -> FetchToken {
        self.next_seq += 1;
        let token = FetchToken {
            community,
            seq: self.next_seq,
        };
        self.listings.clear();
        self.status = FetchStatus::Pending;
        self.pending = Some(token.clone());
        self.generation += 1;
        token
    }

    pub fn is_current(&self, token: &FetchToken) -> bool {
        self.pending.as_ref() == Some(token)
    }

    /// Commit results for `token`. Returns `false` (and changes nothing) when
    /// the token is stale.
    pub fn commit(&mut self, token: &FetchToken, listings: Vec<Listing>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.listings = listings;
        self.status = FetchStatus::Loaded;
        self.pending = None;
        self.generation += 1;
        true
    }

    /// Mark the current query as failed; the set stays empty.
    pub fn fail(&mut self, token: &FetchToken, message: impl Into<String>) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.listings.clear();
        self.status = FetchStatus::Failed(message.into());
        self.pending = None;
        self.generation += 1;
        true
    }

    /// Drop listings and any pending query.
    pub fn clear(&mut self) {
        self.listings.clear();
        self.status = FetchStatus::Idle;
        self.pending = None;
        self.generation += 1;
    }
}

/// Spawned tasks not yet resolved.
#[derive(Resource, Default)]
pub struct InFlightFetches {
    tasks: Vec<(FetchToken, Task<Result<Vec<ListingRecord>, MapError>>)>,
}

impl InFlightFetches {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Spawn a task per request on the `IoTaskPool`.
pub fn dispatch_listing_fetches(
    mut requests: EventReader<ListingFetchRequest>,
    provider: Option<Res<ListingProvider>>,
    mut in_flight: ResMut<InFlightFetches>,
    mut completed: EventWriter<ListingFetchCompleted>,
) {
    for request in requests.read() {
        let Some(provider) = provider.as_ref() else {
            completed.send(ListingFetchCompleted {
                token: request.token.clone(),
                result: Err(MapError::SpatialQueryFailure(
                    "no listing source installed".to_string(),
                )),
            });
            continue;
        };

        let source = Arc::clone(&provider.0);
        let area = request.area.clone();
        let limit = request.limit;
        let task = IoTaskPool::get().spawn(async move { source.query(&area, limit) });
        in_flight.tasks.push((request.token.clone(), task));
    }
}

/// Poll in-flight fetches. Tasks whose token is no longer pending are dropped,
/// which cancels them.
pub fn collect_listing_fetches(
    listing_set: Res<ListingSet>,
    mut in_flight: ResMut<InFlightFetches>,
    mut completed: EventWriter<ListingFetchCompleted>,
) {
    let before = in_flight.tasks.len();
    in_flight
        .tasks
        .retain(|(token, _)| listing_set.is_current(token));
    let cancelled = before - in_flight.tasks.len();
    if cancelled > 0 {
        debug!("Cancelled {} superseded listing fetch(es)", cancelled);
    }

    let mut still_running = Vec::with_capacity(in_flight.tasks.len());
    for (token, mut task) in in_flight.tasks.drain(..) {
        match block_on(futures_lite::future::poll_once(&mut task)) {
            Some(result) => {
                completed.send(ListingFetchCompleted { token, result });
            }
            None => still_running.push((token, task)),
        }
    }
    in_flight.tasks = still_running;
}

/// Apply completed fetches, discarding any that went stale.
pub fn commit_listing_results(
    mut completed: EventReader<ListingFetchCompleted>,
    selection: Res<SelectionState>,
    mut listing_set: ResMut<ListingSet>,
    mut notifications: EventWriter<MapNotification>,
) {
    for done in completed.read() {
        let stale = selection.selected_community.as_ref() != Some(&done.token.community)
            || !listing_set.is_current(&done.token);
        if stale {
            let err = MapError::StaleResult {
                community: done.token.community.0.clone(),
            };
            debug!("Discarding listing result (seq {}): {}", done.token.seq, err);
            continue;
        }

        match &done.result {
            Ok(records) => {
                let listings = normalize_listings(records);
                info!(
                    "Loaded {} listing(s) for community {}",
                    listings.len(),
                    done.token.community
                );
                listing_set.commit(&done.token, listings);
            }
            Err(err) => {
                warn!("Listing fetch for {} failed: {}", done.token.community, err);
                listing_set.fail(&done.token, err.to_string());
                notifications.send(MapNotification::ListingFetchFailed {
                    community: done.token.community.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawId, RawListingCoordinates};

    fn listing_at(id: &str, lat: f64, lng: f64) -> ListingRecord {
        ListingRecord {
            id: RawId::Text(id.to_string()),
            mls_number: None,
            price: Some(500_000.0),
            coordinates: Some(RawListingCoordinates {
                lat: Some(lat),
                lng: Some(lng),
            }),
            status: None,
            address: None,
            photos: Vec::new(),
        }
    }

    fn triangle() -> SpatialArea {
        SpatialArea::Ring(close_ring(&[
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 2.0),
            LatLng::new(2.0, 0.0),
        ]))
    }

    #[test]
    fn test_ring_query_excludes_bbox_corner() {
        let source = InMemoryListingSource::new(vec![
            listing_at("in", 0.5, 0.5),
            listing_at("corner", 1.8, 1.8),
        ]);
        let ring_hits = source.query(&triangle(), 10).unwrap();
        assert_eq!(ring_hits.len(), 1);

        // The bounding box over-matches the same polygon.
        let bbox = SpatialArea::Bounds(Bounds::new(2.0, 0.0, 2.0, 0.0));
        assert_eq!(source.query(&bbox, 10).unwrap().len(), 2);
    }

    #[test]
    fn test_query_respects_limit_and_skips_missing_coordinates() {
        let mut records: Vec<_> = (0..10)
            .map(|i| listing_at(&format!("l{i}"), 0.5, 0.5))
            .collect();
        records.push(ListingRecord {
            coordinates: None,
            ..listing_at("nowhere", 0.0, 0.0)
        });
        let source = InMemoryListingSource::new(records);
        assert_eq!(source.query(&triangle(), 4).unwrap().len(), 4);
    }

    #[test]
    fn test_listing_set_rejects_stale_token() {
        let mut set = ListingSet::default();
        let a = set.begin(CommunityId::new("a"));
        let b = set.begin(CommunityId::new("b"));
        assert!(!set.commit(&a, Vec::new()));
        assert_eq!(set.status, FetchStatus::Pending);
        assert!(set.commit(&b, Vec::new()));
        assert_eq!(set.status, FetchStatus::Loaded);
    }

    #[test]
    fn test_listing_set_same_community_new_seq_is_distinct() {
        let mut set = ListingSet::default();
        let first = set.begin(CommunityId::new("a"));
        let second = set.begin(CommunityId::new("a"));
        assert_ne!(first, second);
        assert!(!set.is_current(&first));
    }

    #[test]
    fn test_fail_leaves_empty_set() {
        let mut set = ListingSet::default();
        let t = set.begin(CommunityId::new("a"));
        assert!(set.fail(&t, "boom"));
        assert!(set.listings.is_empty());
        assert_eq!(set.status, FetchStatus::Failed("boom".to_string()));
    }

    #[test]
    fn test_area_prefers_ring_over_bounds() {
        let c = Community {
            id: CommunityId::new("a"),
            name: "A".to_string(),
            slug: "a".to_string(),
            ring: Some(vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(1.0, 1.0),
            ]),
            bounds: Some(Bounds::new(1.0, 0.0, 1.0, 0.0)),
            listings_count: 0,
        };
        match SpatialArea::for_community(&c) {
            Some(SpatialArea::Ring(ring)) => assert_eq!(ring.first(), ring.last()),
            other => panic!("expected ring area, got {other:?}"),
        }
    }
}
