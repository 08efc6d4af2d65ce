//! Community and listing records.
//!
//! `*Record` types mirror what the data layer sends (loose, optional fields,
//! either coordinate shape). `Community` and `Listing` are the normalized
//! snapshots every layer works on.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::MapError;
use crate::geo::{Bounds, LatLng, RawPoint};

/// Fewest boundary points that still describe a polygon.
pub const MIN_RING_POINTS: usize = 3;

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque identifier as sent by the data layer: a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
    Decimal(f64),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => f.write_str(s),
            RawId::Number(n) => write!(f, "{n}"),
            RawId::Decimal(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommunityId(pub String);

impl CommunityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Lenient decoding
// =============================================================================

/// Field decoder that reads a mistyped or `null` value as the default.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Sequence decoder that keeps the elements it can read and drops the rest.
/// Anything other than an array reads as empty.
pub(crate) fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// A record dropped before normalization because it could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub kind: &'static str,
    pub index: usize,
    pub reason: String,
}

impl From<RejectedRecord> for MapError {
    fn from(r: RejectedRecord) -> Self {
        MapError::MalformedRecord {
            kind: r.kind,
            index: r.index,
            reason: r.reason,
        }
    }
}

/// Decode each element on its own so one unreadable record only costs itself.
pub fn decode_records<T: DeserializeOwned>(
    values: Vec<Value>,
    kind: &'static str,
    rejected: &mut Vec<RejectedRecord>,
) -> Vec<T> {
    let mut records = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(record) => records.push(record),
            Err(e) => rejected.push(RejectedRecord {
                kind,
                index,
                reason: e.to_string(),
            }),
        }
    }
    records
}

// =============================================================================
// Community
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRecord {
    pub id: RawId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<String>,
    /// Points that are not a `[lat, lng]` pair or `{lat, lng}` object are dropped.
    #[serde(default, deserialize_with = "lenient_seq")]
    pub coordinates: Vec<RawPoint>,
    #[serde(default, deserialize_with = "lenient")]
    pub bounds: Option<Bounds>,
    #[serde(default, deserialize_with = "lenient")]
    pub listings_count: Option<i64>,
}

/// A normalized community snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub slug: String,
    /// Open boundary ring (first point not repeated). `None` when the record
    /// carried fewer than [`MIN_RING_POINTS`] usable points.
    pub ring: Option<Vec<LatLng>>,
    pub bounds: Option<Bounds>,
    pub listings_count: u32,
}

impl Community {
    pub fn from_record(record: &CommunityRecord) -> Result<Self, MapError> {
        let mut points: Vec<LatLng> = record
            .coordinates
            .iter()
            .map(|p| LatLng::from(*p))
            .filter(LatLng::is_finite)
            .collect();
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let point_count = points.len();
        let ring = (point_count >= MIN_RING_POINTS).then_some(points);
        let bounds = record.bounds.filter(Bounds::is_valid);
        let id = CommunityId(record.id.to_string());

        if ring.is_none() && bounds.is_none() {
            return Err(MapError::MalformedGeometry {
                community: id.0,
                points: point_count,
            });
        }

        let slug = record
            .slug
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slugify(&record.name));

        Ok(Self {
            id,
            name: record.name.clone(),
            slug,
            ring,
            bounds,
            listings_count: record.listings_count.unwrap_or(0).clamp(0, u32::MAX as i64) as u32,
        })
    }

    pub fn has_polygon(&self) -> bool {
        self.ring.is_some()
    }

    /// Box used for framing and bounding-box queries: the ring's extent,
    /// falling back to the precomputed bounds.
    pub fn footprint(&self) -> Option<Bounds> {
        self.ring
            .as_deref()
            .and_then(|ring| Bounds::from_points(ring))
            .or(self.bounds)
    }

    /// Navigation target for this community's page.
    pub fn url(&self) -> String {
        format!("/communities/{}", self.slug)
    }
}

/// Normalize a batch of records, collecting the ones that had to be skipped.
pub fn normalize_communities(records: &[CommunityRecord]) -> (Vec<Community>, Vec<MapError>) {
    let mut communities = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for record in records {
        match Community::from_record(record) {
            Ok(c) => communities.push(c),
            Err(e) => skipped.push(e),
        }
    }
    (communities, skipped)
}

/// Lowercase, ASCII alphanumerics joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// =============================================================================
// Listing
// =============================================================================

/// Listing coordinates; either half may be missing in upstream data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawListingCoordinates {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub id: RawId,
    #[serde(default, deserialize_with = "lenient")]
    pub mls_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub coordinates: Option<RawListingCoordinates>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    Active,
    Pending,
    Sold,
    Other(String),
}

impl From<&str> for ListingStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "for sale" => ListingStatus::Active,
            "pending" | "under contract" => ListingStatus::Pending,
            "sold" | "closed" => ListingStatus::Sold,
            _ => ListingStatus::Other(s.trim().to_string()),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingStatus::Active => f.write_str("Active"),
            ListingStatus::Pending => f.write_str("Pending"),
            ListingStatus::Sold => f.write_str("Sold"),
            ListingStatus::Other(s) => f.write_str(s),
        }
    }
}

/// A normalized listing snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub mls_number: String,
    /// Positive asking price, if the record had one.
    pub price: Option<f64>,
    pub position: Option<LatLng>,
    pub status: ListingStatus,
    pub address: String,
    pub photos: Vec<String>,
}

impl Listing {
    pub fn from_record(record: &ListingRecord) -> Self {
        let id = ListingId(record.id.to_string());
        let position = record.coordinates.and_then(|c| match (c.lat, c.lng) {
            (Some(lat), Some(lng)) => Some(LatLng::new(lat, lng)).filter(LatLng::is_finite),
            _ => None,
        });
        Self {
            mls_number: record
                .mls_number
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| id.0.clone()),
            id,
            price: record.price.filter(|p| p.is_finite() && *p > 0.0),
            position,
            status: record
                .status
                .as_deref()
                .map(ListingStatus::from)
                .unwrap_or(ListingStatus::Active),
            address: record.address.clone().unwrap_or_default(),
            photos: record.photos.clone(),
        }
    }

    /// Where the marker goes, or why there is none.
    pub fn marker_position(&self) -> Result<LatLng, MapError> {
        self.position.ok_or_else(|| MapError::MissingCoordinates {
            listing: self.id.0.clone(),
        })
    }

    /// Navigation target for this listing's detail page.
    pub fn url(&self) -> String {
        format!("/listing/{}", self.mls_number)
    }
}

pub fn normalize_listings(records: &[ListingRecord]) -> Vec<Listing> {
    records.iter().map(Listing::from_record).collect()
}
