// ---------------------------------------------------------------------------
// MapError: typed failures of the map engine and its data seams
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised while ingesting map data or fetching listings.
///
/// Data-shape variants are recovered locally (the offending record is
/// skipped); they exist so the skip can be logged and tested by kind.
#[derive(Debug)]
pub enum MapError {
    /// A community had fewer than 3 boundary points and no bounds fallback.
    MalformedGeometry { community: String, points: usize },
    /// A community or listing record whose shape could not be read at all.
    MalformedRecord {
        kind: &'static str,
        index: usize,
        reason: String,
    },
    /// A listing lacked a latitude or longitude.
    MissingCoordinates { listing: String },
    /// The listing source failed while answering a spatial query.
    SpatialQueryFailure(String),
    /// A listing result arrived for a selection that is no longer current.
    StaleResult { community: String },
    /// Map data could not be decoded.
    Data(String),
    /// I/O error while reading map data.
    Io(std::io::Error),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MalformedGeometry { community, points } => write!(
                f,
                "Malformed geometry: community '{community}' has {points} point(s) and no bounds"
            ),
            MapError::MalformedRecord { kind, index, reason } => {
                write!(f, "Malformed {kind} record #{index}: {reason}")
            }
            MapError::MissingCoordinates { listing } => {
                write!(f, "Missing coordinates for listing '{listing}'")
            }
            MapError::SpatialQueryFailure(msg) => write!(f, "Spatial query failed: {msg}"),
            MapError::StaleResult { community } => {
                write!(f, "Stale listing result for community '{community}'")
            }
            MapError::Data(msg) => write!(f, "Map data error: {msg}"),
            MapError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(e: std::io::Error) -> Self {
        MapError::Io(e)
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::Data(e.to_string())
    }
}
