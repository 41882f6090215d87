/// Decoders for the backend feeds the viewer consumes.
///
/// Fetching itself (auth, pagination, realtime subscription) belongs to the
/// hosting app; these modules only turn payload text into domain types.
///
/// Submodules:
/// - `assets`: GeoJSON FeatureCollections for the four asset kinds.
/// - `reports`: report rows and realtime change payloads.

pub mod assets;
pub mod reports;

use std::fmt;

/// Errors raised when a feed payload can't be decoded at all. Individual
/// malformed records are skipped and counted instead.
#[derive(Debug, PartialEq)]
pub enum IngestError {
    /// The payload is not valid JSON or not the expected top-level shape.
    ParseError(String),
    /// A realtime payload decoded but its record did not.
    InvalidRecord(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IngestError::InvalidRecord(msg) => write!(f, "Invalid record: {}", msg),
        }
    }
}

impl std::error::Error for IngestError {}
