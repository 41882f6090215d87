/// Core data types for the drainage viewer core.
///
/// This module defines the shared domain model imported by all other modules:
/// the four asset kinds, the single-selection reference, simulation parameter
/// records, and user-filed reports. It contains no I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A WGS84 position in `[lon, lat]` order, matching GeoJSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lon, p.lat]
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// The four drainage asset kinds tracked by the viewer.
///
/// Ids are unique within a kind but may collide across kinds, so every
/// lookup is scoped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Pipe,
    Inlet,
    Outlet,
    Drain,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [
        AssetKind::Pipe,
        AssetKind::Inlet,
        AssetKind::Outlet,
        AssetKind::Drain,
    ];
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Pipe => write!(f, "pipe"),
            AssetKind::Inlet => write!(f, "inlet"),
            AssetKind::Outlet => write!(f, "outlet"),
            AssetKind::Drain => write!(f, "drain"),
        }
    }
}

/// A conduit segment. The path is ordered upstream to downstream when the
/// source data says so; nothing here depends on that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pipe {
    pub id: String,
    pub path: Vec<LngLat>,
    pub diameter_m: Option<f64>,
    pub length_m: Option<f64>,
    /// Manning's roughness coefficient.
    pub roughness: Option<f64>,
    pub upstream_node: Option<String>,
    pub downstream_node: Option<String>,
}

/// A street-level inlet. `elevation_m` and `depth_m` seed simulation
/// node parameters when the inlet is added to a simulation selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inlet {
    pub id: String,
    pub location: LngLat,
    pub elevation_m: Option<f64>,
    pub depth_m: Option<f64>,
    /// Fraction of the grate blocked by debris, 0.0–1.0.
    pub clog_factor: Option<f64>,
    pub inlet_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlet {
    pub id: String,
    pub location: LngLat,
    pub invert_elevation_m: Option<f64>,
    pub outlet_type: Option<String>,
}

/// A storm drain (manhole / junction box).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drain {
    pub id: String,
    pub location: LngLat,
    pub elevation_m: Option<f64>,
    pub depth_m: Option<f64>,
    pub drain_type: Option<String>,
}

/// Any one drainage asset, as handed to detail panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Asset {
    Pipe(Pipe),
    Inlet(Inlet),
    Outlet(Outlet),
    Drain(Drain),
}

impl Asset {
    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Pipe(_) => AssetKind::Pipe,
            Asset::Inlet(_) => AssetKind::Inlet,
            Asset::Outlet(_) => AssetKind::Outlet,
            Asset::Drain(_) => AssetKind::Drain,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Asset::Pipe(p) => &p.id,
            Asset::Inlet(i) => &i.id,
            Asset::Outlet(o) => &o.id,
            Asset::Drain(d) => &d.id,
        }
    }

    /// The point a camera should focus on for this asset.
    ///
    /// Point assets return their location. Pipes return the middle vertex
    /// of their path, or `None` if the path is empty.
    pub fn representative_point(&self) -> Option<LngLat> {
        match self {
            Asset::Pipe(p) => p.path.get(p.path.len() / 2).copied(),
            Asset::Inlet(i) => Some(i.location),
            Asset::Outlet(o) => Some(o.location),
            Asset::Drain(d) => Some(d.location),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The one feature currently selected on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFeatureRef {
    pub id: String,
    pub kind: AssetKind,
    /// Map source/layer the feature is drawn in; together with `id` this
    /// addresses the feature's visual state in the map engine.
    pub layer: String,
}

// ---------------------------------------------------------------------------
// Simulation parameters
// ---------------------------------------------------------------------------

/// Hydraulic parameters for one node (inlet or drain) in a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeParams {
    pub invert_elevation: f64,
    pub initial_depth: f64,
    pub ponding_area: f64,
    pub surcharge_depth: f64,
}

/// Hydraulic parameters for one link (pipe) in a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkParams {
    pub initial_flow: f64,
    pub upstream_offset_depth: f64,
    pub downstream_offset_depth: f64,
    pub average_conduit_loss: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    InvertElevation,
    InitialDepth,
    PondingArea,
    SurchargeDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    InitialFlow,
    UpstreamOffsetDepth,
    DownstreamOffsetDepth,
    AverageConduitLoss,
}

impl NodeParams {
    pub fn set(&mut self, field: NodeField, value: f64) {
        match field {
            NodeField::InvertElevation => self.invert_elevation = value,
            NodeField::InitialDepth => self.initial_depth = value,
            NodeField::PondingArea => self.ponding_area = value,
            NodeField::SurchargeDepth => self.surcharge_depth = value,
        }
    }
}

impl LinkParams {
    pub fn set(&mut self, field: LinkField, value: f64) {
        match field {
            LinkField::InitialFlow => self.initial_flow = value,
            LinkField::UpstreamOffsetDepth => self.upstream_offset_depth = value,
            LinkField::DownstreamOffsetDepth => self.downstream_offset_depth = value,
            LinkField::AverageConduitLoss => self.average_conduit_loss = value,
        }
    }
}

/// Design storm applied to the whole simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RainfallParams {
    pub total_precipitation_mm: f64,
    pub duration_hours: f64,
}

impl Default for RainfallParams {
    fn default() -> Self {
        Self {
            total_precipitation_mm: 0.0,
            duration_hours: 1.0,
        }
    }
}

/// Per-entity parameters keyed by asset id. Ordered so that request
/// payloads serialize deterministically.
pub type ParameterCollection<T> = BTreeMap<String, T>;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    #[serde(untagged)]
    Unknown(String),
}

/// A point report filed by a resident (clogged inlet, flooding, ...).
///
/// `updated_at` is the logical time of the record; it decides which of two
/// copies of the same report wins regardless of arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub coordinates: LngLat,
    pub status: ReportStatus,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Rejections raised before a simulation request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No inlet or drain is selected; pipes and rainfall alone cannot run.
    NoComponentSelected,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NoComponentSelected => write!(f, "no component selected"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can arise when building or submitting a simulation request.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// The request was rejected locally; nothing was sent.
    Validation(ValidationError),
    /// Non-2xx HTTP response from the simulation service.
    Http { status: u16, message: String },
    /// The request never produced a response (connect, timeout, TLS).
    Transport(String),
    /// The service answered 2xx but the body was not JSON.
    Parse(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Validation(e) => write!(f, "Validation error: {}", e),
            SimulationError::Http { status, message } if message.is_empty() => {
                write!(f, "HTTP error: {}", status)
            }
            SimulationError::Http { status, message } => {
                write!(f, "HTTP error: {}: {}", status, message)
            }
            SimulationError::Transport(msg) => write!(f, "Request failed: {}", msg),
            SimulationError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SimulationError {
    fn from(e: ValidationError) -> Self {
        SimulationError::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
