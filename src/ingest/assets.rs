/// GeoJSON asset feed decoding
///
/// Each asset kind arrives as its own FeatureCollection with a
/// kind-specific id property:
///
/// | kind   | id property | geometry                          |
/// |--------|-------------|-----------------------------------|
/// | pipe   | `pipe_id`   | LineString / MultiLineString (1st)|
/// | inlet  | `inlet_id`  | Point                             |
/// | outlet | `outlet_id` | Point                             |
/// | drain  | `drain_id`  | Point                             |
///
/// Numeric ids are stringified. Features without a usable id or geometry are
/// skipped and counted, not fatal.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ingest::IngestError;
use crate::logging::{self, Component};
use crate::model::{Drain, Inlet, LngLat, Outlet, Pipe};
use crate::repository::EntityRepository;

pub const PIPE_ID_FIELD: &str = "pipe_id";
pub const INLET_ID_FIELD: &str = "inlet_id";
pub const OUTLET_ID_FIELD: &str = "outlet_id";
pub const DRAIN_ID_FIELD: &str = "drain_id";

// ============================================================================
// GeoJSON Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Positions are kept as `Vec<f64>` so 3D coordinates (`[lon, lat, z]`)
/// decode too; only the first two components are used.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Vec<f64> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Unsupported,
}

/// Decoded records of one kind plus how many features were dropped.
#[derive(Debug)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

// ============================================================================
// Property helpers
// ============================================================================

fn position(raw: &[f64]) -> Option<LngLat> {
    match raw {
        [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(LngLat::new(*lon, *lat)),
        _ => None,
    }
}

fn point(geometry: Option<&Geometry>) -> Option<LngLat> {
    match geometry? {
        Geometry::Point { coordinates } => position(coordinates),
        _ => None,
    }
}

fn path(geometry: Option<&Geometry>) -> Option<Vec<LngLat>> {
    let raw = match geometry? {
        Geometry::LineString { coordinates } => coordinates,
        Geometry::MultiLineString { coordinates } => coordinates.first()?,
        _ => return None,
    };
    let path: Option<Vec<LngLat>> = raw.iter().map(|p| position(p)).collect();
    path.filter(|p| p.len() >= 2)
}

/// Reads an id property; accepts strings and numbers.
fn id(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a numeric property; numeric strings (common in shapefile exports)
/// are accepted too.
fn number(props: &Map<String, Value>, key: &str) -> Option<f64> {
    match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Decoders
// ============================================================================

fn decode<T>(
    json: &str,
    what: &str,
    convert: impl Fn(&Feature, &Map<String, Value>) -> Option<T>,
) -> Result<Loaded<T>, IngestError> {
    let collection: FeatureCollection = serde_json::from_str(json)
        .map_err(|e| IngestError::ParseError(format!("{}: {}", what, e)))?;

    let empty = Map::new();
    let mut items = Vec::with_capacity(collection.features.len());
    let mut skipped = 0;
    for feature in &collection.features {
        let props = feature.properties.as_ref().unwrap_or(&empty);
        match convert(feature, props) {
            Some(item) => items.push(item),
            None => skipped += 1,
        }
    }

    logging::log_load_summary(Component::Assets, what, items.len(), skipped);
    Ok(Loaded { items, skipped })
}

pub fn parse_pipes(json: &str) -> Result<Loaded<Pipe>, IngestError> {
    decode(json, "pipes", |f, props| {
        Some(Pipe {
            id: id(props, PIPE_ID_FIELD)?,
            path: path(f.geometry.as_ref())?,
            diameter_m: number(props, "diameter"),
            length_m: number(props, "length"),
            roughness: number(props, "roughness"),
            upstream_node: text(props, "from_node"),
            downstream_node: text(props, "to_node"),
        })
    })
}

pub fn parse_inlets(json: &str) -> Result<Loaded<Inlet>, IngestError> {
    decode(json, "inlets", |f, props| {
        Some(Inlet {
            id: id(props, INLET_ID_FIELD)?,
            location: point(f.geometry.as_ref())?,
            elevation_m: number(props, "elevation"),
            depth_m: number(props, "depth"),
            clog_factor: number(props, "clog_factor"),
            inlet_type: text(props, "type"),
        })
    })
}

pub fn parse_outlets(json: &str) -> Result<Loaded<Outlet>, IngestError> {
    decode(json, "outlets", |f, props| {
        Some(Outlet {
            id: id(props, OUTLET_ID_FIELD)?,
            location: point(f.geometry.as_ref())?,
            invert_elevation_m: number(props, "invert_elevation"),
            outlet_type: text(props, "type"),
        })
    })
}

pub fn parse_drains(json: &str) -> Result<Loaded<Drain>, IngestError> {
    decode(json, "drains", |f, props| {
        Some(Drain {
            id: id(props, DRAIN_ID_FIELD)?,
            location: point(f.geometry.as_ref())?,
            elevation_m: number(props, "elevation"),
            depth_m: number(props, "depth"),
            drain_type: text(props, "type"),
        })
    })
}

/// Decodes all four collections into a repository. Any collection that
/// isn't a FeatureCollection fails the whole load.
pub fn load_repository(
    pipes: &str,
    inlets: &str,
    outlets: &str,
    drains: &str,
) -> Result<EntityRepository, IngestError> {
    Ok(EntityRepository::new(
        parse_pipes(pipes)?.items,
        parse_inlets(inlets)?.items,
        parse_outlets(outlets)?.items,
        parse_drains(drains)?.items,
    ))
}

// ============================================================================
// Tests
// ============================================================================
