/// Wire format for the external hydraulic simulation service.
///
/// ```json
/// {
///   "nodes":    { "<id>": { "invertElevation": 14.2, "initialDepth": 1.1,
///                           "pondingArea": 0.0, "surchargeDepth": 0.0 } },
///   "links":    { "<id>": { "initialFlow": 0.0, "upstreamOffsetDepth": 0.0,
///                           "downstreamOffsetDepth": 0.0, "averageConduitLoss": 0.0 } },
///   "rainfall": { "totalPrecipitationMm": 50.0, "durationHours": 1.0 }
/// }
/// ```
///
/// Ids are passed through exactly as the user selected them.

use serde::Serialize;

use crate::model::{
    LinkParams, NodeParams, ParameterCollection, RainfallParams, SimulationError, ValidationError,
};
use crate::simulation::params::ParameterSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationRequest {
    pub nodes: ParameterCollection<NodeParams>,
    pub links: ParameterCollection<LinkParams>,
    pub rainfall: RainfallParams,
}

impl SimulationRequest {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| SimulationError::Parse(e.to_string()))
    }
}

/// Assembles a request, rejecting it before any I/O if no node is selected.
/// Pipes and rainfall alone are not a runnable model.
pub fn build(
    nodes: &ParameterCollection<NodeParams>,
    links: &ParameterCollection<LinkParams>,
    rainfall: &RainfallParams,
) -> Result<SimulationRequest, SimulationError> {
    if nodes.is_empty() {
        return Err(ValidationError::NoComponentSelected.into());
    }

    Ok(SimulationRequest {
        nodes: nodes.clone(),
        links: links.clone(),
        rainfall: *rainfall,
    })
}

pub fn build_from_snapshot(
    snapshot: &ParameterSnapshot,
) -> Result<SimulationRequest, SimulationError> {
    build(&snapshot.nodes, &snapshot.links, &snapshot.rainfall)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
