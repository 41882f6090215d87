/// Simulation mode: per-entity hydraulic inputs and dispatch to the
/// external model service.
///
/// Submodules:
/// - `params`: node/pipe parameter records synchronized with the
///   multi-select lists, plus the shared rainfall record.
/// - `request`: validates and assembles the service's wire format.
/// - `client`: transport seam and the blocking HTTP implementation.

pub mod client;
pub mod params;
pub mod request;

pub use client::{HttpTransport, SimulationClient, SimulationOutcome, SimulationTransport};
pub use params::{ParameterSnapshot, SimulationParameterStore};
pub use request::{SimulationRequest, build};
