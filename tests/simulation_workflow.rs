/// Integration tests for simulation mode
///
/// These tests verify:
/// 1. Multi-select changes seed, keep, and discard node parameters
/// 2. Edits survive while selected and are gone after a deselect/reselect
/// 3. Submission validates before any network call
/// 4. A failed submission leaves every parameter as the user left it
///
/// Everything runs against a stub transport; no model server is needed.
///
/// Run with: cargo test --test simulation_workflow

use std::cell::RefCell;
use std::sync::Arc;

use stormview::config::ViewerConfig;
use stormview::ingest::assets;
use stormview::model::{
    LinkField, NodeField, NodeParams, RainfallParams, SimulationError, ValidationError,
};
use stormview::simulation::{SimulationRequest, SimulationTransport};
use stormview::ViewerSession;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const INLETS: &str = r#"{ "type": "FeatureCollection", "features": [
    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [123.8912, 10.3107] },
      "properties": { "inlet_id": "I-12", "elevation": 14.2, "depth": 1.1 } },
    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [123.8920, 10.3111] },
      "properties": { "inlet_id": "I-13", "elevation": 13.9 } }
] }"#;

const DRAINS: &str = r#"{ "type": "FeatureCollection", "features": [
    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [123.8931, 10.3120] },
      "properties": { "drain_id": "SD-4", "elevation": 12.5, "depth": 2.4 } }
] }"#;

const PIPES: &str = r#"{ "type": "FeatureCollection", "features": [
    { "type": "Feature",
      "geometry": { "type": "LineString",
                    "coordinates": [[123.8912, 10.3107], [123.8931, 10.3120]] },
      "properties": { "pipe_id": "P-100", "diameter": 0.6 } }
] }"#;

const EMPTY: &str = r#"{ "type": "FeatureCollection", "features": [] }"#;

fn session() -> ViewerSession {
    let repo = assets::load_repository(PIPES, INLETS, EMPTY, DRAINS)
        .expect("fixture feeds are valid");
    let config = ViewerConfig::from_toml_str(
        r#"
        [rainfall]
        total_precipitation_mm = 50.0
        duration_hours = 1.0
        "#,
    )
    .expect("fixture config is valid");
    ViewerSession::new(&config, Arc::new(repo))
}

struct RecordingTransport {
    calls: RefCell<Vec<SimulationRequest>>,
    reply: Result<serde_json::Value, SimulationError>,
}

impl RecordingTransport {
    fn new(reply: Result<serde_json::Value, SimulationError>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            reply,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl SimulationTransport for RecordingTransport {
    fn post(&self, request: &SimulationRequest) -> Result<serde_json::Value, SimulationError> {
        self.calls.borrow_mut().push(request.clone());
        self.reply.clone()
    }
}

// ---------------------------------------------------------------------------
// Parameter lifecycle
// ---------------------------------------------------------------------------

#[test]
fn test_inlet_select_edit_deselect_reselect_cycle() {
    let mut s = session();

    s.on_node_select(&["I-12"]);
    assert_eq!(
        s.parameters().node_params()["I-12"],
        NodeParams {
            invert_elevation: 14.2,
            initial_depth: 1.1,
            ponding_area: 0.0,
            surcharge_depth: 0.0,
        }
    );

    assert!(s.on_node_edit("I-12", NodeField::PondingArea, 5.0));
    assert_eq!(s.parameters().node_params()["I-12"].ponding_area, 5.0);

    s.on_node_select::<&str>(&[]);
    assert!(
        s.parameters().node_params().get("I-12").is_none(),
        "entry must be removed on deselect"
    );

    s.on_node_select(&["I-12"]);
    assert_eq!(
        s.parameters().node_params()["I-12"].ponding_area,
        0.0,
        "reselect must restore seeded defaults, not the prior edit"
    );
    assert_eq!(s.parameters().node_params()["I-12"].invert_elevation, 14.2);
}

#[test]
fn test_add_three_remove_one_in_single_change() {
    let mut s = session();
    s.on_node_select(&["I-12"]);
    s.on_node_edit("I-12", NodeField::SurchargeDepth, 0.3);

    s.on_node_select(&["I-13", "SD-4", "UNMAPPED"]);

    let keys: Vec<&str> = s.parameters().node_params().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["I-13", "SD-4", "UNMAPPED"]);
    assert_eq!(s.parameters().node_params()["SD-4"].initial_depth, 2.4);
    assert_eq!(s.parameters().node_params()["I-13"].initial_depth, 0.0);
    assert_eq!(s.parameters().node_params()["UNMAPPED"], NodeParams::default());
}

#[test]
fn test_trailing_edit_after_deselect_is_ignored() {
    let mut s = session();
    s.on_pipe_select(&["P-100"]);
    s.on_pipe_select::<&str>(&[]);
    assert!(!s.on_pipe_edit("P-100", LinkField::InitialFlow, 2.0));
    assert!(s.parameters().pipe_params().is_empty());
}

#[test]
fn test_reset_returns_to_configured_storm() {
    let mut s = session();
    s.on_node_select(&["I-12", "SD-4"]);
    s.on_pipe_select(&["P-100"]);
    s.on_rainfall_change(RainfallParams {
        total_precipitation_mm: 180.0,
        duration_hours: 24.0,
    });

    s.reset_simulation();

    let p = s.parameters();
    assert!(p.node_selection().is_empty() && p.node_params().is_empty());
    assert!(p.pipe_selection().is_empty() && p.pipe_params().is_empty());
    assert_eq!(
        p.rainfall(),
        RainfallParams {
            total_precipitation_mm: 50.0,
            duration_hours: 1.0,
        }
    );
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[test]
fn test_pipes_and_rainfall_alone_are_rejected_without_network_call() {
    let mut s = session();
    s.on_pipe_select(&["P-100"]);
    let transport = RecordingTransport::new(Ok(serde_json::json!({ "ok": true })));

    let err = s.submit_simulation(&transport).unwrap_err();

    assert_eq!(err, SimulationError::Validation(ValidationError::NoComponentSelected));
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_submitted_request_passes_ids_and_rainfall_through() {
    let mut s = session();
    s.on_node_select(&["I-12", "SD-4"]);
    s.on_pipe_select(&["P-100"]);
    s.on_pipe_edit("P-100", LinkField::UpstreamOffsetDepth, 0.15);
    let storm = RainfallParams {
        total_precipitation_mm: 85.0,
        duration_hours: 3.0,
    };
    s.on_rainfall_change(storm);

    let transport = RecordingTransport::new(Ok(serde_json::json!({ "runId": "abc" })));
    let outcome = s.submit_simulation(&transport).expect("stub succeeds");

    assert_eq!(outcome.payload["runId"], "abc");
    let calls = transport.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].nodes.contains_key("I-12") && calls[0].nodes.contains_key("SD-4"));
    assert_eq!(calls[0].links["P-100"].upstream_offset_depth, 0.15);
    assert_eq!(calls[0].rainfall, storm);
}

#[test]
fn test_failed_submission_leaves_parameters_untouched() {
    let mut s = session();
    s.on_node_select(&["I-12"]);
    s.on_node_edit("I-12", NodeField::PondingArea, 12.0);
    s.on_pipe_select(&["P-100"]);
    let before = s.parameters().snapshot();

    let transport = RecordingTransport::new(Err(SimulationError::Http {
        status: 500,
        message: "solver diverged".to_string(),
    }));
    let err = s.submit_simulation(&transport).unwrap_err();

    assert!(err.to_string().contains("solver diverged"));
    assert_eq!(s.parameters().snapshot(), before);
    assert_eq!(transport.call_count(), 1, "no automatic retry");
}
