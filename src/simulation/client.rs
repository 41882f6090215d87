/// Simulation service client
///
/// Posts assembled requests to the external hydraulic model and hands back
/// its JSON payload untouched. There is no retry here: a failed submission
/// is reported to the caller, and the parameter store is never touched, so
/// the user can resubmit without re-entering anything.

use std::time::Duration;

use crate::config::SimulationConfig;
use crate::logging::{self, Component};
use crate::model::SimulationError;
use crate::simulation::params::ParameterSnapshot;
use crate::simulation::request::{self, SimulationRequest};

// ============================================================================
// Transport
// ============================================================================

/// Sends one request and returns the service's success payload.
pub trait SimulationTransport {
    fn post(&self, request: &SimulationRequest) -> Result<serde_json::Value, SimulationError>;
}

/// HTTP transport backed by a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SimulationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SimulationTransport for HttpTransport {
    fn post(&self, request: &SimulationRequest) -> Result<serde_json::Value, SimulationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .map_err(|e| SimulationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: the body usually carries the model's error text.
            let message = response.text().unwrap_or_default();
            return Err(SimulationError::Http {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        response
            .json::<serde_json::Value>()
            .map_err(|e| SimulationError::Parse(e.to_string()))
    }
}

// ============================================================================
// Client
// ============================================================================

/// Outcome of a successful run: the opaque payload plus how long the
/// round trip took.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub payload: serde_json::Value,
    pub elapsed: Duration,
}

pub struct SimulationClient<'a> {
    transport: &'a dyn SimulationTransport,
}

impl<'a> SimulationClient<'a> {
    pub fn new(transport: &'a dyn SimulationTransport) -> Self {
        Self { transport }
    }

    /// Validates and submits a snapshot of the parameter store.
    ///
    /// Validation failures return before the transport is called.
    pub fn submit(
        &self,
        snapshot: &ParameterSnapshot,
    ) -> Result<SimulationOutcome, SimulationError> {
        let request = request::build_from_snapshot(snapshot).inspect_err(|e| {
            logging::log_simulation_failure("Simulation submit", e);
        })?;

        logging::info(
            Component::Simulation,
            None,
            &format!(
                "Submitting simulation: {} nodes, {} links, {} mm over {} h",
                request.nodes.len(),
                request.links.len(),
                request.rainfall.total_precipitation_mm,
                request.rainfall.duration_hours
            ),
        );

        let started = std::time::Instant::now();
        match self.transport.post(&request) {
            Ok(payload) => {
                let elapsed = started.elapsed();
                logging::info(
                    Component::Simulation,
                    None,
                    &format!("Simulation completed in {:.1}s", elapsed.as_secs_f64()),
                );
                Ok(SimulationOutcome { payload, elapsed })
            }
            Err(e) => {
                logging::log_simulation_failure("Simulation submit", &e);
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeParams, ParameterCollection, RainfallParams, ValidationError};
    use std::cell::RefCell;

    /// Records every request it is handed and answers with a canned result.
    struct StubTransport {
        calls: RefCell<Vec<SimulationRequest>>,
        reply: Result<serde_json::Value, SimulationError>,
    }

    impl StubTransport {
        fn answering(reply: Result<serde_json::Value, SimulationError>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    impl SimulationTransport for StubTransport {
        fn post(&self, request: &SimulationRequest) -> Result<serde_json::Value, SimulationError> {
            self.calls.borrow_mut().push(request.clone());
            self.reply.clone()
        }
    }

    fn snapshot_with_node() -> ParameterSnapshot {
        let mut nodes = ParameterCollection::new();
        nodes.insert("I-12".to_string(), NodeParams::default());
        ParameterSnapshot {
            nodes,
            links: ParameterCollection::new(),
            rainfall: RainfallParams::default(),
        }
    }

    #[test]
    fn test_empty_selection_never_reaches_transport() {
        let stub = StubTransport::answering(Ok(serde_json::json!({})));
        let client = SimulationClient::new(&stub);
        let empty = ParameterSnapshot {
            nodes: ParameterCollection::new(),
            links: ParameterCollection::new(),
            rainfall: RainfallParams::default(),
        };

        let err = client.submit(&empty).unwrap_err();
        assert_eq!(err, SimulationError::Validation(ValidationError::NoComponentSelected));
        assert_eq!(stub.calls.borrow().len(), 0, "transport must not be invoked");
    }

    #[test]
    fn test_success_payload_is_passed_through() {
        let payload = serde_json::json!({ "status": "ok", "floodedNodes": ["I-12"] });
        let stub = StubTransport::answering(Ok(payload.clone()));
        let client = SimulationClient::new(&stub);

        let outcome = client.submit(&snapshot_with_node()).expect("stub succeeds");
        assert_eq!(outcome.payload, payload);
        assert_eq!(stub.calls.borrow().len(), 1);
        assert!(stub.calls.borrow()[0].nodes.contains_key("I-12"));
    }

    #[test]
    fn test_service_error_is_not_retried() {
        let stub = StubTransport::answering(Err(SimulationError::Http {
            status: 503,
            message: "model busy".to_string(),
        }));
        let client = SimulationClient::new(&stub);

        let err = client.submit(&snapshot_with_node()).unwrap_err();
        assert!(matches!(err, SimulationError::Http { status: 503, .. }));
        assert_eq!(stub.calls.borrow().len(), 1, "exactly one attempt");
    }

    #[test]
    fn test_http_transport_uses_configured_endpoint() {
        let config = SimulationConfig {
            endpoint: "http://127.0.0.1:9/simulate".to_string(),
            timeout_secs: 1,
        };
        let transport = HttpTransport::new(&config).expect("client should build");
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9/simulate");
    }
}

// ---------------------------------------------------------------------------
// Integration Tests - Live Simulation Service
// ---------------------------------------------------------------------------
//
// Posts a one-node request to the endpoint named by STORMVIEW_SIMULATION_URL.
// Marked #[ignore] so CI doesn't depend on a running model server.
//
// To run manually:
//   STORMVIEW_SIMULATION_URL=http://localhost:8000/simulate \
//     cargo test -- --ignored simulation_api

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::SIMULATION_URL_ENV;
    use crate::model::{NodeParams, ParameterCollection, RainfallParams};

    #[test]
    #[ignore] // Don't run in CI - depends on external service
    fn simulation_api_accepts_single_node_request() {
        dotenv::dotenv().ok();
        let endpoint = std::env::var(SIMULATION_URL_ENV)
            .expect("set STORMVIEW_SIMULATION_URL to run this test");
        let config = SimulationConfig {
            endpoint,
            timeout_secs: 120,
        };
        let transport = HttpTransport::new(&config).expect("client should build");

        let mut nodes = ParameterCollection::new();
        nodes.insert(
            "TEST-NODE".to_string(),
            NodeParams {
                invert_elevation: 10.0,
                initial_depth: 0.5,
                ponding_area: 0.0,
                surcharge_depth: 0.0,
            },
        );
        let snapshot = ParameterSnapshot {
            nodes,
            links: ParameterCollection::new(),
            rainfall: RainfallParams {
                total_precipitation_mm: 25.0,
                duration_hours: 1.0,
            },
        };

        match SimulationClient::new(&transport).submit(&snapshot) {
            Ok(outcome) => {
                println!("✓ service answered in {:?}: {}", outcome.elapsed, outcome.payload)
            }
            Err(e) => panic!("simulation service check failed: {}", e),
        }
    }
}
