/// Per-entity simulation parameters kept in lock-step with the node and
/// pipe multi-select lists.
///
/// Every selection change runs one reconciliation pass: ids that left the
/// list lose their entry, ids that joined get a freshly seeded entry, and
/// ids that stayed keep whatever the user typed. The pass completes inside a
/// single `&mut self` call, so no reader ever sees a keyset that disagrees
/// with its selection list.

use std::collections::HashSet;

use crate::logging::{self, Component};
use crate::model::{
    LinkField, LinkParams, NodeField, NodeParams, ParameterCollection, RainfallParams,
};
use crate::repository::EntityRepository;

/// Owned copy of everything a simulation request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub nodes: ParameterCollection<NodeParams>,
    pub links: ParameterCollection<LinkParams>,
    pub rainfall: RainfallParams,
}

#[derive(Debug, Default)]
pub struct SimulationParameterStore {
    node_selection: Vec<String>,
    pipe_selection: Vec<String>,
    node_params: ParameterCollection<NodeParams>,
    pipe_params: ParameterCollection<LinkParams>,
    rainfall: RainfallParams,
    default_rainfall: RainfallParams,
}

impl SimulationParameterStore {
    pub fn new(default_rainfall: RainfallParams) -> Self {
        Self {
            rainfall: default_rainfall,
            default_rainfall,
            ..Self::default()
        }
    }

    pub fn node_selection(&self) -> &[String] {
        &self.node_selection
    }

    pub fn pipe_selection(&self) -> &[String] {
        &self.pipe_selection
    }

    pub fn node_params(&self) -> &ParameterCollection<NodeParams> {
        &self.node_params
    }

    pub fn pipe_params(&self) -> &ParameterCollection<LinkParams> {
        &self.pipe_params
    }

    pub fn rainfall(&self) -> RainfallParams {
        self.rainfall
    }

    /// Replaces the node selection, seeding entries for new ids from the
    /// matching inlet (or, failing that, drain) and dropping entries for
    /// removed ids.
    pub fn set_node_selection<S: AsRef<str>>(&mut self, ids: &[S], repo: &EntityRepository) {
        let (added, removed) =
            reconcile(&mut self.node_selection, &mut self.node_params, ids, |id| {
                seed_node(id, repo)
            });
        log_reconcile("node", added, removed);
    }

    /// Replaces the pipe selection. New pipes always start at zero.
    pub fn set_pipe_selection<S: AsRef<str>>(&mut self, ids: &[S]) {
        let (added, removed) = reconcile(&mut self.pipe_selection, &mut self.pipe_params, ids, |_| {
            LinkParams::default()
        });
        log_reconcile("pipe", added, removed);
    }

    /// Edits one field of one selected node. Returns `false` and changes
    /// nothing if `id` is not selected (a trailing edit from a torn-down
    /// form row).
    pub fn update_node_param(&mut self, id: &str, field: NodeField, value: f64) -> bool {
        match self.node_params.get_mut(id) {
            Some(params) => {
                params.set(field, value);
                true
            }
            None => {
                logging::debug(Component::Simulation, Some(id), "ignored edit for deselected node");
                false
            }
        }
    }

    pub fn update_pipe_param(&mut self, id: &str, field: LinkField, value: f64) -> bool {
        match self.pipe_params.get_mut(id) {
            Some(params) => {
                params.set(field, value);
                true
            }
            None => {
                logging::debug(Component::Simulation, Some(id), "ignored edit for deselected pipe");
                false
            }
        }
    }

    pub fn set_rainfall(&mut self, params: RainfallParams) {
        self.rainfall = params;
    }

    /// Back to an empty session with the configured default storm.
    pub fn reset(&mut self) {
        *self = Self::new(self.default_rainfall);
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            nodes: self.node_params.clone(),
            links: self.pipe_params.clone(),
            rainfall: self.rainfall,
        }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Brings `params`' keyset in line with `ids` and replaces `selection`.
/// Duplicate ids keep their first position. Returns (added, removed).
fn reconcile<S, T, F>(
    selection: &mut Vec<String>,
    params: &mut ParameterCollection<T>,
    ids: &[S],
    mut seed: F,
) -> (usize, usize)
where
    S: AsRef<str>,
    F: FnMut(&str) -> T,
{
    let mut next: Vec<String> = Vec::with_capacity(ids.len());
    let mut wanted: HashSet<&str> = HashSet::with_capacity(ids.len());
    for id in ids {
        let id = id.as_ref();
        if wanted.insert(id) {
            next.push(id.to_string());
        }
    }

    let before = params.len();
    params.retain(|id, _| wanted.contains(id.as_str()));
    let removed = before - params.len();

    let mut added = 0;
    for id in &next {
        if !params.contains_key(id) {
            params.insert(id.clone(), seed(id.as_str()));
            added += 1;
        }
    }

    *selection = next;
    (added, removed)
}

fn seed_node(id: &str, repo: &EntityRepository) -> NodeParams {
    let known = repo
        .find_inlet(id)
        .map(|i| (i.elevation_m, i.depth_m))
        .or_else(|| repo.find_drain(id).map(|d| (d.elevation_m, d.depth_m)));

    match known {
        Some((elevation, depth)) => NodeParams {
            invert_elevation: elevation.unwrap_or(0.0),
            initial_depth: depth.unwrap_or(0.0),
            ..NodeParams::default()
        },
        None => {
            logging::debug(
                Component::Simulation,
                Some(id),
                "no inlet or drain with this id; node parameters default to zero",
            );
            NodeParams::default()
        }
    }
}

fn log_reconcile(what: &str, added: usize, removed: usize) {
    if added > 0 || removed > 0 {
        logging::debug(
            Component::Simulation,
            None,
            &format!("{} selection: +{} -{}", what, added, removed),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
