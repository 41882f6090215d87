/// Event glue for one viewer session.
///
/// Every UI event handler and every completed fetch calls exactly one method
/// here. Each method runs to completion without suspending, so the
/// components' invariants hold between any two events. The only I/O is
/// `submit_simulation`, which works from an owned snapshot of the parameters.

use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::logging::{self, Component};
use crate::model::{
    AssetKind, LinkField, NodeField, RainfallParams, Report, SelectedFeatureRef, SimulationError,
};
use crate::reports::{
    BubbleHandle, BubbleRegistry, CoordinateKey, ReportClusters, ReportEvent, ReportFeed,
};
use crate::repository::EntityRepository;
use crate::selection::{FeatureSelectionController, FeatureStateSink, MapHit, SelectionView};
use crate::simulation::{
    SimulationClient, SimulationOutcome, SimulationParameterStore, SimulationTransport,
};

pub struct ViewerSession {
    repo: Arc<EntityRepository>,
    selection: FeatureSelectionController,
    params: SimulationParameterStore,
    reports: ReportFeed,
    bubbles: BubbleRegistry,
}

impl ViewerSession {
    pub fn new(config: &ViewerConfig, repo: Arc<EntityRepository>) -> Self {
        logging::info(
            Component::System,
            None,
            &format!(
                "Session started: {} pipes, {} inlets, {} outlets, {} drains",
                repo.count(AssetKind::Pipe),
                repo.count(AssetKind::Inlet),
                repo.count(AssetKind::Outlet),
                repo.count(AssetKind::Drain)
            ),
        );
        Self {
            repo,
            selection: FeatureSelectionController::new(config.layers.clone()),
            params: SimulationParameterStore::new(config.rainfall.into()),
            reports: ReportFeed::new(),
            bubbles: BubbleRegistry::new(),
        }
    }

    pub fn repository(&self) -> &EntityRepository {
        &self.repo
    }

    pub fn parameters(&self) -> &SimulationParameterStore {
        &self.params
    }

    pub fn report_feed(&self) -> &ReportFeed {
        &self.reports
    }

    pub fn bubbles(&self) -> &BubbleRegistry {
        &self.bubbles
    }

    // -- control panel ------------------------------------------------------

    pub fn selection(&self) -> Option<&SelectedFeatureRef> {
        self.selection.selection()
    }

    pub fn on_map_click(
        &mut self,
        hit: Option<&MapHit>,
        map: &mut dyn FeatureStateSink,
    ) -> Option<SelectionView> {
        self.selection.handle_click(hit, &self.repo, map)
    }

    /// Programmatic selection, e.g. from a search box or asset list.
    pub fn select(
        &mut self,
        kind: AssetKind,
        id: &str,
        map: &mut dyn FeatureStateSink,
    ) -> Option<SelectionView> {
        self.selection.select_feature(kind, id, &self.repo, map)
    }

    pub fn clear_selection(&mut self, map: &mut dyn FeatureStateSink) {
        self.selection.clear_selection(map);
    }

    /// Leaving the map view drops the selection along with its highlight.
    pub fn leave_view(&mut self, map: &mut dyn FeatureStateSink) {
        self.selection.clear_selection(map);
    }

    // -- simulation mode ----------------------------------------------------

    pub fn on_node_select<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.params.set_node_selection(ids, &self.repo);
    }

    pub fn on_pipe_select<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.params.set_pipe_selection(ids);
    }

    pub fn on_node_edit(&mut self, id: &str, field: NodeField, value: f64) -> bool {
        self.params.update_node_param(id, field, value)
    }

    pub fn on_pipe_edit(&mut self, id: &str, field: LinkField, value: f64) -> bool {
        self.params.update_pipe_param(id, field, value)
    }

    pub fn on_rainfall_change(&mut self, rainfall: RainfallParams) {
        self.params.set_rainfall(rainfall);
    }

    pub fn reset_simulation(&mut self) {
        self.params.reset();
    }

    /// Submits the current parameters. Success or failure, the parameter
    /// store is left exactly as it was.
    pub fn submit_simulation(
        &self,
        transport: &dyn SimulationTransport,
    ) -> Result<SimulationOutcome, SimulationError> {
        SimulationClient::new(transport).submit(&self.params.snapshot())
    }

    // -- reports --------------------------------------------------------------

    pub fn on_reports_fetched(&mut self, reports: Vec<Report>) -> usize {
        let changed = self.reports.apply_snapshot(reports);
        if changed > 0 {
            self.rekey_bubbles();
        }
        changed
    }

    pub fn on_report_event(&mut self, event: ReportEvent) -> bool {
        let id = event.report().id.clone();
        let changed = self.reports.apply_event(event);
        if changed {
            logging::debug(Component::Reports, Some(&id), "realtime change applied");
            self.rekey_bubbles();
        }
        changed
    }

    pub fn report_clusters(&mut self) -> &ReportClusters {
        self.reports.clusters()
    }

    /// Mounts a detail bubble for a report. Returns `None` for an unknown
    /// report id.
    pub fn mount_bubble(&mut self, report_id: &str) -> Option<BubbleHandle> {
        let key = self
            .reports
            .get(report_id)
            .map(|r| CoordinateKey::of(r.coordinates))?;
        Some(self.bubbles.register(report_id, key))
    }

    pub fn unmount_bubble(&mut self, handle: BubbleHandle) {
        self.bubbles.unregister(handle);
    }

    /// Opens a bubble and returns the siblings it closed.
    pub fn open_bubble(&mut self, handle: BubbleHandle) -> Vec<BubbleHandle> {
        self.bubbles.open(handle)
    }

    pub fn close_bubble(&mut self, handle: BubbleHandle) {
        self.bubbles.close(handle);
    }

    /// Mounted bubbles follow their report when it moves.
    fn rekey_bubbles(&mut self) {
        let feed = &self.reports;
        let moved = self
            .bubbles
            .rekey(|id| feed.get(id).map(|r| CoordinateKey::of(r.coordinates)));
        if moved > 0 {
            logging::debug(
                Component::Reports,
                None,
                &format!("{} bubble(s) moved to a new coordinate", moved),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Inlet, LngLat};

    struct NullMap;

    impl FeatureStateSink for NullMap {
        fn set_selected(&mut self, _layer: &str, _feature_id: &str, _selected: bool) {}
    }

    fn session() -> ViewerSession {
        let repo = EntityRepository::new(
            vec![],
            vec![Inlet {
                id: "I-12".to_string(),
                location: LngLat::new(123.89, 10.31),
                elevation_m: Some(14.2),
                depth_m: Some(1.1),
                clog_factor: None,
                inlet_type: None,
            }],
            vec![],
            vec![],
        );
        ViewerSession::new(&ViewerConfig::default(), Arc::new(repo))
    }

    #[test]
    fn test_leave_view_drops_selection() {
        let mut s = session();
        let mut map = NullMap;
        assert!(s.select(AssetKind::Inlet, "I-12", &mut map).is_some());
        s.leave_view(&mut map);
        assert!(s.selection().is_none());
    }

    #[test]
    fn test_selection_and_simulation_state_are_independent() {
        let mut s = session();
        let mut map = NullMap;
        s.on_node_select(&["I-12"]);
        s.select(AssetKind::Inlet, "I-12", &mut map);
        s.clear_selection(&mut map);
        assert!(s.parameters().node_params().contains_key("I-12"));
    }

    #[test]
    fn test_bubble_for_unknown_report_is_not_mounted() {
        let mut s = session();
        assert!(s.mount_bubble("nope").is_none());
        assert!(s.bubbles().is_empty());
    }
}
