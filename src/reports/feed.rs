/// Report state fed by an initial fetch-all and a realtime push stream.
///
/// Both paths re-enter here synchronously when their I/O completes, in
/// whatever order the network delivers them. Each record carries an
/// `updated_at` logical time and the newer copy wins. On a tie the realtime
/// copy wins and the snapshot copy loses: a status-only push often carries
/// no `updated_at` of its own and falls back to `created_at`, so a slow
/// fetch-all row can share its timestamp while holding older content.
/// Updates replace in place by id; nothing is ever duplicated.

use std::collections::HashMap;

use crate::logging::{self, Component};
use crate::model::Report;
use crate::reports::cluster::ReportClusters;

/// A realtime change notification, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Insert(Report),
    Update(Report),
}

impl ReportEvent {
    pub fn report(&self) -> &Report {
        match self {
            ReportEvent::Insert(r) | ReportEvent::Update(r) => r,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Snapshot,
    Realtime,
}

#[derive(Debug, Default)]
pub struct ReportFeed {
    /// Display order: first-seen order.
    reports: Vec<Report>,
    position: HashMap<String, usize>,
    revision: u64,
    cached: Option<(u64, ReportClusters)>,
}

impl ReportFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn get(&self, id: &str) -> Option<&Report> {
        self.position.get(id).map(|&i| &self.reports[i])
    }

    /// Bumped every time the visible list changes. Renderers compare it to
    /// decide whether to redraw markers.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merges a fetch-all result. Returns how many records changed.
    pub fn apply_snapshot(&mut self, reports: Vec<Report>) -> usize {
        let mut changed = 0;
        for report in reports {
            if self.upsert(report, Source::Snapshot) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.revision += 1;
        }
        logging::debug(
            Component::Reports,
            None,
            &format!("snapshot applied: {} changed, {} total", changed, self.reports.len()),
        );
        changed
    }

    /// Applies one realtime event. Returns `true` if the list changed.
    ///
    /// Inserts and updates are treated alike: an insert for an id already
    /// present replaces it (newer wins), and an update for an id not yet seen
    /// inserts it, since the push can outrun the initial fetch.
    pub fn apply_event(&mut self, event: ReportEvent) -> bool {
        let report = match event {
            ReportEvent::Insert(r) | ReportEvent::Update(r) => r,
        };
        let id = report.id.clone();
        let changed = self.upsert(report, Source::Realtime);
        if changed {
            self.revision += 1;
        } else {
            logging::debug(Component::Reports, Some(&id), "ignored stale realtime event");
        }
        changed
    }

    /// Clusters for the current list, recomputed only when the revision moved.
    pub fn clusters(&mut self) -> &ReportClusters {
        let revision = self.revision;
        if self.cached.as_ref().is_some_and(|(rev, _)| *rev != revision) {
            self.cached = None;
        }
        let reports = &self.reports;
        &self
            .cached
            .get_or_insert_with(|| (revision, ReportClusters::build(reports)))
            .1
    }

    fn upsert(&mut self, incoming: Report, source: Source) -> bool {
        match self.position.get(&incoming.id) {
            Some(&i) => {
                let current = &mut self.reports[i];
                let newer = match source {
                    Source::Snapshot => incoming.updated_at > current.updated_at,
                    Source::Realtime => incoming.updated_at >= current.updated_at,
                };
                if !newer || *current == incoming {
                    return false;
                }
                *current = incoming;
                true
            }
            None => {
                self.position.insert(incoming.id.clone(), self.reports.len());
                self.reports.push(incoming);
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
