/// Exact-coordinate clustering of point reports, and the sibling-bubble
/// registry that keeps at most one detail bubble open per coordinate.
///
/// Two reports belong to the same cluster only if their coordinates are
/// equal to the stored precision. No tolerance or snapping is applied, so
/// two GPS fixes of the same inlet that differ in the last digit form two
/// clusters.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::model::{LngLat, Report};

// ---------------------------------------------------------------------------
// Coordinate key
// ---------------------------------------------------------------------------

/// Stable serialization of a `[lon, lat]` pair.
///
/// Uses Rust's shortest round-trip float formatting, so two keys are equal
/// exactly when both components are bit-for-bit the same value (with the
/// usual float caveat that `0.0` and `-0.0` differ here).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey(String);

impl CoordinateKey {
    pub fn of(p: LngLat) -> Self {
        CoordinateKey(format!("{},{}", p.lon, p.lat))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub count: usize,
    /// Report ids in input order.
    pub member_ids: Vec<String>,
}

/// Groups reports by exact coordinate. Idempotent; recomputing over the
/// same list yields the same map.
pub fn cluster(reports: &[Report]) -> BTreeMap<CoordinateKey, ClusterInfo> {
    let mut clusters: BTreeMap<CoordinateKey, ClusterInfo> = BTreeMap::new();
    for report in reports {
        let entry = clusters
            .entry(CoordinateKey::of(report.coordinates))
            .or_insert_with(|| ClusterInfo {
                count: 0,
                member_ids: Vec::new(),
            });
        entry.count += 1;
        entry.member_ids.push(report.id.clone());
    }
    clusters
}

/// Clusters plus a per-report index, which is what the marker layer needs
/// when it renders one report at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportClusters {
    clusters: BTreeMap<CoordinateKey, ClusterInfo>,
    key_of: HashMap<String, CoordinateKey>,
}

impl ReportClusters {
    pub fn build(reports: &[Report]) -> Self {
        let key_of = reports
            .iter()
            .map(|r| (r.id.clone(), CoordinateKey::of(r.coordinates)))
            .collect();
        Self {
            clusters: cluster(reports),
            key_of,
        }
    }

    pub fn clusters(&self) -> &BTreeMap<CoordinateKey, ClusterInfo> {
        &self.clusters
    }

    pub fn key_of(&self, report_id: &str) -> Option<&CoordinateKey> {
        self.key_of.get(report_id)
    }

    /// Number of reports sharing this report's coordinate (itself included).
    /// Zero for an unknown report id.
    pub fn cluster_size(&self, report_id: &str) -> usize {
        self.key_of(report_id)
            .and_then(|k| self.clusters.get(k))
            .map_or(0, |c| c.count)
    }

    /// Other reports at this report's coordinate.
    pub fn siblings(&self, report_id: &str) -> Vec<&str> {
        self.key_of(report_id)
            .and_then(|k| self.clusters.get(k))
            .map(|c| {
                c.member_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| *id != report_id)
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Bubble registry
// ---------------------------------------------------------------------------

/// Opaque handle for one mounted detail bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BubbleHandle(u64);

#[derive(Debug)]
struct BubbleEntry {
    report_id: String,
    key: CoordinateKey,
    open: bool,
}

/// Tracks mounted bubbles by the report they show and that report's current
/// coordinate key. Opening one closes its open siblings at the same key and
/// nothing else; bubbles never hold references to each other.
///
/// Keys go stale when a report moves, so the owner must call `rekey` after
/// every change to the report list.
#[derive(Debug, Default)]
pub struct BubbleRegistry {
    next: u64,
    entries: HashMap<BubbleHandle, BubbleEntry>,
}

impl BubbleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts a bubble for `report_id`, currently at `key`. New bubbles
    /// start closed.
    pub fn register(&mut self, report_id: &str, key: CoordinateKey) -> BubbleHandle {
        let handle = BubbleHandle(self.next);
        self.next += 1;
        self.entries.insert(
            handle,
            BubbleEntry {
                report_id: report_id.to_string(),
                key,
                open: false,
            },
        );
        handle
    }

    /// Re-resolves every bubble's key from its report id. Bubbles whose
    /// report is unknown to `key_for` keep their last key. Returns how many
    /// bubbles changed group.
    pub fn rekey<F>(&mut self, key_for: F) -> usize
    where
        F: Fn(&str) -> Option<CoordinateKey>,
    {
        let mut moved = 0;
        for entry in self.entries.values_mut() {
            if let Some(key) = key_for(&entry.report_id) {
                if key != entry.key {
                    entry.key = key;
                    moved += 1;
                }
            }
        }
        moved
    }

    /// Leaves the group. Unknown handles are ignored.
    pub fn unregister(&mut self, handle: BubbleHandle) {
        self.entries.remove(&handle);
    }

    /// Opens `handle` and returns the siblings that were closed as a result,
    /// in handle order. An unregistered handle opens nothing and closes nothing.
    pub fn open(&mut self, handle: BubbleHandle) -> Vec<BubbleHandle> {
        let Some(key) = self.entries.get(&handle).map(|e| e.key.clone()) else {
            return Vec::new();
        };

        let mut closed: Vec<BubbleHandle> = self
            .entries
            .iter_mut()
            .filter(|(h, e)| **h != handle && e.open && e.key == key)
            .map(|(h, e)| {
                e.open = false;
                *h
            })
            .collect();
        closed.sort();

        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.open = true;
        }
        closed
    }

    pub fn close(&mut self, handle: BubbleHandle) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.open = false;
        }
    }

    pub fn is_open(&self, handle: BubbleHandle) -> bool {
        self.entries.get(&handle).is_some_and(|e| e.open)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
