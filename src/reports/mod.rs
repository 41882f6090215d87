/// Resident reports shown as markers on the map.
///
/// Submodules:
/// - `cluster`: groups reports sharing an exact coordinate and keeps one
///   detail bubble open per coordinate.
/// - `feed`: merges fetch-all results and realtime pushes by logical time.

pub mod cluster;
pub mod feed;

pub use cluster::{BubbleHandle, BubbleRegistry, ClusterInfo, CoordinateKey, ReportClusters};
pub use feed::{ReportEvent, ReportFeed};
