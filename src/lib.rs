//! Client-side core of the storm drainage viewer.
//!
//! Keeps the single map selection, the simulation parameter records and the
//! clustered report markers consistent while map clicks, multi-select
//! widgets, backend fetches and realtime pushes all mutate them. Rendering,
//! auth and persistence live in the host app and reach this crate through
//! the seams in `selection`, `ingest` and `simulation::client`.

pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod reports;
pub mod repository;
pub mod selection;
pub mod session;
pub mod simulation;

pub use session::ViewerSession;
