//! Bounded-volume light scan with incremental per-tile refresh.
//!
//! A [`ScanCoordinator`] walks the tiles around a center, a scan job samples
//! each tile through a [`VolumeSampler`] and reconciles its matches into the
//! shared [`ResultSet`], and [`LightScan`] ties this to a start/tick/stop
//! lifecycle that draws the result through a [`BoxRenderer`].
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
pub mod module;
pub mod pool;
pub mod render;
pub mod result_set;
pub mod sampler;
pub mod scanner;

pub use config::{ConfigError, LightScanSettings, ScanConfig, load_settings_from_path};
pub use coordinator::{OutcomeTally, PassSummary, ScanCoordinator, tiles_in_radius};
pub use module::LightScan;
pub use pool::ScanPool;
pub use render::{BoxRenderer, Rgba, ShapeMode};
pub use result_set::{Reconciled, ResultSet, ResultSetStats};
pub use sampler::{FnSampler, VolumeSampler};
pub use scanner::{TileJob, TileOutcome, TileScan, run_job, scan_tile};

pub use lumen_geom::{Aabb, BlockPos, TILE_SIZE, TileKey};

#[cfg(test)]
mod tests;
