use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use hashbrown::HashSet;
use lumen_geom::{BlockPos, TILE_SIZE, TileKey};

use crate::config::ScanConfig;
use crate::result_set::ResultSet;
use crate::sampler::VolumeSampler;

/// Result of sampling one tile, before reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TileScan {
    Matches(HashSet<BlockPos>),
    NotReady,
    /// The sampler could not answer for this coordinate; the tile is skipped.
    Unavailable(BlockPos),
}

/// Collect every coordinate of `tile` within the configured y range whose
/// light level is at least the threshold.
pub fn scan_tile(tile: TileKey, cfg: &ScanConfig, sampler: &dyn VolumeSampler) -> TileScan {
    if !sampler.is_tile_ready(tile) {
        return TileScan::NotReady;
    }
    let (ox, oz) = tile.origin();
    let threshold = cfg.min_threshold();
    let mut matches = HashSet::new();
    for dx in 0..TILE_SIZE {
        for dz in 0..TILE_SIZE {
            for y in cfg.y_span() {
                let pos = BlockPos::new(ox + dx, y, oz + dz);
                match sampler.sample_at(pos) {
                    Some(level) if level >= threshold => {
                        matches.insert(pos);
                    }
                    Some(_) => {}
                    None => return TileScan::Unavailable(pos),
                }
            }
        }
    }
    TileScan::Matches(matches)
}

/// One unit of work: scan a tile and fold it into the result set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileJob {
    pub tile: TileKey,
    pub config: ScanConfig,
    /// Result-set generation observed when the job was created.
    pub generation: u64,
    pub pass: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileOutcome {
    Reconciled {
        tile: TileKey,
        matches: usize,
        added: usize,
        removed: usize,
    },
    NotReady {
        tile: TileKey,
    },
    Unavailable {
        tile: TileKey,
        at: BlockPos,
    },
    /// Result set was cleared while the job was pending.
    Discarded {
        tile: TileKey,
    },
    /// The sampler panicked; the tile keeps its previous entries.
    Failed {
        tile: TileKey,
    },
}

/// Scan `job.tile` and reconcile it. A panicking sampler only fails this
/// tile; the panic does not reach the caller or the worker thread.
pub fn run_job(job: &TileJob, sampler: &dyn VolumeSampler, results: &ResultSet) -> TileOutcome {
    let tile = job.tile;
    let scan = match panic::catch_unwind(AssertUnwindSafe(|| {
        scan_tile(tile, &job.config, sampler)
    })) {
        Ok(scan) => scan,
        Err(payload) => {
            log::warn!(
                target: "scan",
                "[pass {}] tile {} sampler panicked: {}",
                job.pass,
                tile,
                panic_message(payload.as_ref())
            );
            return TileOutcome::Failed { tile };
        }
    };
    match scan {
        TileScan::NotReady => {
            log::trace!(target: "scan", "[pass {}] tile {} not ready", job.pass, tile);
            TileOutcome::NotReady { tile }
        }
        TileScan::Unavailable(at) => {
            log::trace!(target: "scan", "[pass {}] tile {} unavailable at {}", job.pass, tile, at);
            TileOutcome::Unavailable { tile, at }
        }
        TileScan::Matches(fresh) => {
            let matches = fresh.len();
            match results.reconcile(tile, fresh, job.generation) {
                Some(delta) => TileOutcome::Reconciled {
                    tile,
                    matches,
                    added: delta.added,
                    removed: delta.removed,
                },
                None => TileOutcome::Discarded { tile },
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string payload"
    }
}
