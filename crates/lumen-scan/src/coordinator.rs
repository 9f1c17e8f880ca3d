use std::sync::Arc;

use lumen_geom::TileKey;

use crate::config::ScanConfig;
use crate::pool::ScanPool;
use crate::result_set::ResultSet;
use crate::sampler::VolumeSampler;
use crate::scanner::{TileJob, TileOutcome, run_job};

/// Tiles within Chebyshev distance `radius` of `center`, row-major.
pub fn tiles_in_radius(center: TileKey, radius: i32) -> impl Iterator<Item = TileKey> {
    let r = radius.max(0);
    (-r..=r).flat_map(move |dx| (-r..=r).map(move |dz| center.offset(dx, dz)))
}

/// Running count of tile outcomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub reconciled: u64,
    pub not_ready: u64,
    pub unavailable: u64,
    pub discarded: u64,
    pub failed: u64,
    pub added: u64,
    pub removed: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: &TileOutcome) {
        match *outcome {
            TileOutcome::Reconciled { added, removed, .. } => {
                self.reconciled += 1;
                self.added += added as u64;
                self.removed += removed as u64;
            }
            TileOutcome::NotReady { .. } => self.not_ready += 1,
            TileOutcome::Unavailable { .. } => self.unavailable += 1,
            TileOutcome::Discarded { .. } => self.discarded += 1,
            TileOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeTally) {
        self.reconciled += other.reconciled;
        self.not_ready += other.not_ready;
        self.unavailable += other.unavailable;
        self.discarded += other.discarded;
        self.failed += other.failed;
        self.added += other.added;
        self.removed += other.removed;
    }

    #[inline]
    pub fn skipped(&self) -> u64 {
        self.not_ready + self.unavailable + self.failed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSummary {
    pub pass: u64,
    pub center: TileKey,
    pub tiles: usize,
    /// Coordinates dropped because their tile left the scan radius.
    pub pruned: usize,
    /// Jobs went to the worker pool; their outcomes arrive later.
    pub pooled: bool,
    /// Outcomes of jobs that ran on the calling thread.
    pub inline: OutcomeTally,
}

/// Dispatches one scan job per in-scope tile.
pub struct ScanCoordinator {
    sampler: Arc<dyn VolumeSampler>,
    results: Arc<ResultSet>,
    passes: u64,
}

impl ScanCoordinator {
    pub fn new(sampler: Arc<dyn VolumeSampler>, results: Arc<ResultSet>) -> Self {
        Self {
            sampler,
            results,
            passes: 0,
        }
    }

    #[inline]
    pub fn results(&self) -> &Arc<ResultSet> {
        &self.results
    }

    #[inline]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one pass around `center`. With a pool the jobs are queued and this
    /// returns immediately; without one every tile is scanned before return.
    /// Tiles that cannot be scanned keep their previous entries; tiles outside
    /// the radius are pruned first.
    pub fn run_pass(
        &mut self,
        center: TileKey,
        cfg: &ScanConfig,
        pool: Option<&ScanPool>,
    ) -> PassSummary {
        self.passes += 1;
        let pass = self.passes;
        let generation = self.results.generation();
        let pruned = self.results.retain_within(center, cfg.tile_radius());
        let mut summary = PassSummary {
            pass,
            center,
            tiles: 0,
            pruned,
            pooled: false,
            inline: OutcomeTally::default(),
        };
        for tile in tiles_in_radius(center, cfg.tile_radius()) {
            let job = TileJob {
                tile,
                config: *cfg,
                generation,
                pass,
            };
            summary.tiles += 1;
            let queued = pool.is_some_and(|p| p.submit(job));
            if queued {
                summary.pooled = true;
            } else {
                let outcome = run_job(&job, self.sampler.as_ref(), self.results.as_ref());
                summary.inline.record(&outcome);
            }
        }
        log::debug!(
            target: "scan",
            "[pass {}] center={} tiles={} pruned={} pooled={} reconciled={} skipped={}",
            pass,
            center,
            summary.tiles,
            summary.pruned,
            summary.pooled,
            summary.inline.reconciled,
            summary.inline.skipped()
        );
        summary
    }
}
