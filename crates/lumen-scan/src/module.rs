use std::sync::Arc;

use lumen_geom::{Aabb, BlockPos};

use crate::config::{ConfigError, LightScanSettings, ScanConfig};
use crate::coordinator::{OutcomeTally, PassSummary, ScanCoordinator};
use crate::pool::ScanPool;
use crate::render::BoxRenderer;
use crate::result_set::{ResultSet, ResultSetStats};
use crate::sampler::VolumeSampler;

/// Light-level highlighter with an explicit lifecycle.
///
/// The driver calls [`LightScan::start`] once, [`LightScan::tick`] once per
/// frame with the current view center, and [`LightScan::stop`] when done.
pub struct LightScan {
    settings: LightScanSettings,
    config: ScanConfig,
    sampler: Arc<dyn VolumeSampler>,
    results: Arc<ResultSet>,
    coordinator: ScanCoordinator,
    pool: Option<ScanPool>,
    active: bool,
    totals: OutcomeTally,
}

impl LightScan {
    pub fn new(
        settings: LightScanSettings,
        sampler: Arc<dyn VolumeSampler>,
    ) -> Result<Self, ConfigError> {
        let config = settings.validate()?;
        let results = Arc::new(ResultSet::new());
        let coordinator = ScanCoordinator::new(sampler.clone(), results.clone());
        Ok(Self {
            settings,
            config,
            sampler,
            results,
            coordinator,
            pool: None,
            active: false,
            totals: OutcomeTally::default(),
        })
    }

    pub fn start(&mut self) {
        if self.active {
            return;
        }
        if self.settings.threading {
            let workers = self.settings.pool_workers();
            match ScanPool::new(workers, self.sampler.clone(), self.results.clone()) {
                Ok(pool) => self.pool = Some(pool),
                Err(e) => {
                    log::warn!("scan pool unavailable ({}); scanning inline", e);
                    self.pool = None;
                }
            }
        }
        self.results.clear();
        self.totals = OutcomeTally::default();
        self.active = true;
        log::info!(
            "light scan started: radius={} y={}..={} min_light={} workers={}",
            self.config.tile_radius(),
            self.config.min_y(),
            self.config.max_y(),
            self.config.min_threshold(),
            self.pool.as_ref().map_or(0, ScanPool::workers)
        );
    }

    pub fn stop(&mut self) {
        if let Some(pool) = self.pool.take() {
            let (queued, inflight) = pool.queue_depths();
            log::debug!("dropping scan pool: queued={} inflight={}", queued, inflight);
        }
        self.results.clear();
        if self.active {
            log::info!("light scan stopped");
        }
        self.active = false;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Swap in new settings. The next pass uses them; a new pool size only
    /// takes effect on the next `start`.
    pub fn apply_settings(&mut self, settings: LightScanSettings) -> Result<(), ConfigError> {
        let config = settings.validate()?;
        if self.active && settings.thread_pool_size != self.settings.thread_pool_size {
            log::info!("thread_pool_size change applies on next start");
        }
        self.settings = settings;
        self.config = config;
        Ok(())
    }

    #[inline]
    pub fn settings(&self) -> &LightScanSettings {
        &self.settings
    }

    #[inline]
    pub fn config(&self) -> ScanConfig {
        self.config
    }

    #[inline]
    pub fn results(&self) -> Arc<ResultSet> {
        Arc::clone(&self.results)
    }

    pub fn stats(&self) -> ResultSetStats {
        self.results.stats()
    }

    #[inline]
    pub fn pool(&self) -> Option<&ScanPool> {
        self.pool.as_ref()
    }

    /// Outcomes observed since `start` (pooled outcomes are collected on tick).
    #[inline]
    pub fn totals(&self) -> OutcomeTally {
        self.totals
    }

    /// Fold finished pool outcomes into the running totals.
    pub fn collect_outcomes(&mut self) {
        if let Some(pool) = &self.pool {
            for outcome in pool.drain_outcomes() {
                self.totals.record(&outcome);
            }
        }
    }

    /// Run one pass around `center`, then draw the current result set.
    pub fn tick(
        &mut self,
        center: BlockPos,
        renderer: &mut dyn BoxRenderer,
    ) -> Option<PassSummary> {
        if !self.active {
            return None;
        }
        self.collect_outcomes();
        let pool = if self.settings.threading {
            self.pool.as_ref()
        } else {
            None
        };
        let summary = self.coordinator.run_pass(center.tile(), &self.config, pool);
        self.totals.merge(&summary.inline);
        self.draw(renderer);
        Some(summary)
    }

    /// Issue one box per highlighted coordinate. Returns the number drawn.
    pub fn draw(&self, renderer: &mut dyn BoxRenderer) -> usize {
        let snapshot = self.results.snapshot();
        let (fill, outline, mode) = (
            self.settings.side_color,
            self.settings.line_color,
            self.settings.shape_mode,
        );
        for pos in &snapshot {
            renderer.draw_box(Aabb::unit_at(*pos), fill, outline, mode);
        }
        snapshot.len()
    }
}

