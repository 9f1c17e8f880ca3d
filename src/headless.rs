use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lumen_scan::{
    Aabb, BlockPos, BoxRenderer, LightScan, LightScanSettings, Rgba, ShapeMode, VolumeSampler,
};

use crate::noise_field::NoiseLightField;
use crate::settings_watch::SettingsWatcher;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Renderer that only counts what it would draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawTally {
    pub boxes: usize,
    pub fills: usize,
    pub outlines: usize,
}

impl BoxRenderer for DrawTally {
    fn draw_box(&mut self, _aabb: Aabb, _fill: Rgba, _outline: Rgba, mode: ShapeMode) {
        self.boxes += 1;
        if mode.draws_sides() {
            self.fills += 1;
        }
        if mode.draws_lines() {
            self.outlines += 1;
        }
    }
}

pub struct HeadlessRun {
    pub ticks: u32,
    pub step: i32,
    pub start: BlockPos,
}

/// Walk the center along +x, one pass per tick. Waits for the pool between
/// ticks so every tick reports a settled result set; returns the settled
/// draw of the last tick.
pub fn run(
    run: &HeadlessRun,
    settings: LightScanSettings,
    field: Arc<NoiseLightField>,
    watcher: Option<&SettingsWatcher>,
) -> Result<DrawTally, Box<dyn Error>> {
    let sampler: Arc<dyn VolumeSampler> = field.clone();
    let mut module = LightScan::new(settings, sampler)?;
    module.start();

    let mut center = run.start;
    let mut last = DrawTally::default();
    for tick in 0..run.ticks {
        if let Some(w) = watcher {
            w.apply_pending(&mut module);
        }
        field.advance(center.tile());

        let t0 = Instant::now();
        let mut frame = DrawTally::default();
        let Some(summary) = module.tick(center, &mut frame) else {
            break;
        };
        if let Some(pool) = module.pool() {
            if !pool.wait_idle(IDLE_TIMEOUT) {
                let (queued, inflight) = pool.queue_depths();
                log::warn!("pool still busy: queued={} inflight={}", queued, inflight);
            }
        }
        let scan_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;

        // The frame drawn during the tick may predate pooled reconciles.
        let mut settled = DrawTally::default();
        module.draw(&mut settled);
        let stats = module.stats();
        log::info!(
            target: "scan",
            "[tick {}] center={} tile={} tiles={} pruned={} frame={} settled={} entries={} scan_ms={}",
            tick,
            center,
            summary.center,
            summary.tiles,
            summary.pruned,
            frame.boxes,
            settled.boxes,
            stats.entries,
            scan_ms
        );
        last = settled;
        center.x += run.step;
    }

    module.collect_outcomes();
    let totals = module.totals();
    let stats = module.stats();
    log::info!(
        "done: reconciled={} skipped={} discarded={} added={} removed={} entries={} tiles={}",
        totals.reconciled,
        totals.skipped(),
        totals.discarded,
        stats.added,
        stats.removed,
        stats.entries,
        stats.tiles
    );
    module.stop();
    Ok(last)
}
