use super::*;
use hashbrown::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

/// Sampler backed by an editable map; unset coordinates read `base`.
struct GridSampler {
    base: u8,
    values: RwLock<HashMap<BlockPos, u8>>,
    not_ready: RwLock<HashSet<TileKey>>,
}

impl GridSampler {
    fn new(base: u8) -> Self {
        Self {
            base,
            values: RwLock::new(HashMap::new()),
            not_ready: RwLock::new(HashSet::new()),
        }
    }

    fn set(&self, pos: BlockPos, level: u8) {
        self.values.write().unwrap().insert(pos, level);
    }

    fn block_tile(&self, tile: TileKey) {
        self.not_ready.write().unwrap().insert(tile);
    }
}

impl VolumeSampler for GridSampler {
    fn is_tile_ready(&self, tile: TileKey) -> bool {
        !self.not_ready.read().unwrap().contains(&tile)
    }

    fn sample_at(&self, pos: BlockPos) -> Option<u8> {
        Some(*self.values.read().unwrap().get(&pos).unwrap_or(&self.base))
    }
}

#[derive(Default)]
struct Recorder {
    boxes: Vec<(Aabb, Rgba, Rgba, ShapeMode)>,
}

impl BoxRenderer for Recorder {
    fn draw_box(&mut self, aabb: Aabb, fill: Rgba, outline: Rgba, mode: ShapeMode) {
        self.boxes.push((aabb, fill, outline, mode));
    }
}

fn single_layer(threshold: u8) -> ScanConfig {
    ScanConfig::new(1, 0, 0, threshold).unwrap()
}

fn matches_of(scan: TileScan) -> HashSet<BlockPos> {
    match scan {
        TileScan::Matches(m) => m,
        other => panic!("expected matches, got {other:?}"),
    }
}

fn inline_settings(radius: i32) -> LightScanSettings {
    LightScanSettings {
        chunk_radius: radius,
        min_y: 0,
        max_y: 3,
        min_light_level: 10,
        threading: false,
        ..LightScanSettings::default()
    }
}

#[test]
fn single_bright_block_in_layer() {
    let sampler = GridSampler::new(5);
    sampler.set(BlockPos::new(0, 0, 0), 12);
    let got = matches_of(scan_tile(TileKey::new(0, 0), &single_layer(10), &sampler));
    let want: HashSet<BlockPos> = [BlockPos::new(0, 0, 0)].into_iter().collect();
    assert_eq!(got, want);
}

#[test]
fn threshold_is_inclusive() {
    let sampler = GridSampler::new(0);
    sampler.set(BlockPos::new(3, 0, 4), 10);
    sampler.set(BlockPos::new(4, 0, 4), 9);
    let got = matches_of(scan_tile(TileKey::new(0, 0), &single_layer(10), &sampler));
    assert!(got.contains(&BlockPos::new(3, 0, 4)));
    assert!(!got.contains(&BlockPos::new(4, 0, 4)));
}

#[test]
fn y_range_is_inclusive_on_both_ends() {
    let sampler = GridSampler::new(0);
    for y in [-2, 2, -3, 3] {
        sampler.set(BlockPos::new(1, y, 1), 15);
    }
    let cfg = ScanConfig::new(1, -2, 2, 1).unwrap();
    let got = matches_of(scan_tile(TileKey::new(0, 0), &cfg, &sampler));
    assert!(got.contains(&BlockPos::new(1, -2, 1)));
    assert!(got.contains(&BlockPos::new(1, 2, 1)));
    assert!(!got.contains(&BlockPos::new(1, -3, 1)));
    assert!(!got.contains(&BlockPos::new(1, 3, 1)));
}

#[test]
fn full_tile_samples_every_column() {
    let sampler = GridSampler::new(15);
    let cfg = ScanConfig::new(1, 10, 12, 0).unwrap();
    let got = matches_of(scan_tile(TileKey::new(-2, 5), &cfg, &sampler));
    assert_eq!(got.len(), cfg.samples_per_tile());
    assert!(got.iter().all(|p| TileKey::new(-2, 5).contains(*p)));
}

#[test]
fn empty_y_range_rejected() {
    let err = ScanConfig::new(1, 10, 9, 5).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyYRange { min_y: 10, max_y: 9 }));
}

#[test]
fn zero_radius_rejected() {
    assert!(matches!(
        ScanConfig::new(0, 0, 0, 0),
        Err(ConfigError::OutOfRange { field: "tile_radius", .. })
    ));
}

#[test]
fn y_bounds_outside_world_rejected() {
    assert!(matches!(
        ScanConfig::new(1, i32::MIN, i32::MAX, 0),
        Err(ConfigError::OutOfRange { field: "min_y", .. })
    ));
    assert!(matches!(
        ScanConfig::new(1, 0, 320, 0),
        Err(ConfigError::OutOfRange { field: "max_y", value: 320, .. })
    ));
    let full = ScanConfig::new(1, -64, 319, 0).unwrap();
    assert_eq!(full.samples_per_tile(), 16 * 16 * 384);
}

#[test]
fn not_ready_tile_is_skipped_and_keeps_entries() {
    let sampler = GridSampler::new(0);
    let tile = TileKey::new(0, 0);
    sampler.set(BlockPos::new(2, 0, 2), 15);
    let results = ResultSet::new();
    let job = TileJob {
        tile,
        config: single_layer(10),
        generation: results.generation(),
        pass: 1,
    };
    assert!(matches!(run_job(&job, &sampler, &results), TileOutcome::Reconciled { added: 1, .. }));

    sampler.block_tile(tile);
    sampler.set(BlockPos::new(2, 0, 2), 0);
    for _ in 0..3 {
        assert_eq!(run_job(&job, &sampler, &results), TileOutcome::NotReady { tile });
    }
    assert!(results.contains(BlockPos::new(2, 0, 2)));
}

#[test]
fn never_ready_tile_stays_empty() {
    let sampler = GridSampler::new(15);
    let tile = TileKey::new(4, 4);
    sampler.block_tile(tile);
    let results = ResultSet::new();
    let job = TileJob {
        tile,
        config: single_layer(1),
        generation: results.generation(),
        pass: 1,
    };
    for _ in 0..5 {
        run_job(&job, &sampler, &results);
    }
    assert!(results.tile_snapshot(tile).is_empty());
    assert!(results.is_empty());
}

#[test]
fn unavailable_sample_skips_whole_tile() {
    let sampler = FnSampler::always_ready(|p: BlockPos| if p.x == 7 && p.z == 7 { None } else { Some(15) });
    let results = ResultSet::new();
    let job = TileJob {
        tile: TileKey::new(0, 0),
        config: single_layer(1),
        generation: results.generation(),
        pass: 1,
    };
    let outcome = run_job(&job, &sampler, &results);
    assert!(matches!(outcome, TileOutcome::Unavailable { at, .. } if at == BlockPos::new(7, 0, 7)));
    assert!(results.is_empty());
}

#[test]
fn rescan_drops_dimmed_block_and_leaves_neighbors() {
    let sampler = GridSampler::new(0);
    let a = BlockPos::new(1, 0, 1);
    let b = BlockPos::new(17, 0, 1);
    sampler.set(a, 12);
    sampler.set(b, 12);
    let results = ResultSet::new();
    let cfg = single_layer(10);
    for tile in [TileKey::new(0, 0), TileKey::new(1, 0)] {
        let job = TileJob { tile, config: cfg, generation: results.generation(), pass: 1 };
        run_job(&job, &sampler, &results);
    }
    assert_eq!(results.len(), 2);

    sampler.set(a, 3);
    let job = TileJob { tile: TileKey::new(0, 0), config: cfg, generation: results.generation(), pass: 2 };
    let outcome = run_job(&job, &sampler, &results);
    assert_eq!(
        outcome,
        TileOutcome::Reconciled { tile: TileKey::new(0, 0), matches: 0, added: 0, removed: 1 }
    );
    assert!(!results.contains(a));
    assert!(results.contains(b));
    assert_eq!(results.tile_count(), 1);
}

#[test]
fn reconcile_after_clear_is_discarded() {
    let results = ResultSet::new();
    let stale_gen = results.generation();
    results.clear();
    let fresh: HashSet<BlockPos> = [BlockPos::new(0, 0, 0)].into_iter().collect();
    assert_eq!(results.reconcile(TileKey::new(0, 0), fresh, stale_gen), None);
    assert!(results.is_empty());
    assert_eq!(results.stats().discarded, 1);
}

#[test]
fn radius_one_covers_nine_tiles() {
    let tiles: HashSet<TileKey> = tiles_in_radius(TileKey::new(0, 0), 1).collect();
    assert_eq!(tiles.len(), 9);
    for tx in -1..=1 {
        for tz in -1..=1 {
            assert!(tiles.contains(&TileKey::new(tx, tz)));
        }
    }
}

#[test]
fn inline_pass_scans_each_tile_once() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(GridSampler::new(0));
    let results = Arc::new(ResultSet::new());
    let mut coord = ScanCoordinator::new(sampler, results.clone());
    let summary = coord.run_pass(TileKey::new(0, 0), &single_layer(1), None);
    assert_eq!(summary.tiles, 9);
    assert!(!summary.pooled);
    assert_eq!(summary.inline.reconciled, 9);
    assert_eq!(coord.passes(), 1);
}

#[test]
fn moving_center_prunes_tiles_left_behind() {
    let grid = GridSampler::new(0);
    let near = BlockPos::new(3, 0, 3);
    let far = BlockPos::new(-20, 0, 5);
    grid.set(near, 14);
    grid.set(far, 14);
    let sampler: Arc<dyn VolumeSampler> = Arc::new(grid);
    let results = Arc::new(ResultSet::new());
    let mut coord = ScanCoordinator::new(sampler, results.clone());
    let cfg = single_layer(10);

    coord.run_pass(TileKey::new(0, 0), &cfg, None);
    assert!(results.contains(near));
    assert!(results.contains(far));

    let summary = coord.run_pass(TileKey::new(1, 0), &cfg, None);
    assert_eq!(summary.pruned, 1);
    assert!(results.contains(near));
    assert!(!results.contains(far));
    assert_eq!(results.stats().pruned, 1);
}

#[test]
fn default_settings_match_documented_values() {
    let s = LightScanSettings::default();
    assert_eq!(s.chunk_radius, 4);
    assert_eq!((s.min_y, s.max_y), (-63, 319));
    assert_eq!(s.min_light_level, 5);
    assert!(s.threading);
    assert_eq!(s.thread_pool_size, 4);
    assert_eq!(s.side_color, Rgba::new(255, 255, 0, 60));
    assert_eq!(s.line_color, Rgba::new(255, 255, 0, 200));
    assert_eq!(s.shape_mode, ShapeMode::Both);
    let cfg = s.validate().unwrap();
    assert_eq!(cfg.tiles_per_pass(), 81);
}

#[test]
fn settings_parse_from_toml() {
    let s = LightScanSettings::from_toml_str(
        r#"
chunk_radius = 2
min_y = 0
max_y = 64
shape_mode = "lines"
side_color = [10, 20, 30, 40]
"#,
    )
    .unwrap();
    assert_eq!(s.chunk_radius, 2);
    assert_eq!(s.max_y, 64);
    assert_eq!(s.shape_mode, ShapeMode::Lines);
    assert_eq!(s.side_color, Rgba::new(10, 20, 30, 40));
    assert_eq!(s.min_light_level, 5);
}

#[test]
fn settings_reject_out_of_range_and_unknown_keys() {
    assert!(matches!(
        LightScanSettings::from_toml_str("chunk_radius = 13"),
        Err(ConfigError::OutOfRange { field: "chunk_radius", value: 13, .. })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("min_light_level = 16"),
        Err(ConfigError::OutOfRange { field: "min_light_level", .. })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("thread_pool_size = 9"),
        Err(ConfigError::OutOfRange { field: "thread_pool_size", .. })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("min_y = 100\nmax_y = 50"),
        Err(ConfigError::EmptyYRange { .. })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("min_y = -65"),
        Err(ConfigError::OutOfRange { field: "min_y", value: -65, min: -64, max: 319 })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("max_y = 320"),
        Err(ConfigError::OutOfRange { field: "max_y", value: 320, min: -64, max: 319 })
    ));
    assert!(matches!(
        LightScanSettings::from_toml_str("radius = 3"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn settings_round_trip_through_toml() {
    let s = LightScanSettings {
        shape_mode: ShapeMode::Sides,
        ..LightScanSettings::default()
    };
    let text = toml::to_string(&s).unwrap();
    assert_eq!(LightScanSettings::from_toml_str(&text).unwrap(), s);
}

#[test]
fn missing_settings_file_reports_path() {
    let err = load_settings_from_path(std::path::Path::new("/nonexistent/lumen.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/lumen.toml"));
}

#[test]
fn inactive_module_does_nothing() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(GridSampler::new(15));
    let mut module = LightScan::new(inline_settings(1), sampler).unwrap();
    let mut rec = Recorder::default();
    assert!(module.tick(BlockPos::new(0, 0, 0), &mut rec).is_none());
    assert!(rec.boxes.is_empty());
    assert!(module.results().is_empty());
}

#[test]
fn inline_tick_draws_every_match_with_configured_style() {
    let grid = Arc::new(GridSampler::new(0));
    grid.set(BlockPos::new(5, 1, 5), 14);
    grid.set(BlockPos::new(-5, 3, 20), 10);
    grid.set(BlockPos::new(-5, 4, 20), 15);
    let mut settings = inline_settings(1);
    settings.shape_mode = ShapeMode::Lines;
    let mut module = LightScan::new(settings.clone(), grid.clone()).unwrap();
    module.start();
    assert!(module.pool().is_none());

    let mut rec = Recorder::default();
    let summary = module.tick(BlockPos::new(8, 64, 8), &mut rec).unwrap();
    assert_eq!(summary.tiles, 9);
    assert_eq!(rec.boxes.len(), 2);
    for (aabb, fill, outline, mode) in &rec.boxes {
        assert_eq!(aabb.size(), lumen_geom::Vec3::ONE);
        assert_eq!(*fill, settings.side_color);
        assert_eq!(*outline, settings.line_color);
        assert_eq!(*mode, ShapeMode::Lines);
    }
    assert_eq!(module.totals().reconciled, 9);
}

#[test]
fn stop_clears_results() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(GridSampler::new(15));
    let mut module = LightScan::new(inline_settings(1), sampler).unwrap();
    module.start();
    module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default());
    assert!(!module.results().is_empty());
    assert_eq!(module.stats().entries, 9 * 16 * 16 * 4);
    module.stop();
    assert!(!module.is_active());
    assert!(module.results().is_empty());
    assert_eq!(module.stats().generation, 2);
}

#[test]
fn invalid_settings_keep_previous() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(GridSampler::new(0));
    let mut module = LightScan::new(inline_settings(2), sampler).unwrap();
    let bad = LightScanSettings {
        min_y: 10,
        max_y: 0,
        ..inline_settings(3)
    };
    assert!(module.apply_settings(bad).is_err());
    assert_eq!(module.config().tile_radius(), 2);
    module.apply_settings(inline_settings(3)).unwrap();
    assert_eq!(module.config().tile_radius(), 3);
}

#[test]
fn pooled_pass_converges_to_inline_result() {
    let grid = Arc::new(GridSampler::new(0));
    for i in 0..40 {
        grid.set(BlockPos::new(i * 2 - 40, i % 4, 40 - i * 2), 11 + (i % 5) as u8);
    }
    let mut threaded = inline_settings(3);
    threaded.threading = true;
    threaded.thread_pool_size = 3;

    let mut pooled = LightScan::new(threaded, grid.clone()).unwrap();
    pooled.start();
    assert_eq!(pooled.pool().map(ScanPool::workers), Some(3));
    let summary = pooled.tick(BlockPos::new(0, 0, 0), &mut Recorder::default()).unwrap();
    assert!(summary.pooled);
    assert!(pooled.pool().unwrap().wait_idle(Duration::from_secs(10)));

    let mut inline = LightScan::new(inline_settings(3), grid).unwrap();
    inline.start();
    inline.tick(BlockPos::new(0, 0, 0), &mut Recorder::default());

    let mut a = pooled.results().snapshot();
    let mut b = inline.results().snapshot();
    a.sort();
    b.sort();
    assert_eq!(a, b);
    assert_eq!(a.len(), 40);

    pooled.collect_outcomes();
    assert_eq!(pooled.totals().reconciled, 49);
}

#[test]
fn threading_disabled_while_active_runs_inline() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(GridSampler::new(15));
    let mut settings = inline_settings(1);
    settings.threading = true;
    let mut module = LightScan::new(settings.clone(), sampler).unwrap();
    module.start();
    assert!(module.pool().is_some());
    settings.threading = false;
    module.apply_settings(settings).unwrap();
    let summary = module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default()).unwrap();
    assert!(!summary.pooled);
    assert_eq!(summary.inline.reconciled, 9);
}

/// Full-bright everywhere except column x = 20, where reading panics.
fn bright_with_broken_column(p: BlockPos) -> Option<u8> {
    if p.x == 20 {
        panic!("corrupt column at {p}");
    }
    Some(15)
}

#[test]
fn panicking_sampler_fails_only_its_tiles_in_pool() {
    let sampler: Arc<dyn VolumeSampler> =
        Arc::new(FnSampler::always_ready(bright_with_broken_column));
    let mut settings = inline_settings(1);
    settings.threading = true;
    settings.thread_pool_size = 2;
    let mut module = LightScan::new(settings, sampler).unwrap();
    module.start();
    let summary = module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default()).unwrap();
    assert!(summary.pooled);
    let pool = module.pool().unwrap();
    assert!(pool.wait_idle(Duration::from_secs(10)));
    assert_eq!(pool.queue_depths(), (0, 0));

    module.collect_outcomes();
    let totals = module.totals();
    // x = 20 lies in the tx = 1 column: three tiles fail, six reconcile.
    assert_eq!(totals.failed, 3);
    assert_eq!(totals.reconciled, 6);
    assert_eq!(module.results().tile_count(), 6);
    assert!(module.results().contains(BlockPos::new(0, 0, 0)));
    assert!(!module.results().contains(BlockPos::new(21, 0, 0)));

    // Workers survive and keep scanning on the next pass.
    module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default());
    assert!(module.pool().unwrap().wait_idle(Duration::from_secs(10)));
    module.collect_outcomes();
    assert_eq!(module.totals().reconciled, 12);
}

#[test]
fn panicking_sampler_fails_only_its_tiles_inline() {
    let sampler: Arc<dyn VolumeSampler> =
        Arc::new(FnSampler::always_ready(bright_with_broken_column));
    let mut module = LightScan::new(inline_settings(1), sampler).unwrap();
    module.start();
    let summary = module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default()).unwrap();
    assert_eq!(summary.inline.failed, 3);
    assert_eq!(summary.inline.reconciled, 6);
    assert_eq!(summary.inline.skipped(), 3);
}

/// Sampler that stalls on readiness checks so jobs are still queued at stop.
struct SlowSampler;

impl VolumeSampler for SlowSampler {
    fn is_tile_ready(&self, _tile: TileKey) -> bool {
        thread::sleep(Duration::from_millis(15));
        true
    }

    fn sample_at(&self, _pos: BlockPos) -> Option<u8> {
        Some(15)
    }
}

#[test]
fn old_pool_tasks_do_not_survive_restart() {
    let sampler: Arc<dyn VolumeSampler> = Arc::new(SlowSampler);
    let mut settings = inline_settings(2);
    settings.threading = true;
    settings.thread_pool_size = 2;
    let mut module = LightScan::new(settings.clone(), sampler).unwrap();
    module.start();
    let summary = module.tick(BlockPos::new(0, 0, 0), &mut Recorder::default()).unwrap();
    assert!(summary.pooled);
    module.stop();
    assert!(module.pool().is_none());

    settings.thread_pool_size = 5;
    module.apply_settings(settings).unwrap();
    module.start();
    assert_eq!(module.pool().map(ScanPool::workers), Some(5));

    // Let any job of the first pool that was mid-scan finish.
    thread::sleep(Duration::from_millis(200));
    assert!(module.results().is_empty());
    assert!(module.pool().unwrap().is_idle());
}
