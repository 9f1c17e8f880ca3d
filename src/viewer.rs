use std::error::Error;
use std::sync::Arc;

use lumen_scan::{BlockPos, LightScanSettings};

use crate::noise_field::NoiseLightField;
use crate::settings_watch::SettingsWatcher;

#[cfg(feature = "viewer")]
pub fn run(
    settings: LightScanSettings,
    field: Arc<NoiseLightField>,
    watcher: Option<&SettingsWatcher>,
    start: BlockPos,
) -> Result<(), Box<dyn Error>> {
    use lumen_render_raylib::{RaylibBoxRenderer, conv, draw_tile_bounds};
    use lumen_scan::{LightScan, VolumeSampler, tiles_in_radius};
    use raylib::prelude::*;

    const MOVE_SPEED: f32 = 24.0;
    // Camera sits behind and above the scan center.
    const EYE_OFFSET: (f32, f32, f32) = (-28.0, 36.0, -28.0);
    let eye = |t: Vector3| Vector3::new(t.x + EYE_OFFSET.0, t.y + EYE_OFFSET.1, t.z + EYE_OFFSET.2);

    let sampler: Arc<dyn VolumeSampler> = field.clone();
    let mut module = LightScan::new(settings, sampler)?;
    module.start();

    let (mut rl, thread) = raylib::init()
        .size(1280, 720)
        .title("Lumen: light-level scan")
        .build();
    rl.set_target_fps(60);

    let target = Vector3::new(start.x as f32, start.y as f32, start.z as f32);
    let mut camera = Camera3D::perspective(
        eye(target),
        target,
        Vector3::new(0.0, 1.0, 0.0),
        55.0,
    );

    while !rl.window_should_close() {
        if let Some(w) = watcher {
            w.apply_pending(&mut module);
        }
        if rl.is_key_pressed(KeyboardKey::KEY_SPACE) {
            if module.is_active() {
                module.stop();
            } else {
                module.start();
            }
        }

        let held = |a: KeyboardKey, b: KeyboardKey| rl.is_key_down(a) || rl.is_key_down(b);
        let axis = |pos: bool, neg: bool| (pos as i32 - neg as i32) as f32;
        let dx = axis(
            held(KeyboardKey::KEY_A, KeyboardKey::KEY_LEFT),
            held(KeyboardKey::KEY_D, KeyboardKey::KEY_RIGHT),
        );
        let dz = axis(
            held(KeyboardKey::KEY_W, KeyboardKey::KEY_UP),
            held(KeyboardKey::KEY_S, KeyboardKey::KEY_DOWN),
        );
        let dy = axis(
            rl.is_key_down(KeyboardKey::KEY_E),
            rl.is_key_down(KeyboardKey::KEY_Q),
        );
        let k = MOVE_SPEED * rl.get_frame_time();
        camera.target = Vector3::new(
            camera.target.x + dx * k,
            camera.target.y + dy * k,
            camera.target.z + dz * k,
        );
        camera.position = eye(camera.target);

        let look = conv::vec3_from_rl(camera.target);
        let center = BlockPos::new(
            look.x.floor() as i32,
            look.y.floor() as i32,
            look.z.floor() as i32,
        );
        field.advance(center.tile());
        let cfg = module.config();

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::new(18, 20, 28, 255));
        let drawn;
        {
            let mut d3 = d.begin_mode3D(camera);
            d3.draw_grid(64, 1.0);
            if module.is_active() {
                for tile in tiles_in_radius(center.tile(), cfg.tile_radius()) {
                    draw_tile_bounds(
                        &mut d3,
                        tile,
                        cfg.min_y(),
                        cfg.max_y(),
                        Color::new(90, 110, 140, 90),
                    );
                }
            }
            let mut boxes = RaylibBoxRenderer::new(&mut d3);
            module.tick(center, &mut boxes);
            drawn = boxes.drawn();
        }

        let stats = module.stats();
        let (queued, inflight) = module.pool().map_or((0, 0), |p| p.queue_depths());
        let hud = [
            format!(
                "{} | center {} tile {}",
                if module.is_active() { "scanning" } else { "stopped (space)" },
                center,
                center.tile()
            ),
            format!(
                "drawn {} entries {} tiles {} | radius {} y {}..={} min level {}",
                drawn,
                stats.entries,
                stats.tiles,
                cfg.tile_radius(),
                cfg.min_y(),
                cfg.max_y(),
                cfg.min_threshold()
            ),
            format!(
                "pool q={} inflight={} | loaded tiles {}",
                queued,
                inflight,
                field.loaded_tiles()
            ),
        ];
        for (i, line) in hud.iter().enumerate() {
            d.draw_text(line, 12, 12 + i as i32 * 22, 18, Color::RAYWHITE);
        }
        d.draw_fps(12, 12 + hud.len() as i32 * 22);
    }

    module.collect_outcomes();
    log::info!(
        "viewer closed: reconciled={} entries={}",
        module.totals().reconciled,
        module.results().len()
    );
    module.stop();
    Ok(())
}

#[cfg(not(feature = "viewer"))]
pub fn run(
    _settings: LightScanSettings,
    _field: Arc<NoiseLightField>,
    _watcher: Option<&SettingsWatcher>,
    _start: BlockPos,
) -> Result<(), Box<dyn Error>> {
    Err("built without the `viewer` feature; rebuild with --features viewer".into())
}
