//! `lumen`: drives the light-level scan over a generated light field, either
//! headless (logs per tick) or in a raylib window with the `viewer` feature.
#![forbid(unsafe_code)]

mod cli;
mod headless;
mod logging;
mod noise_field;
mod settings_watch;
mod viewer;

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use lumen_scan::{BlockPos, LightScanSettings, load_settings_from_path};

use crate::cli::Args;
use crate::headless::HeadlessRun;
use crate::noise_field::NoiseLightField;
use crate::settings_watch::SettingsWatcher;

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    if args.print_config {
        print!("{}", toml::to_string_pretty(&LightScanSettings::default())?);
        return Ok(());
    }

    let settings = match &args.config {
        Some(path) => {
            let s = load_settings_from_path(path)?;
            log::info!("settings loaded from {}", path.display());
            s
        }
        None => LightScanSettings::default(),
    };
    let watcher = match (&args.config, args.watch) {
        (Some(path), true) => Some(SettingsWatcher::new(path)?),
        _ => None,
    };

    let field = Arc::new(NoiseLightField::new(args.seed, args.loaded_radius));
    let start = BlockPos::new(0, 64, 0);
    if args.viewer {
        return viewer::run(settings, field, watcher.as_ref(), start);
    }

    let plan = HeadlessRun {
        ticks: args.ticks,
        step: args.step,
        start,
    };
    let drawn = headless::run(&plan, settings, field, watcher.as_ref())?;
    log::info!(
        "last tick drew {} boxes ({} filled, {} outlined)",
        drawn.boxes,
        drawn.fills,
        drawn.outlines
    );
    Ok(())
}
