use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "lumen",
    version,
    about = "Highlight blocks above a light threshold around a moving center"
)]
pub struct Args {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reload the settings file whenever it changes.
    #[arg(long, requires = "config")]
    pub watch: bool,

    /// Seed for the generated light field.
    #[arg(long, default_value_t = 1337)]
    pub seed: i32,

    /// Headless run length in ticks.
    #[arg(long, default_value_t = 20)]
    pub ticks: u32,

    /// Blocks the center moves along +x per tick.
    #[arg(long, default_value_t = 4)]
    pub step: i32,

    /// Tiles around the center whose data counts as loaded.
    #[arg(long, default_value_t = 6)]
    pub loaded_radius: i32,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Open a raylib window instead of running headless.
    #[arg(long)]
    pub viewer: bool,

    /// Print the default settings as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}
