use std::error::Error;
use std::fs::File;
use std::path::Path;

use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// `RUST_LOG`-driven terminal logging, or terminal + file when `log_file` is
/// given.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match log_file {
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .try_init()?;
        }
        Some(path) => {
            let file = File::create(path)?;
            let loggers: Vec<Box<dyn SharedLogger>> = vec![
                TermLogger::new(
                    LevelFilter::Info,
                    Config::default(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(LevelFilter::Debug, Config::default(), file),
            ];
            CombinedLogger::init(loggers)?;
        }
    }
    Ok(())
}
