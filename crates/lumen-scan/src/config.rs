use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::{Rgba, ShapeMode};

pub const CHUNK_RADIUS_RANGE: RangeInclusive<i32> = 1..=12;
pub const Y_RANGE: RangeInclusive<i32> = -64..=319;
pub const LIGHT_LEVEL_RANGE: RangeInclusive<i32> = 0..=15;
pub const POOL_SIZE_RANGE: RangeInclusive<i32> = 1..=8;

/// Upper bound accepted by `ScanConfig::new`; keeps a single pass finite.
pub const MAX_SCAN_RADIUS: i32 = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("min_y ({min_y}) is above max_y ({max_y})")]
    EmptyYRange { min_y: i32, max_y: i32 },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn check_range(
    field: &'static str,
    value: i32,
    range: &RangeInclusive<i32>,
) -> Result<i32, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: i64::from(value),
            min: i64::from(*range.start()),
            max: i64::from(*range.end()),
        })
    }
}

/// Validated, immutable parameters for one scan pass.
///
/// The only way to obtain one is through validation, so `min_y <= max_y`
/// holds and both lie in [`Y_RANGE`] for every value of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanConfig {
    tile_radius: i32,
    min_y: i32,
    max_y: i32,
    min_threshold: u8,
}

impl ScanConfig {
    pub fn new(
        tile_radius: i32,
        min_y: i32,
        max_y: i32,
        min_threshold: u8,
    ) -> Result<Self, ConfigError> {
        check_range("tile_radius", tile_radius, &(1..=MAX_SCAN_RADIUS))?;
        check_range("min_y", min_y, &Y_RANGE)?;
        check_range("max_y", max_y, &Y_RANGE)?;
        if min_y > max_y {
            return Err(ConfigError::EmptyYRange { min_y, max_y });
        }
        Ok(Self {
            tile_radius,
            min_y,
            max_y,
            min_threshold,
        })
    }

    #[inline]
    pub fn tile_radius(&self) -> i32 {
        self.tile_radius
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    #[inline]
    pub fn min_threshold(&self) -> u8 {
        self.min_threshold
    }

    /// Inclusive vertical scan range.
    #[inline]
    pub fn y_span(&self) -> RangeInclusive<i32> {
        self.min_y..=self.max_y
    }

    /// Tiles covered by one pass: `(2r + 1)^2`.
    #[inline]
    pub fn tiles_per_pass(&self) -> usize {
        let side = (2 * self.tile_radius + 1) as usize;
        side * side
    }

    /// Samples taken per ready tile.
    #[inline]
    pub fn samples_per_tile(&self) -> usize {
        let side = lumen_geom::TILE_SIZE as usize;
        side * side * (self.max_y - self.min_y + 1) as usize
    }
}

/// User-editable options for the light scan module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightScanSettings {
    /// Radius of tiles to scan around the center.
    pub chunk_radius: i32,
    pub min_y: i32,
    pub max_y: i32,
    /// Minimum light level to highlight.
    pub min_light_level: i32,
    /// Scan tiles on a worker pool instead of the calling thread.
    pub threading: bool,
    /// Only read when the pool is (re)created on `start`.
    pub thread_pool_size: i32,
    pub side_color: Rgba,
    pub line_color: Rgba,
    pub shape_mode: ShapeMode,
}

impl Default for LightScanSettings {
    fn default() -> Self {
        Self {
            chunk_radius: 4,
            min_y: -63,
            max_y: 319,
            min_light_level: 5,
            threading: true,
            thread_pool_size: 4,
            side_color: Rgba::yellow(60),
            line_color: Rgba::yellow(200),
            shape_mode: ShapeMode::Both,
        }
    }
}

impl LightScanSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: LightScanSettings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every option against its allowed range and derives the pass
    /// parameters.
    pub fn validate(&self) -> Result<ScanConfig, ConfigError> {
        let radius = check_range("chunk_radius", self.chunk_radius, &CHUNK_RADIUS_RANGE)?;
        let min_y = check_range("min_y", self.min_y, &Y_RANGE)?;
        let max_y = check_range("max_y", self.max_y, &Y_RANGE)?;
        let level = check_range("min_light_level", self.min_light_level, &LIGHT_LEVEL_RANGE)?;
        check_range("thread_pool_size", self.thread_pool_size, &POOL_SIZE_RANGE)?;
        ScanConfig::new(radius, min_y, max_y, level as u8)
    }

    /// Pool size as a worker count. Only meaningful on validated settings.
    #[inline]
    pub fn pool_workers(&self) -> usize {
        self.thread_pool_size.clamp(*POOL_SIZE_RANGE.start(), *POOL_SIZE_RANGE.end()) as usize
    }
}

pub fn load_settings_from_path(path: &Path) -> Result<LightScanSettings, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    LightScanSettings::from_toml_str(&s)
}
