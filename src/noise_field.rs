use std::sync::{PoisonError, RwLock};

use fastnoise_lite::{FastNoiseLite, NoiseType};
use hashbrown::HashSet;
use lumen_scan::{BlockPos, TileKey, VolumeSampler};

/// Noise values below this emit no light.
const EMIT_FLOOR: f32 = 0.2;
const MAX_LEVEL: f32 = 15.0;
/// Tiles stay loaded this many tiles past the load radius before unloading.
const UNLOAD_MARGIN: i32 = 2;

/// Procedural block-light field with a moving "loaded" region.
///
/// Tiles outside the loaded region report not ready, the way a streaming
/// world reports chunks that are not generated yet.
pub struct NoiseLightField {
    noise: FastNoiseLite,
    loaded_radius: i32,
    loaded: RwLock<HashSet<TileKey>>,
}

impl NoiseLightField {
    pub fn new(seed: i32, loaded_radius: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.09));
        Self {
            noise,
            loaded_radius: loaded_radius.max(0),
            loaded: RwLock::new(HashSet::new()),
        }
    }

    /// Load every tile within the load radius of `center` and unload the
    /// ones that fell behind. Returns (loaded, unloaded) counts.
    pub fn advance(&self, center: TileKey) -> (usize, usize) {
        let r = self.loaded_radius;
        let mut loaded = self.loaded.write().unwrap_or_else(PoisonError::into_inner);
        let before = loaded.len();
        loaded.retain(|t| t.chebyshev(center) <= r + UNLOAD_MARGIN);
        let unloaded = before - loaded.len();
        let mut added = 0;
        for dx in -r..=r {
            for dz in -r..=r {
                if loaded.insert(center.offset(dx, dz)) {
                    added += 1;
                }
            }
        }
        if added > 0 || unloaded > 0 {
            log::debug!("field around {}: +{} -{} tiles", center, added, unloaded);
        }
        (added, unloaded)
    }

    pub fn loaded_tiles(&self) -> usize {
        self.loaded.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Light level from noise alone, ignoring load state.
    pub fn level_at(&self, pos: BlockPos) -> u8 {
        let n = self
            .noise
            .get_noise_3d(pos.x as f32, pos.y as f32, pos.z as f32);
        let t = ((n - EMIT_FLOOR) / (1.0 - EMIT_FLOOR)).clamp(0.0, 1.0);
        (t * MAX_LEVEL).round() as u8
    }
}

impl VolumeSampler for NoiseLightField {
    fn is_tile_ready(&self, tile: TileKey) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&tile)
    }

    fn sample_at(&self, pos: BlockPos) -> Option<u8> {
        if self.is_tile_ready(pos.tile()) {
            Some(self.level_at(pos))
        } else {
            None
        }
    }
}
