use lumen_geom::{BlockPos, TileKey};

/// Source of per-block light values. Shared by every scan worker.
pub trait VolumeSampler: Send + Sync {
    /// Whether the tile's backing data is complete enough to scan.
    fn is_tile_ready(&self, tile: TileKey) -> bool;

    /// Light level at `pos`, or `None` when the value cannot be read right now.
    fn sample_at(&self, pos: BlockPos) -> Option<u8>;
}

/// Sampler assembled from two closures.
pub struct FnSampler<R, S> {
    ready: R,
    sample: S,
}

impl<R, S> FnSampler<R, S>
where
    R: Fn(TileKey) -> bool + Send + Sync,
    S: Fn(BlockPos) -> Option<u8> + Send + Sync,
{
    pub fn new(ready: R, sample: S) -> Self {
        Self { ready, sample }
    }
}

impl<S> FnSampler<fn(TileKey) -> bool, S>
where
    S: Fn(BlockPos) -> Option<u8> + Send + Sync,
{
    /// Every tile reports ready.
    pub fn always_ready(sample: S) -> Self {
        fn ready(_: TileKey) -> bool {
            true
        }
        Self {
            ready: ready as fn(TileKey) -> bool,
            sample,
        }
    }
}

impl<R, S> VolumeSampler for FnSampler<R, S>
where
    R: Fn(TileKey) -> bool + Send + Sync,
    S: Fn(BlockPos) -> Option<u8> + Send + Sync,
{
    #[inline]
    fn is_tile_ready(&self, tile: TileKey) -> bool {
        (self.ready)(tile)
    }

    #[inline]
    fn sample_at(&self, pos: BlockPos) -> Option<u8> {
        (self.sample)(pos)
    }
}
