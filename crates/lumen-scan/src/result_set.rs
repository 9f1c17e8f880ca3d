use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use hashbrown::{HashMap, HashSet};
use lumen_geom::{BlockPos, TileKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResultSetStats {
    pub entries: usize,
    pub tiles: usize,
    pub generation: u64,
    pub reconciles: u64,
    pub added: u64,
    pub removed: u64,
    pub discarded: u64,
    pub pruned: u64,
}

/// Entry delta produced by one tile reconciliation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub added: usize,
    pub removed: usize,
}

/// Highlighted coordinates shared between scan workers and the renderer.
///
/// Entries are grouped per tile; a reconciliation replaces exactly one tile's
/// group under the write lock, so readers never see a half-applied tile.
/// `clear` bumps the generation, and reconciliations carrying an older
/// generation are dropped.
pub struct ResultSet {
    tiles: RwLock<HashMap<TileKey, HashSet<BlockPos>>>,
    generation: AtomicU64,
    reconciles: AtomicU64,
    added: AtomicU64,
    removed: AtomicU64,
    discarded: AtomicU64,
    pruned: AtomicU64,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSet {
    pub fn new() -> Self {
        Self {
            tiles: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            reconciles: AtomicU64::new(0),
            added: AtomicU64::new(0),
            removed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace `tile`'s entries with `fresh`: stale coordinates of this tile
    /// are removed, new ones added, other tiles untouched.
    ///
    /// Returns `None` when the set was cleared after `generation` was read.
    pub fn reconcile(
        &self,
        tile: TileKey,
        fresh: HashSet<BlockPos>,
        generation: u64,
    ) -> Option<Reconciled> {
        debug_assert!(fresh.iter().all(|p| tile.contains(*p)));
        let mut tiles = self.write();
        if self.generation.load(Ordering::Acquire) != generation {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let delta = match tiles.get(&tile) {
            Some(old) => Reconciled {
                added: fresh.difference(old).count(),
                removed: old.difference(&fresh).count(),
            },
            None => Reconciled {
                added: fresh.len(),
                removed: 0,
            },
        };
        if fresh.is_empty() {
            tiles.remove(&tile);
        } else {
            tiles.insert(tile, fresh);
        }
        drop(tiles);
        self.reconciles.fetch_add(1, Ordering::Relaxed);
        self.added.fetch_add(delta.added as u64, Ordering::Relaxed);
        self.removed.fetch_add(delta.removed as u64, Ordering::Relaxed);
        Some(delta)
    }

    /// Drop every tile farther than `radius` (Chebyshev) from `center`.
    /// Returns the number of coordinates removed.
    pub fn retain_within(&self, center: TileKey, radius: i32) -> usize {
        let mut tiles = self.write();
        let mut dropped = 0;
        tiles.retain(|tile, set| {
            let keep = tile.chebyshev(center) <= radius;
            if !keep {
                dropped += set.len();
            }
            keep
        });
        drop(tiles);
        if dropped > 0 {
            self.pruned.fetch_add(dropped as u64, Ordering::Relaxed);
        }
        dropped
    }

    pub fn clear(&self) {
        let mut tiles = self.write();
        tiles.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Point-in-time copy of every coordinate, safe to iterate while scans
    /// keep mutating the live set.
    pub fn snapshot(&self) -> Vec<BlockPos> {
        let tiles = self.read();
        let mut out = Vec::with_capacity(tiles.values().map(HashSet::len).sum());
        for set in tiles.values() {
            out.extend(set.iter().copied());
        }
        out
    }

    pub fn tile_snapshot(&self, tile: TileKey) -> Vec<BlockPos> {
        self.read()
            .get(&tile)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.read()
            .get(&pos.tile())
            .is_some_and(|set| set.contains(&pos))
    }

    pub fn len(&self) -> usize {
        self.read().values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn tile_count(&self) -> usize {
        self.read().len()
    }

    pub fn stats(&self) -> ResultSetStats {
        let (entries, tiles) = {
            let map = self.read();
            (map.values().map(HashSet::len).sum(), map.len())
        };
        ResultSetStats {
            entries,
            tiles,
            generation: self.generation(),
            reconciles: self.reconciles.load(Ordering::Relaxed),
            added: self.added.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
        }
    }

    // A panicking worker cannot leave a tile half-written (groups are swapped
    // whole), so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TileKey, HashSet<BlockPos>>> {
        self.tiles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TileKey, HashSet<BlockPos>>> {
        self.tiles.write().unwrap_or_else(PoisonError::into_inner)
    }
}
