//! Minimal geometry types for the scan crates (no Raylib dependency).
#![forbid(unsafe_code)]

use core::fmt;
use core::ops::{Add, Div, Sub};

/// Horizontal edge length of a tile, in blocks.
pub const TILE_SIZE: i32 = 16;

/// Integer block coordinate in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn tile(self) -> TileKey {
        TileKey::containing(self.x, self.z)
    }

    /// Block center in floating point world space.
    #[inline]
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        )
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identifier of a `TILE_SIZE` x `TILE_SIZE` column of blocks.
///
/// Derived with flooring division, so block x = -1 lives in tile -1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub tx: i32,
    pub tz: i32,
}

impl TileKey {
    #[inline]
    pub const fn new(tx: i32, tz: i32) -> Self {
        Self { tx, tz }
    }

    #[inline]
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            tx: x.div_euclid(TILE_SIZE),
            tz: z.div_euclid(TILE_SIZE),
        }
    }

    /// Minimum (x, z) block coordinate covered by this tile.
    #[inline]
    pub fn origin(self) -> (i32, i32) {
        (self.tx * TILE_SIZE, self.tz * TILE_SIZE)
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            tx: self.tx + dx,
            tz: self.tz + dz,
        }
    }

    /// Chebyshev distance in tiles.
    #[inline]
    pub fn chebyshev(self, other: TileKey) -> i32 {
        (self.tx - other.tx).abs().max((self.tz - other.tz).abs())
    }

    #[inline]
    pub fn contains(self, pos: BlockPos) -> bool {
        pos.tile() == self
    }
}

impl From<BlockPos> for TileKey {
    fn from(pos: BlockPos) -> Self {
        pos.tile()
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.tx, self.tz)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ONE: Vec3 = Vec3 {
        x: 1.0,
        y: 1.0,
        z: 1.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The unit cube occupied by a block.
    #[inline]
    pub fn unit_at(pos: BlockPos) -> Self {
        let min = Vec3::new(pos.x as f32, pos.y as f32, pos.z as f32);
        Self::new(min, min + Vec3::ONE)
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    #[inline]
    pub fn size(self) -> Vec3 {
        self.max - self.min
    }
}
