use lumen_geom::Aabb;
use serde::{Deserialize, Serialize};

/// 8-bit RGBA color. Serialized as `[r, g, b, a]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u8; 4]", into = "[u8; 4]")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn yellow(a: u8) -> Self {
        Self::new(255, 255, 0, a)
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(c: [u8; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(c: Rgba) -> Self {
        [c.r, c.g, c.b, c.a]
    }
}

/// Which parts of a highlight box get drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeMode {
    /// Filled faces only.
    Sides,
    /// Outline only.
    Lines,
    #[default]
    Both,
}

impl ShapeMode {
    #[inline]
    pub fn draws_sides(self) -> bool {
        matches!(self, ShapeMode::Sides | ShapeMode::Both)
    }

    #[inline]
    pub fn draws_lines(self) -> bool {
        matches!(self, ShapeMode::Lines | ShapeMode::Both)
    }
}

/// Draw backend for highlighted blocks. One call per highlighted coordinate.
pub trait BoxRenderer {
    fn draw_box(&mut self, aabb: Aabb, fill: Rgba, outline: Rgba, mode: ShapeMode);
}
