//! Raylib drawing for scan results: conversions and a box renderer.

use lumen_geom::{Aabb, TILE_SIZE, TileKey, Vec3};
use lumen_scan::{BoxRenderer, Rgba, ShapeMode};
use raylib::prelude::*;

pub mod conv {
    use lumen_geom::Vec3;
    use lumen_scan::Rgba;

    pub fn vec3_to_rl(v: Vec3) -> raylib::prelude::Vector3 {
        raylib::prelude::Vector3::new(v.x, v.y, v.z)
    }

    pub fn vec3_from_rl(v: raylib::prelude::Vector3) -> Vec3 {
        Vec3 {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }

    pub fn rgba_to_rl(c: Rgba) -> raylib::prelude::Color {
        raylib::prelude::Color::new(c.r, c.g, c.b, c.a)
    }
}

/// Draws highlight boxes inside an active 3D mode.
pub struct RaylibBoxRenderer<'a, D: RaylibDraw3D> {
    d3: &'a mut D,
    drawn: usize,
}

impl<'a, D: RaylibDraw3D> RaylibBoxRenderer<'a, D> {
    pub fn new(d3: &'a mut D) -> Self {
        Self { d3, drawn: 0 }
    }

    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl<D: RaylibDraw3D> BoxRenderer for RaylibBoxRenderer<'_, D> {
    fn draw_box(&mut self, aabb: Aabb, fill: Rgba, outline: Rgba, mode: ShapeMode) {
        let center = conv::vec3_to_rl(aabb.center());
        let size = aabb.size();
        if mode.draws_sides() {
            self.d3
                .draw_cube(center, size.x, size.y, size.z, conv::rgba_to_rl(fill));
        }
        if mode.draws_lines() {
            self.d3
                .draw_cube_wires(center, size.x, size.y, size.z, conv::rgba_to_rl(outline));
        }
        self.drawn += 1;
    }
}

/// Wireframe around a tile's scanned column.
pub fn draw_tile_bounds<D: RaylibDraw3D>(
    d3: &mut D,
    tile: TileKey,
    min_y: i32,
    max_y: i32,
    color: Color,
) {
    let (ox, oz) = tile.origin();
    let min = Vec3::new(ox as f32, min_y as f32, oz as f32);
    let max = Vec3::new(
        (ox + TILE_SIZE) as f32,
        (max_y + 1) as f32,
        (oz + TILE_SIZE) as f32,
    );
    let bb = Aabb::new(min, max);
    let size = bb.size();
    d3.draw_cube_wires(conv::vec3_to_rl(bb.center()), size.x, size.y, size.z, color);
}
