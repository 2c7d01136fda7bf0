//! Procedural grass tiles.

use std::ops::RangeInclusive;

use glam::Vec2;
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::tile_grid::TileDecorator;

const BASE_GREENS: [u32; 5] = [0x215B10, 0x267F00, 0x2F9C13, 0x398119, 0x1F5F04];

struct BladeLayer {
    color: u32,
    alpha: f32,
    count: RangeInclusive<u32>,
    height: RangeInclusive<i32>,
    width: RangeInclusive<i32>,
    max_angle_deg: i32,
}

const LAYERS: [BladeLayer; 4] = [
    // short, most numerous
    BladeLayer {
        color: 0x2A8C14,
        alpha: 0.7,
        count: 15..=25,
        height: 3..=8,
        width: 1..=2,
        max_angle_deg: 10,
    },
    BladeLayer {
        color: 0x1E7B04,
        alpha: 0.6,
        count: 8..=15,
        height: 8..=14,
        width: 1..=2,
        max_angle_deg: 15,
    },
    // tall
    BladeLayer {
        color: 0x194D00,
        alpha: 0.5,
        count: 3..=7,
        height: 12..=20,
        width: 1..=2,
        max_angle_deg: 20,
    },
    // bright tips
    BladeLayer {
        color: 0x3CAD1C,
        alpha: 0.7,
        count: 1..=5,
        height: 5..=10,
        width: 1..=1,
        max_angle_deg: 25,
    },
];

/// Fills each tile with a random base green plus four layers of blades.
pub struct GrassDecorator {
    rng: Pcg32,
}

impl GrassDecorator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl TileDecorator for GrassDecorator {
    fn decorate(&mut self, tile_size: f32, backend: &mut dyn DrawBackend) -> DrawHandle {
        let base = BASE_GREENS[self.rng.random_range(0..BASE_GREENS.len())];
        let handle = backend.create_filled_shape(
            &Geometry::Rect {
                x: 0.0,
                y: 0.0,
                w: tile_size,
                h: tile_size,
            },
            Rgba::from_hex(base, 1.0),
        );

        let span = tile_size.max(0.0) as i32;
        for layer in &LAYERS {
            let color = Rgba::from_hex(layer.color, layer.alpha);
            let count = self.rng.random_range(layer.count.clone());
            for _ in 0..count {
                let root = Vec2::new(
                    self.rng.random_range(0..=span) as f32,
                    self.rng.random_range(0..=span) as f32,
                );
                let height = self.rng.random_range(layer.height.clone()) as f32;
                let width = self.rng.random_range(layer.width.clone());
                let tip = self.rng.random_range(-width * 2..=width * 2) as f32;
                let angle = (self
                    .rng
                    .random_range(-layer.max_angle_deg..=layer.max_angle_deg)
                    as f32)
                    .to_radians();
                let points = blade_polygon(root, width as f32, height, tip, angle);
                backend.add_fill(handle, &Geometry::Polygon { points }, color);
            }
        }
        handle
    }
}

/// A blade rooted at `root`: a quad from the base `width` up to a tip shifted
/// sideways by `tip`, rotated by `angle` around the root.
pub fn blade_polygon(root: Vec2, width: f32, height: f32, tip: f32, angle: f32) -> Vec<Vec2> {
    let rotation = Vec2::from_angle(angle);
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(width, 0.0),
        Vec2::new(width + tip, -height),
        Vec2::new(tip, -height),
    ]
    .into_iter()
    .map(|p| root + rotation.rotate(p))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_render::ShapeStore;

    #[test]
    fn blade_points_up_when_unrotated() {
        let points = blade_polygon(Vec2::new(10.0, 20.0), 2.0, 8.0, 1.0, 0.0);
        assert_eq!(points[0], Vec2::new(10.0, 20.0));
        assert_eq!(points[1], Vec2::new(12.0, 20.0));
        assert_eq!(points[2], Vec2::new(13.0, 12.0));
        assert_eq!(points[3], Vec2::new(11.0, 12.0));
    }

    #[test]
    fn tile_has_base_and_blade_layers() {
        let mut store = ShapeStore::new();
        let mut decorator = GrassDecorator::new(1);
        let handle = decorator.decorate(64.0, &mut store);
        let fills = store.fill_count(handle);
        // base + 15..25 + 8..15 + 3..7 + 1..5
        assert!((28..=53).contains(&fills), "unexpected fill count {fills}");
    }

    #[test]
    fn same_seed_produces_same_field() {
        let mut store_a = ShapeStore::new();
        let mut store_b = ShapeStore::new();
        let mut a = GrassDecorator::new(42);
        let mut b = GrassDecorator::new(42);
        for _ in 0..10 {
            let ha = a.decorate(64.0, &mut store_a);
            let hb = b.decorate(64.0, &mut store_b);
            assert_eq!(store_a.fill_count(ha), store_b.fill_count(hb));
        }
        let mesh_a = store_a.build_mesh();
        let mesh_b = store_b.build_mesh();
        assert_eq!(mesh_a.vertices.len(), mesh_b.vertices.len());
        assert!(mesh_a
            .vertices
            .iter()
            .zip(&mesh_b.vertices)
            .all(|(va, vb)| va.position == vb.position && va.color == vb.color));
    }
}
