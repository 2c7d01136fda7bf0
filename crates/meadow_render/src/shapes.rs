//! Tessellation of `Geometry` into indexed local-space triangles.

use glam::Vec2;
use meadow_core::draw::Geometry;
use std::f32::consts::TAU;

/// Triangle mesh in shape-local coordinates.
#[derive(Debug, Clone, Default)]
pub struct LocalMesh {
    pub points: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl LocalMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_quad(&mut self, corners: [Vec2; 4]) {
        let base = self.points.len() as u32;
        self.points.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Fan around `center` through `rim` (closed loop).
    fn push_fan(&mut self, center: Vec2, rim: &[Vec2]) {
        let base = self.points.len() as u32;
        self.points.push(center);
        self.points.extend_from_slice(rim);
        let n = rim.len() as u32;
        for i in 0..n {
            self.indices
                .extend_from_slice(&[base, base + 1 + i, base + 1 + (i + 1) % n]);
        }
    }
}

/// Segment count for round shapes; grows with radius so large circles stay smooth.
fn segments_for(radius: f32) -> usize {
    ((radius * 0.75) as usize).clamp(12, 64)
}

pub fn tessellate(geometry: &Geometry) -> LocalMesh {
    let mut mesh = LocalMesh::default();
    match geometry {
        Geometry::Rect { x, y, w, h } => {
            mesh.push_quad([
                Vec2::new(*x, *y),
                Vec2::new(x + w, *y),
                Vec2::new(x + w, y + h),
                Vec2::new(*x, y + h),
            ]);
        }
        Geometry::Circle { radius } => {
            ellipse(&mut mesh, *radius, *radius);
        }
        Geometry::Ellipse { half_w, half_h } => {
            ellipse(&mut mesh, *half_w, *half_h);
        }
        Geometry::Polygon { points } => {
            if points.len() >= 3 {
                let base = mesh.points.len() as u32;
                mesh.points.extend_from_slice(points);
                for i in 1..(points.len() as u32 - 1) {
                    mesh.indices.extend_from_slice(&[base, base + i, base + i + 1]);
                }
            }
        }
        Geometry::Star {
            points,
            inner,
            outer,
        } => {
            let tips = (*points).max(2) as usize;
            let mut rim = Vec::with_capacity(tips * 2);
            for i in 0..tips * 2 {
                // First tip points straight up (-y).
                let theta = (i as f32 / (tips * 2) as f32) * TAU - std::f32::consts::FRAC_PI_2;
                let r = if i % 2 == 0 { *outer } else { *inner };
                rim.push(Vec2::new(r * theta.cos(), r * theta.sin()));
            }
            mesh.push_fan(Vec2::ZERO, &rim);
        }
        Geometry::Frame { w, h, thickness } => {
            let t = *thickness;
            // top, bottom, left, right bands; corners belong to top/bottom.
            mesh.push_quad([
                Vec2::new(-t, -t),
                Vec2::new(w + t, -t),
                Vec2::new(w + t, 0.0),
                Vec2::new(-t, 0.0),
            ]);
            mesh.push_quad([
                Vec2::new(-t, *h),
                Vec2::new(w + t, *h),
                Vec2::new(w + t, h + t),
                Vec2::new(-t, h + t),
            ]);
            mesh.push_quad([
                Vec2::new(-t, 0.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(0.0, *h),
                Vec2::new(-t, *h),
            ]);
            mesh.push_quad([
                Vec2::new(*w, 0.0),
                Vec2::new(w + t, 0.0),
                Vec2::new(w + t, *h),
                Vec2::new(*w, *h),
            ]);
        }
    }
    mesh
}

fn ellipse(mesh: &mut LocalMesh, half_w: f32, half_h: f32) {
    let segments = segments_for(half_w.max(half_h));
    let rim: Vec<Vec2> = (0..segments)
        .map(|i| {
            let theta = (i as f32 / segments as f32) * TAU;
            Vec2::new(half_w * theta.cos(), half_h * theta.sin())
        })
        .collect();
    mesh.push_fan(Vec2::ZERO, &rim);
}
