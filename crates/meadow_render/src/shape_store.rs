//! CPU-side retained shape arena implementing `DrawBackend`.
//!
//! Shapes live in generation-tagged slots. Each shape keeps its fills
//! pre-tessellated in local space plus a cached world-space copy that is only
//! recomputed when the shape's transform changes, so static shapes (the
//! ground tiles between recycles) cost a memcpy per frame.
//!
//! `build_mesh` emits everything into one vertex/index list: world-space shapes
//! first, then screen-pinned shapes, each group sorted by (depth, creation order).

use std::ops::Range;

use glam::Vec2;
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};

use crate::shapes::{tessellate, LocalMesh};
use crate::vertex::ShapeVertex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    World,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeTransform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub alpha: f32,
    pub depth: f32,
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            alpha: 1.0,
            depth: 0.0,
        }
    }
}

struct Fill {
    mesh: LocalMesh,
    color: Rgba,
}

struct Shape {
    fills: Vec<Fill>,
    transform: ShapeTransform,
    space: Space,
    sequence: u64,
    cached: Vec<ShapeVertex>,
    cached_indices: Vec<u32>,
    dirty: bool,
}

impl Shape {
    fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.cached.clear();
        self.cached_indices.clear();
        let t = self.transform;
        let (sin, cos) = t.rotation.sin_cos();
        for fill in &self.fills {
            let base = self.cached.len() as u32;
            let mut color = fill.color;
            color.a *= t.alpha;
            let color = color.to_array();
            for p in &fill.mesh.points {
                let s = *p * t.scale;
                let rotated = Vec2::new(s.x * cos - s.y * sin, s.x * sin + s.y * cos);
                let world = t.position + rotated;
                self.cached.push(ShapeVertex {
                    position: [world.x, world.y],
                    color,
                });
            }
            self.cached_indices
                .extend(fill.mesh.indices.iter().map(|i| base + i));
        }
        self.dirty = false;
    }
}

struct Slot {
    generation: u32,
    shape: Option<Shape>,
}

/// Vertex/index data for one frame plus the index ranges of each space.
#[derive(Debug, Default)]
pub struct ShapeMesh {
    pub vertices: Vec<ShapeVertex>,
    pub indices: Vec<u32>,
    pub world: Range<u32>,
    pub screen: Range<u32>,
}

#[derive(Default)]
pub struct ShapeStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    next_sequence: u64,
    created_total: u64,
    destroyed_total: u64,
}

impl ShapeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn created_total(&self) -> u64 {
        self.created_total
    }

    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }

    pub fn transform(&self, handle: DrawHandle) -> Option<ShapeTransform> {
        self.get(handle).map(|s| s.transform)
    }

    pub fn space(&self, handle: DrawHandle) -> Option<Space> {
        self.get(handle).map(|s| s.space)
    }

    pub fn fill_count(&self, handle: DrawHandle) -> usize {
        self.get(handle).map_or(0, |s| s.fills.len())
    }

    /// Destroy every live shape. Returns how many were still alive.
    pub fn clear(&mut self) -> usize {
        let mut leaked = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.shape.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                leaked += 1;
            }
        }
        self.live = 0;
        self.destroyed_total += leaked as u64;
        leaked
    }

    fn get(&self, handle: DrawHandle) -> Option<&Shape> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.shape.as_ref()
    }

    fn get_mut(&mut self, handle: DrawHandle) -> Option<&mut Shape> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.shape.as_mut()
    }

    fn with_transform(&mut self, handle: DrawHandle, f: impl FnOnce(&mut ShapeTransform)) {
        match self.get_mut(handle) {
            Some(shape) => {
                let before = shape.transform;
                f(&mut shape.transform);
                if shape.transform != before {
                    shape.dirty = true;
                }
            }
            None => log::trace!("Ignoring update for stale handle {:?}", handle),
        }
    }

    pub fn build_mesh(&mut self) -> ShapeMesh {
        let mut order: Vec<(Space, f32, u64, usize)> = Vec::with_capacity(self.live);
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(shape) = slot.shape.as_mut() {
                shape.refresh();
                order.push((shape.space, shape.transform.depth, shape.sequence, index));
            }
        }
        order.sort_by(|a, b| {
            let space_rank = |s: Space| matches!(s, Space::Screen) as u8;
            space_rank(a.0)
                .cmp(&space_rank(b.0))
                .then(a.1.total_cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let mut mesh = ShapeMesh::default();
        let mut screen_start = None;
        for (space, _, _, index) in order {
            if space == Space::Screen && screen_start.is_none() {
                screen_start = Some(mesh.indices.len() as u32);
            }
            let Some(shape) = self.slots[index].shape.as_ref() else {
                continue;
            };
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend_from_slice(&shape.cached);
            mesh.indices
                .extend(shape.cached_indices.iter().map(|i| base + i));
        }
        let end = mesh.indices.len() as u32;
        let split = screen_start.unwrap_or(end);
        mesh.world = 0..split;
        mesh.screen = split..end;
        mesh
    }
}

impl DrawBackend for ShapeStore {
    fn create_filled_shape(&mut self, geometry: &Geometry, color: Rgba) -> DrawHandle {
        let shape = Shape {
            fills: vec![Fill {
                mesh: tessellate(geometry),
                color,
            }],
            transform: ShapeTransform::default(),
            space: Space::World,
            sequence: self.next_sequence,
            cached: Vec::new(),
            cached_indices: Vec::new(),
            dirty: true,
        };
        self.next_sequence += 1;
        self.live += 1;
        self.created_total += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.shape = Some(shape);
            DrawHandle {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                shape: Some(shape),
            });
            DrawHandle {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn add_fill(&mut self, handle: DrawHandle, geometry: &Geometry, color: Rgba) {
        if let Some(shape) = self.get_mut(handle) {
            shape.fills.push(Fill {
                mesh: tessellate(geometry),
                color,
            });
            shape.dirty = true;
        }
    }

    fn reposition(&mut self, handle: DrawHandle, x: f32, y: f32) {
        self.with_transform(handle, |t| t.position = Vec2::new(x, y));
    }

    fn set_depth(&mut self, handle: DrawHandle, depth: f32) {
        self.with_transform(handle, |t| t.depth = depth);
    }

    fn set_rotation(&mut self, handle: DrawHandle, radians: f32) {
        self.with_transform(handle, |t| t.rotation = radians);
    }

    fn set_scale(&mut self, handle: DrawHandle, sx: f32, sy: f32) {
        self.with_transform(handle, |t| t.scale = Vec2::new(sx, sy));
    }

    fn set_alpha(&mut self, handle: DrawHandle, alpha: f32) {
        self.with_transform(handle, |t| t.alpha = alpha.clamp(0.0, 1.0));
    }

    fn pin_to_screen(&mut self, handle: DrawHandle) {
        if let Some(shape) = self.get_mut(handle) {
            shape.space = Space::Screen;
        }
    }

    fn destroy(&mut self, handle: DrawHandle) {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return;
        };
        if slot.generation != handle.generation || slot.shape.is_none() {
            return;
        }
        slot.shape = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        self.destroyed_total += 1;
    }

    fn is_alive(&self, handle: DrawHandle) -> bool {
        self.get(handle).is_some()
    }
}
