//! Retained-mode draw backend interface.
//!
//! Gameplay code never touches the GPU. It creates filled shapes, receives an
//! opaque `DrawHandle`, and afterwards only moves, rotates, scales, fades or
//! destroys that handle. Handles carry a generation so that a stale handle
//! (one whose shape was already destroyed) is ignored instead of aliasing a
//! newer shape that reused the slot.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `0xRRGGBB` plus a separate alpha, the way colors are authored in config.
    pub fn from_hex(rgb: u32, alpha: f32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
            a: alpha,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Local-space geometry of one filled part. Coordinates are relative to the
/// shape's position; `Rect` and `Frame` are anchored at their top-left corner,
/// everything else is centered on the origin.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { radius: f32 },
    Ellipse { half_w: f32, half_h: f32 },
    /// Convex polygon, fan-triangulated from the first point.
    Polygon { points: Vec<Vec2> },
    Star { points: u32, inner: f32, outer: f32 },
    /// Rectangle outline of the given thickness, drawn outside `w`×`h`.
    Frame { w: f32, h: f32, thickness: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawHandle {
    pub index: u32,
    pub generation: u32,
}

pub trait DrawBackend {
    fn create_filled_shape(&mut self, geometry: &Geometry, color: Rgba) -> DrawHandle;
    /// Append another filled part to an existing shape (drawn above earlier parts).
    fn add_fill(&mut self, handle: DrawHandle, geometry: &Geometry, color: Rgba);
    fn reposition(&mut self, handle: DrawHandle, x: f32, y: f32);
    fn set_depth(&mut self, handle: DrawHandle, depth: f32);
    fn set_rotation(&mut self, handle: DrawHandle, radians: f32);
    fn set_scale(&mut self, handle: DrawHandle, sx: f32, sy: f32);
    fn set_alpha(&mut self, handle: DrawHandle, alpha: f32);
    /// Draw in screen pixels instead of world space (ignores camera scroll/zoom).
    fn pin_to_screen(&mut self, handle: DrawHandle);
    /// Destroying a dead handle is a no-op.
    fn destroy(&mut self, handle: DrawHandle);
    fn is_alive(&self, handle: DrawHandle) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_splits_channels() {
        let c = Rgba::from_hex(0xFF9900, 0.5);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 0.6).abs() < 1e-6);
        assert_eq!(c.b, 0.0);
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        let c = Rgba::WHITE.with_alpha(0.25);
        assert_eq!(c.to_array(), [1.0, 1.0, 1.0, 0.25]);
    }
}
