use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Multiplied into every vertex color; `tint[3]` is the camera alpha.
    pub tint: [f32; 4],
}

impl CameraUniform {
    pub fn identity() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            tint: [1.0; 4],
        }
    }
}

/// Pixel rectangle on the surface, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// 2D camera over a y-down world (screen convention: +y points down).
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
    pub alpha: f32,
}

impl ViewportRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
            alpha: 1.0,
        }
    }

    /// Camera that maps world units 1:1 onto surface pixels with (0, 0) at the
    /// top-left corner. Used for shapes pinned to the screen.
    pub fn screen(viewport_width: u32, viewport_height: u32) -> Self {
        let mut camera = Self::new(viewport_width, viewport_height);
        camera.position = Vec2::new(viewport_width as f32, viewport_height as f32) * 0.5;
        camera
    }

    pub fn half_extent(&self) -> Vec2 {
        Vec2::new(
            self.viewport.0 as f32 / (2.0 * self.zoom),
            self.viewport.1 as f32 / (2.0 * self.zoom),
        )
    }

    /// World-space rectangle currently visible, as (min, max).
    pub fn visible_rect(&self) -> (Vec2, Vec2) {
        let half = self.half_extent();
        (self.position - half, self.position + half)
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extent();

        // bottom/top swapped relative to a y-up projection so +y renders downward.
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y + half.y,
            self.position.y - half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
            tint: [1.0, 1.0, 1.0, self.alpha],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn project(camera: &Camera2D, p: Vec2) -> Vec2 {
        let m = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        let clip = m * Vec4::new(p.x, p.y, 0.0, 1.0);
        Vec2::new(clip.x, clip.y)
    }

    #[test]
    fn camera_center_maps_to_ndc_origin() {
        let mut camera = Camera2D::new(1024, 768);
        camera.position = Vec2::new(300.0, -40.0);
        camera.zoom = 1.5;
        let ndc = project(&camera, camera.position);
        assert!(ndc.length() < 1e-5);
    }

    #[test]
    fn world_down_is_screen_down() {
        let camera = Camera2D::new(800, 600);
        let below = project(&camera, Vec2::new(0.0, 100.0));
        assert!(below.y < 0.0, "larger world y must appear lower on screen");
    }

    #[test]
    fn visible_rect_shrinks_with_zoom() {
        let mut camera = Camera2D::new(1024, 768);
        camera.zoom = 2.0;
        let (min, max) = camera.visible_rect();
        assert!((max.x - min.x - 512.0).abs() < 1e-4);
        assert!((max.y - min.y - 384.0).abs() < 1e-4);
    }

    #[test]
    fn screen_camera_maps_pixels_to_corners() {
        let camera = Camera2D::screen(1024, 768);
        let top_left = project(&camera, Vec2::ZERO);
        let bottom_right = project(&camera, Vec2::new(1024.0, 768.0));
        assert!((top_left - Vec2::new(-1.0, 1.0)).length() < 1e-5);
        assert!((bottom_right - Vec2::new(1.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn alpha_lands_in_tint() {
        let mut camera = Camera2D::new(10, 10);
        camera.alpha = 0.8;
        assert_eq!(camera.build_uniform().tint, [1.0, 1.0, 1.0, 0.8]);
    }
}
