//! Follow camera plus a minimap inset in the top-right corner.

use glam::Vec2;
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};
use meadow_render::{Camera2D, ViewportRect};

use crate::config::CameraConfig;

const BORDER_THICKNESS: f32 = 2.0;
const MARKER_RADIUS: f32 = 5.0;
const MARKER_COLOR: u32 = 0xFF0000;
const MARKER_DEPTH: f32 = 100.0;

/// Minimap rectangle for a viewport: `fraction` of each axis, `margin` pixels
/// from the top and right edges.
pub fn minimap_rect(width: u32, height: u32, fraction: f32, margin: f32) -> ViewportRect {
    let w = width as f32 * fraction;
    let h = height as f32 * fraction;
    ViewportRect {
        x: width as f32 - w - margin,
        y: margin,
        width: w,
        height: h,
    }
}

pub struct CameraRig {
    main: Camera2D,
    minimap: Camera2D,
    screen: Camera2D,
    minimap_rect: ViewportRect,
    fraction: f32,
    margin: f32,
    alpha: f32,
    backdrop: DrawHandle,
    border: DrawHandle,
    marker: DrawHandle,
}

impl CameraRig {
    pub fn new(
        config: &CameraConfig,
        viewport: (u32, u32),
        focus: Vec2,
        backend: &mut dyn DrawBackend,
    ) -> Self {
        let (width, height) = viewport;
        let rect = minimap_rect(width, height, config.minimap_fraction, config.minimap_margin);

        let mut main = Camera2D::new(width, height);
        main.zoom = config.zoom;
        main.position = focus;

        let mut minimap = Camera2D::new(rect.width.round() as u32, rect.height.round() as u32);
        minimap.zoom = config.minimap_zoom;
        minimap.alpha = config.minimap_alpha;
        minimap.position = focus;

        let (backdrop, border) = create_frame(rect, config.minimap_alpha, backend);

        let marker = backend.create_filled_shape(
            &Geometry::Circle {
                radius: MARKER_RADIUS,
            },
            Rgba::from_hex(MARKER_COLOR, 1.0),
        );
        backend.set_depth(marker, MARKER_DEPTH);
        backend.reposition(marker, focus.x, focus.y);

        Self {
            main,
            minimap,
            screen: Camera2D::screen(width, height),
            minimap_rect: rect,
            fraction: config.minimap_fraction,
            margin: config.minimap_margin,
            alpha: config.minimap_alpha,
            backdrop,
            border,
            marker,
        }
    }

    /// Recompute every camera and the minimap decoration for a new surface size.
    pub fn resize(&mut self, width: u32, height: u32, backend: &mut dyn DrawBackend) {
        self.main.viewport = (width, height);
        self.screen = Camera2D::screen(width, height);
        self.minimap_rect = minimap_rect(width, height, self.fraction, self.margin);
        self.minimap.viewport = (
            self.minimap_rect.width.round() as u32,
            self.minimap_rect.height.round() as u32,
        );

        backend.destroy(self.backdrop);
        backend.destroy(self.border);
        (self.backdrop, self.border) = create_frame(self.minimap_rect, self.alpha, backend);
        log::debug!(
            "Minimap moved to ({:.1}, {:.1}) {:.1}x{:.1}",
            self.minimap_rect.x,
            self.minimap_rect.y,
            self.minimap_rect.width,
            self.minimap_rect.height
        );
    }

    /// Both cameras follow `player`; the minimap marker sits on it.
    pub fn sync(&mut self, player: Vec2, backend: &mut dyn DrawBackend) {
        self.main.position = player;
        self.minimap.position = player;
        backend.reposition(self.marker, player.x, player.y);
    }

    pub fn main_camera(&self) -> &Camera2D {
        &self.main
    }

    pub fn minimap_camera(&self) -> &Camera2D {
        &self.minimap
    }

    pub fn screen_camera(&self) -> &Camera2D {
        &self.screen
    }

    pub fn minimap_rect(&self) -> ViewportRect {
        self.minimap_rect
    }

    #[allow(dead_code)]
    pub fn marker(&self) -> DrawHandle {
        self.marker
    }

    pub fn release(&mut self, backend: &mut dyn DrawBackend) {
        backend.destroy(self.backdrop);
        backend.destroy(self.border);
        backend.destroy(self.marker);
    }
}

/// Screen-pinned black backdrop and white border for the minimap rectangle.
fn create_frame(
    rect: ViewportRect,
    alpha: f32,
    backend: &mut dyn DrawBackend,
) -> (DrawHandle, DrawHandle) {
    let backdrop = backend.create_filled_shape(
        &Geometry::Rect {
            x: 0.0,
            y: 0.0,
            w: rect.width,
            h: rect.height,
        },
        Rgba::BLACK.with_alpha(alpha),
    );
    backend.reposition(backdrop, rect.x, rect.y);
    backend.pin_to_screen(backdrop);

    let border = backend.create_filled_shape(
        &Geometry::Frame {
            w: rect.width,
            h: rect.height,
            thickness: BORDER_THICKNESS,
        },
        Rgba::WHITE,
    );
    backend.reposition(border, rect.x, rect.y);
    backend.set_depth(border, 1.0);
    backend.pin_to_screen(border);
    (backdrop, border)
}
