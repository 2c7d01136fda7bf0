//! F3 debug overlay drawn with egui after the shape passes.
//!
//! Frame order: `prepare()` builds the UI and tessellates it, `upload()` pushes
//! textures and buffers through the frame's encoder, `paint()` records into a
//! pass whose lifetime was released with `forget_lifetime()`, and `cleanup()`
//! frees textures egui dropped. Window events are always forwarded so egui keeps
//! consistent pointer state even while hidden.

use meadow_core::time::TimeState;
use winit::window::Window;

/// Snapshot of scene and renderer state shown in the overlay.
#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub tile_count: usize,
    /// Tiles relocated since the scene was created
    pub tiles_recycled: u64,
    pub projectiles: usize,
    pub dust_puffs: usize,
    /// Live shapes in the draw backend
    pub shape_count: usize,
    pub vertex_count: usize,
    pub player_position: [f32; 2],
    pub center_cell: [i32; 2],
    pub facing: [i8; 2],
    pub paused: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// User clicked the pause toggle
    pub toggle_pause: bool,
    /// User clicked the single-step button (advance one fixed step while paused)
    pub single_step: bool,
    /// User asked for the scene to be rebuilt from the current config
    pub restart: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        time: &TimeState,
        stats: Option<OverlayStats>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if self.visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", time.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", time.smoothed_frame_time_ms));
                        ui.label(format!("Steps this frame: {}", time.steps_this_frame));
                        ui.label(format!("Total steps: {}", time.fixed_step_count));
                        ui.label(format!("Frame: {}", time.frame_count));
                        ui.label(format!("Sim time: {:.0} ms", time.now_ms()));
                        if let Some(ref stats) = stats {
                            ui.separator();
                            ui.label(format!(
                                "Tiles: {} ({} recycled)",
                                stats.tile_count, stats.tiles_recycled
                            ));
                            ui.label(format!("Projectiles: {}", stats.projectiles));
                            ui.label(format!("Dust puffs: {}", stats.dust_puffs));
                            ui.label(format!(
                                "Shapes: {} / {} verts",
                                stats.shape_count, stats.vertex_count
                            ));

                            ui.separator();
                            ui.label(format!(
                                "Player: ({:.1}, {:.1})",
                                stats.player_position[0], stats.player_position[1]
                            ));
                            ui.label(format!(
                                "Center cell: ({}, {})",
                                stats.center_cell[0], stats.center_cell[1]
                            ));
                            ui.label(format!("Facing: {}", facing_label(stats.facing)));

                            ui.separator();
                            ui.horizontal(|ui| {
                                let pause_label = if stats.paused { "Resume" } else { "Pause" };
                                if ui.button(pause_label).clicked() {
                                    actions.toggle_pause = true;
                                }
                                if stats.paused && ui.button("Step").clicked() {
                                    actions.single_step = true;
                                }
                                if ui.button("Restart").clicked() {
                                    actions.restart = true;
                                }
                            });
                            if stats.paused {
                                ui.label("\u{23f8} PAUSED");
                            }
                        }
                    });
            }
            if stats.as_ref().is_some_and(|s| s.game_over) {
                egui::Area::new(egui::Id::new("game_over_banner"))
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.heading("GAME OVER");
                        ui.label("Press Enter to play again");
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Compass label for a facing vector in y-down coordinates.
pub fn facing_label(facing: [i8; 2]) -> &'static str {
    match (facing[0].signum(), facing[1].signum()) {
        (0, -1) => "N",
        (1, -1) => "NE",
        (1, 0) => "E",
        (1, 1) => "SE",
        (0, 1) => "S",
        (-1, 1) => "SW",
        (-1, 0) => "W",
        (-1, -1) => "NW",
        _ => "-",
    }
}
