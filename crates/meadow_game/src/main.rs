//! Meadow -- main loop and application entry point.
//!
//! winit drives the event loop via `ApplicationHandler`. Simulation runs inside
//! `RedrawRequested` on a fixed timestep (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `run_fixed_steps()` -- config reloads, then one `GameScene::on_update`
//!      per fixed slice with `now_ms()` as the simulation clock; key edges are
//!      cleared after each step so a press acts exactly once
//!   3. Drain scene events (ready, transition to the GameOver screen)
//!   4. Flatten the shape store, draw it through the main, screen and minimap
//!      cameras, then composite the egui overlay
//!
//! Hot reload: the tuning file is watched via mtime polling (or forced with R)
//! and a valid reload rebuilds the scene at a frame boundary.

mod camera_rig;
mod config;
mod decorator;
mod direction;
mod error;
mod player;
mod projectile;
#[cfg(test)]
mod replay;
mod scene;
mod tile_grid;
mod trail;

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{load_config_from_path, ConfigWatcher, GameConfig, DEFAULT_CONFIG_PATH};
use meadow_core::input::{InputState, Key};
use meadow_core::time::TimeState;
use meadow_devtools::{DebugOverlay, OverlayStats};
use meadow_platform::window::PlatformConfig;
use meadow_render::{
    Camera2D, CameraBinding, GpuContext, ShapePipeline, ShapeStore, ViewportRect,
};
use scene::{GameScene, SceneEvent};

const MEADOW_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.21,
    b: 0.0,
    a: 1.0,
};
const GAME_OVER_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Playing,
    GameOver,
}

/// What the frame loop does after one fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepFlow {
    Continue,
    /// Leave the remaining steps of this frame in the accumulator.
    Break,
    Exit,
}

/// Host-level keys, read from the edge state of one step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct HostKeys {
    exit: bool,
    toggle_overlay: bool,
    reload: bool,
}

impl HostKeys {
    fn read(input: &InputState) -> Self {
        Self {
            exit: input.is_just_pressed(Key::Escape),
            toggle_overlay: input.is_just_pressed(Key::F3),
            reload: input.is_just_pressed(Key::R),
        }
    }
}

/// Owner of the clock and input that one fixed step runs against.
trait StepHost {
    fn clock(&mut self) -> &mut TimeState;
    fn input_mut(&mut self) -> &mut InputState;
    fn fixed_step(&mut self) -> StepFlow;
}

/// Run every fixed step due this frame.
///
/// Edge-triggered input belongs to the first step that sees it and is cleared
/// right after, so a press acts once however many steps the frame runs. A frame
/// with no due step leaves edges untouched for the next frame.
fn run_fixed_steps(host: &mut impl StepHost) -> StepFlow {
    while host.clock().should_step() {
        let flow = host.fixed_step();
        host.input_mut().end_frame();
        if flow != StepFlow::Continue {
            return flow;
        }
    }
    StepFlow::Continue
}

/// Everything that exists once the window and GPU surface are available.
///
///  - **Core systems** (time, input) -- updated every frame
///  - **Content** (config, scene, shape store) -- rebuilt on reload or restart
///  - **GPU resources** (pipeline, camera bindings) -- created once
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    shapes: ShapeStore,
    shape_pipeline: ShapePipeline,
    main_binding: CameraBinding,
    screen_binding: CameraBinding,
    minimap_binding: CameraBinding,
    debug_overlay: DebugOverlay,

    // --- Hot-reloadable content -------------------------------------------------
    config_watcher: ConfigWatcher,
    config: GameConfig,
    scene: Option<GameScene>,
    events_tx: Sender<SceneEvent>,
    events_rx: Receiver<SceneEvent>,
    screen: Screen,
    paused: bool,
    single_step_requested: bool,
    vertex_count: usize,
}

impl EngineState {
    fn new(window: Arc<Window>) -> Self {
        let gpu = GpuContext::new(window.clone()).unwrap_or_else(|err| {
            log::error!("GPU initialisation failed: {}", err);
            panic!("Failed to initialise GPU: {}", err);
        });
        let shape_pipeline = ShapePipeline::new(&gpu.device, gpu.surface_format);
        let main_binding = shape_pipeline.create_camera_binding(&gpu.device, "Main Camera");
        let screen_binding = shape_pipeline.create_camera_binding(&gpu.device, "Screen Camera");
        let minimap_binding = shape_pipeline.create_camera_binding(&gpu.device, "Minimap Camera");
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        let config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        let config_watcher = ConfigWatcher::new(config_path.clone());
        let config = if config_path.exists() {
            load_config_from_path(&config_path).unwrap_or_else(|err| {
                panic!(
                    "Failed to load initial config '{}': {}",
                    config_path.display(),
                    err
                );
            })
        } else {
            log::warn!(
                "Config '{}' not found, using built-in defaults.",
                config_path.display()
            );
            GameConfig::default()
        };

        let (events_tx, events_rx) = mpsc::channel();
        let mut state = Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            shapes: ShapeStore::new(),
            shape_pipeline,
            main_binding,
            screen_binding,
            minimap_binding,
            debug_overlay,
            config_watcher,
            config,
            scene: None,
            events_tx,
            events_rx,
            screen: Screen::Playing,
            paused: false,
            single_step_requested: false,
            vertex_count: 0,
        };
        if let Err(err) = state.start_scene() {
            panic!("Initial scene could not be created: {}", err);
        }
        state
    }

    /// Tear down any running scene and build a fresh one from `self.config`.
    fn start_scene(&mut self) -> Result<(), error::ConfigError> {
        if let Some(old) = self.scene.take() {
            old.teardown(&mut self.shapes);
        }
        let leaked = self.shapes.clear();
        if leaked > 0 {
            log::warn!("{} shapes were still alive after teardown", leaked);
        }
        let scene = GameScene::on_create(
            &self.config,
            self.events_tx.clone(),
            self.gpu.size,
            self.time.now_ms(),
            &mut self.shapes,
        )?;
        self.scene = Some(scene);
        self.screen = Screen::Playing;
        Ok(())
    }

    fn enter_game_over(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.teardown(&mut self.shapes);
        }
        self.screen = Screen::GameOver;
        log::info!("Game over. Press Enter to play again.");
    }

    fn reload_config(&mut self, reason: &str) {
        match load_config_from_path(self.config_watcher.path()) {
            Ok(config) => {
                let previous = std::mem::replace(&mut self.config, config);
                if self.screen == Screen::Playing {
                    if let Err(err) = self.start_scene() {
                        log::error!("Reloaded config rejected ({}): {}", reason, err);
                        self.config = previous;
                        if let Err(err) = self.start_scene() {
                            log::error!("Previous config no longer builds a scene: {}", err);
                        }
                        return;
                    }
                }
                log::info!("Config reloaded ({})", reason);
            }
            Err(err) => {
                log::error!("Config reload failed ({}): {}", reason, err);
            }
        }
    }

    /// Returns true when the screen changed and the rest of the frame's steps
    /// should wait for fresh input.
    fn drain_scene_events(&mut self) -> bool {
        let mut switched = false;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SceneEvent::Ready => log::debug!("Scene ready"),
                SceneEvent::TransitionRequested => {
                    self.enter_game_over();
                    switched = true;
                }
            }
        }
        switched
    }

    /// One fixed step of host keys, hot reload and the active screen.
    fn step_once(&mut self) -> StepFlow {
        let keys = HostKeys::read(&self.input);
        if keys.exit {
            return StepFlow::Exit;
        }
        if keys.toggle_overlay {
            self.debug_overlay.toggle();
        }

        // Reloads happen between steps so a scene is never half-updated.
        if keys.reload {
            self.reload_config("manual trigger (R)");
        } else if self.config_watcher.should_reload() {
            self.reload_config("file watcher");
        }

        if self.paused && !self.single_step_requested {
            return StepFlow::Break;
        }
        self.single_step_requested = false;

        let dt = self.time.fixed_dt as f32;
        let now_ms = self.time.now_ms();
        match self.screen {
            Screen::Playing => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.on_update(&self.input, dt, now_ms, &mut self.shapes);
                }
            }
            Screen::GameOver => {
                if self.input.is_just_pressed(Key::Enter) {
                    if let Err(err) = self.start_scene() {
                        log::error!("Restart failed: {}", err);
                    }
                    return StepFlow::Break;
                }
            }
        }

        if self.drain_scene_events() {
            return StepFlow::Break;
        }
        StepFlow::Continue
    }

    fn overlay_stats(&self) -> OverlayStats {
        let mut stats = OverlayStats {
            shape_count: self.shapes.live_count(),
            vertex_count: self.vertex_count,
            paused: self.paused,
            game_over: self.screen == Screen::GameOver,
            ..Default::default()
        };
        if let Some(scene) = &self.scene {
            let player = scene.player();
            let center = scene.grid().center();
            stats.tile_count = scene.grid().len();
            stats.tiles_recycled = scene.grid().recycled_total();
            stats.projectiles = scene.projectiles().len();
            stats.dust_puffs = scene.trail().len();
            stats.player_position = player.position.to_array();
            stats.center_cell = center.to_array();
            stats.facing = player.direction.as_array();
        }
        stats
    }
}

impl StepHost for EngineState {
    fn clock(&mut self) -> &mut TimeState {
        &mut self.time
    }

    fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    fn fixed_step(&mut self) -> StepFlow {
        self.step_once()
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = meadow_platform::window::create_window(event_loop, &self.config)
            .unwrap_or_else(|err| {
                log::error!("{}", err);
                panic!("Window creation failed: {}", err);
            });
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(window));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    if let Some(scene) = state.scene.as_mut() {
                        scene.resize(w, h, &mut state.shapes);
                    }
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.input.release_all();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();

                if run_fixed_steps(state) == StepFlow::Exit {
                    event_loop.exit();
                    return;
                }
                state.time.end_frame();

                // Render phase reads finalized simulation state from this frame.
                let mesh = state.shapes.build_mesh();
                state.vertex_count = mesh.vertices.len();
                state
                    .shape_pipeline
                    .upload(&state.gpu.device, &state.gpu.queue, &mesh);

                let (width, height) = state.gpu.size;
                let full = ViewportRect::full(width, height);
                let idle_camera = Camera2D::new(width, height);
                let minimap_rect = match &state.scene {
                    Some(scene) => {
                        let rig = scene.rig();
                        state
                            .main_binding
                            .update(&state.gpu.queue, rig.main_camera());
                        state
                            .minimap_binding
                            .update(&state.gpu.queue, rig.minimap_camera());
                        state
                            .screen_binding
                            .update(&state.gpu.queue, rig.screen_camera());
                        Some(rig.minimap_rect())
                    }
                    None => {
                        state.main_binding.update(&state.gpu.queue, &idle_camera);
                        state
                            .screen_binding
                            .update(&state.gpu.queue, &Camera2D::screen(width, height));
                        None
                    }
                };

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let (egui_primitives, egui_textures_delta, overlay_actions) = {
                    let stats = state.overlay_stats();
                    state
                        .debug_overlay
                        .prepare(&state.window, &state.time, Some(stats))
                };

                // Handle overlay button actions
                if overlay_actions.toggle_pause {
                    state.paused = !state.paused;
                    log::info!(
                        "Simulation {}",
                        if state.paused { "PAUSED" } else { "RESUMED" }
                    );
                }
                if overlay_actions.single_step {
                    state.single_step_requested = true;
                }
                if overlay_actions.restart {
                    if let Err(err) = state.start_scene() {
                        log::error!("Restart failed: {}", err);
                    }
                }
                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [width, height],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let clear_color = match state.screen {
                        Screen::Playing => MEADOW_CLEAR,
                        Screen::GameOver => GAME_OVER_CLEAR,
                    };
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    let pipeline = &state.shape_pipeline;
                    let surface = (width, height);
                    pipeline.draw(
                        &mut render_pass,
                        &state.main_binding,
                        full,
                        surface,
                        mesh.world.clone(),
                    );
                    pipeline.draw(
                        &mut render_pass,
                        &state.screen_binding,
                        full,
                        surface,
                        mesh.screen.clone(),
                    );
                    if let Some(rect) = minimap_rect {
                        pipeline.draw(
                            &mut render_pass,
                            &state.minimap_binding,
                            rect,
                            surface,
                            mesh.world.clone(),
                        );
                    }
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyR => Some(Key::R),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Meadow starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
