//! The meadow scene: tiles, player, shadow, projectiles, dust and cameras,
//! stepped once per fixed update.

use std::sync::mpsc::Sender;

use glam::{IVec2, Vec2};
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};
use meadow_core::input::{InputState, Key};

use crate::camera_rig::CameraRig;
use crate::config::GameConfig;
use crate::decorator::GrassDecorator;
use crate::error::ConfigError;
use crate::player::{PlayerController, PlayerInput};
use crate::projectile::{star_geometry, ProjectileManager};
use crate::tile_grid::TileGrid;
use crate::trail::{DustTrail, FOOT_OFFSET};

const PLAYER_COLOR: u32 = 0xFF9900;
const PLAYER_DEPTH: f32 = 20.0;
const SHADOW_DEPTH: f32 = 15.0;
const SHADOW_ALPHA: f32 = 0.5;

/// Notifications from the scene to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    Ready,
    TransitionRequested,
}

/// Comparable summary of simulation state, used by replays.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    pub player_position: Vec2,
    pub player_velocity: Vec2,
    pub facing: [i8; 2],
    pub center_cell: IVec2,
    pub tiles: Vec<(i32, i32)>,
    pub tiles_recycled: u64,
    pub projectiles: Vec<Vec2>,
    pub dust_puffs: usize,
}

pub struct GameScene {
    events: Sender<SceneEvent>,
    grid: TileGrid,
    player: PlayerController,
    player_handle: DrawHandle,
    shadow: DrawHandle,
    projectiles: ProjectileManager,
    trail: DustTrail,
    rig: CameraRig,
    transition_requested: bool,
}

impl GameScene {
    pub fn on_create(
        config: &GameConfig,
        events: Sender<SceneEvent>,
        viewport: (u32, u32),
        now_ms: f64,
        backend: &mut dyn DrawBackend,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let start = Vec2::new(config.player.start_x, config.player.start_y);

        let projectiles = ProjectileManager::new(&config.projectiles)?;
        let trail = DustTrail::new(&config.trail, config.seed.rotate_left(17), now_ms)?;
        let mut decorator = GrassDecorator::new(config.seed);
        let grid = TileGrid::initialize(
            config.world.view_radius,
            config.world.tile_size,
            start,
            &mut decorator,
            backend,
        )?;

        let player = PlayerController::new(start, config.player.speed);
        let player_handle =
            backend.create_filled_shape(&star_geometry(), Rgba::from_hex(PLAYER_COLOR, 1.0));
        backend.set_depth(player_handle, PLAYER_DEPTH);

        let shadow = backend.create_filled_shape(
            &Geometry::Ellipse {
                half_w: 15.0,
                half_h: 7.5,
            },
            Rgba::BLACK.with_alpha(SHADOW_ALPHA),
        );
        backend.set_depth(shadow, SHADOW_DEPTH);

        let rig = CameraRig::new(&config.camera, viewport, start, backend);

        let mut scene = Self {
            events,
            grid,
            player,
            player_handle,
            shadow,
            projectiles,
            trail,
            rig,
            transition_requested: false,
        };
        scene.present_player(backend);
        scene.emit(SceneEvent::Ready);
        log::info!("Meadow scene created at ({:.1}, {:.1})", start.x, start.y);
        Ok(scene)
    }

    /// One fixed simulation step.
    pub fn on_update(
        &mut self,
        input: &InputState,
        dt: f32,
        now_ms: f64,
        backend: &mut dyn DrawBackend,
    ) {
        self.player
            .update(PlayerInput::from_input(input), dt, now_ms);
        self.grid.recenter(self.player.position, backend);

        if input.is_just_pressed(Key::Space) {
            self.projectiles.try_fire(
                now_ms,
                self.player.position,
                self.player.direction.as_vec2(),
                backend,
            );
        }
        self.projectiles.update(now_ms, dt, backend);

        self.rig.sync(self.player.position, backend);
        self.present_player(backend);
        self.trail.update(
            now_ms,
            self.player.position,
            self.player.is_moving(),
            backend,
        );

        if input.is_just_pressed(Key::Enter) {
            self.request_scene_transition();
        }
    }

    fn present_player(&self, backend: &mut dyn DrawBackend) {
        let p = self.player.position;
        let flip = if self.player.flip_x { -1.0 } else { 1.0 };
        backend.reposition(self.player_handle, p.x, p.y);
        backend.set_rotation(self.player_handle, self.player.rotation);
        backend.set_scale(
            self.player_handle,
            self.player.scale * flip,
            self.player.scale,
        );
        let feet = p + FOOT_OFFSET;
        backend.reposition(self.shadow, feet.x, feet.y);
    }

    /// Ask the host to leave this scene. Only the first request is sent.
    pub fn request_scene_transition(&mut self) {
        if self.transition_requested {
            return;
        }
        self.transition_requested = true;
        log::info!("Scene transition requested");
        self.emit(SceneEvent::TransitionRequested);
    }

    fn emit(&self, event: SceneEvent) {
        if self.events.send(event).is_err() {
            log::warn!("Scene event {:?} dropped: host receiver is gone", event);
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, backend: &mut dyn DrawBackend) {
        self.rig.resize(width, height, backend);
    }

    /// Destroy every drawable the scene owns.
    pub fn teardown(mut self, backend: &mut dyn DrawBackend) {
        self.grid.release(backend);
        self.projectiles.release(backend);
        self.trail.release(backend);
        self.rig.release(backend);
        backend.destroy(self.player_handle);
        backend.destroy(self.shadow);
        log::info!("Meadow scene torn down");
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn projectiles(&self) -> &ProjectileManager {
        &self.projectiles
    }

    pub fn trail(&self) -> &DustTrail {
        &self.trail
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    #[allow(dead_code)]
    pub fn transition_requested(&self) -> bool {
        self.transition_requested
    }

    #[allow(dead_code)]
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            player_position: self.player.position,
            player_velocity: self.player.velocity,
            facing: self.player.direction.as_array(),
            center_cell: self.grid.center(),
            tiles: self
                .grid
                .tiles()
                .iter()
                .map(|t| (t.grid_x, t.grid_y))
                .collect(),
            tiles_recycled: self.grid.recycled_total(),
            projectiles: self.projectiles.active().iter().map(|p| p.position).collect(),
            dust_puffs: self.trail.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_render::ShapeStore;
    use std::sync::mpsc;

    const DT: f32 = 1.0 / 60.0;

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.world.view_radius = 3;
        config
    }

    fn create(store: &mut ShapeStore) -> (GameScene, mpsc::Receiver<SceneEvent>) {
        let (tx, rx) = mpsc::channel();
        let scene = GameScene::on_create(&small_config(), tx, (1024, 768), 0.0, store)
            .expect("scene builds");
        (scene, rx)
    }

    #[test]
    fn create_emits_ready_and_builds_world() {
        let mut store = ShapeStore::new();
        let (scene, rx) = create(&mut store);
        assert_eq!(rx.try_recv(), Ok(SceneEvent::Ready));
        assert_eq!(scene.grid().len(), 49);
        // tiles + player + shadow + backdrop + border + marker
        assert_eq!(store.live_count(), 49 + 5);
        let shadow = store.transform(scene.shadow).expect("shadow alive");
        assert_eq!(shadow.position, Vec2::new(0.0, 10.0));
        assert_eq!(shadow.depth, 15.0);
    }

    #[test]
    fn invalid_config_is_rejected_before_drawing() {
        let mut store = ShapeStore::new();
        let mut config = small_config();
        config.world.view_radius = -1;
        let (tx, _rx) = mpsc::channel();
        let result = GameScene::on_create(&config, tx, (800, 600), 0.0, &mut store);
        assert_eq!(result.err(), Some(ConfigError::NonPositiveViewRadius(-1)));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn throw_uses_facing_and_edge_trigger() {
        let mut store = ShapeStore::new();
        let (mut scene, _rx) = create(&mut store);
        let mut input = InputState::new();
        input.key_down(Key::Space);
        scene.on_update(&input, DT, 0.0, &mut store);
        assert_eq!(scene.projectiles().len(), 1);
        assert_eq!(scene.projectiles().active()[0].position, scene.player().position);

        // Still held but no longer just pressed: no second throw.
        input.end_frame();
        scene.on_update(&input, DT, 600.0, &mut store);
        assert_eq!(scene.projectiles().len(), 1);

        let v = scene.projectiles().active()[0].velocity;
        assert_eq!(v, Vec2::new(400.0, 0.0));
    }

    #[test]
    fn moving_updates_player_shadow_and_marker() {
        let mut store = ShapeStore::new();
        let (mut scene, _rx) = create(&mut store);
        let mut input = InputState::new();
        input.key_down(Key::Left);
        for step in 0..10u32 {
            scene.on_update(&input, 0.1, step as f64 * 100.0, &mut store);
        }
        let p = scene.player().position;
        assert!((p.x + 300.0).abs() < 1e-3);
        assert_eq!(scene.player().direction.as_array(), [-1, 0]);
        assert_eq!(scene.rig().main_camera().position, p);
        let player_t = store.transform(scene.player_handle).expect("player alive");
        assert!(player_t.scale.x < 0.0, "moving left flips the sprite");
        assert!(scene.trail().emitted_total() > 0);
        assert!(scene.grid().covers_window());
        assert_eq!(scene.grid().center(), IVec2::new(-5, 0));
    }

    #[test]
    fn enter_requests_one_transition() {
        let mut store = ShapeStore::new();
        let (mut scene, rx) = create(&mut store);
        let _ = rx.try_recv();
        let mut input = InputState::new();
        input.key_down(Key::Enter);
        scene.on_update(&input, DT, 0.0, &mut store);
        scene.on_update(&input, DT, 16.0, &mut store);
        scene.request_scene_transition();
        assert_eq!(rx.try_recv(), Ok(SceneEvent::TransitionRequested));
        assert!(rx.try_recv().is_err());
        assert!(scene.transition_requested());
    }

    #[test]
    fn dropped_receiver_does_not_panic() {
        let mut store = ShapeStore::new();
        let (mut scene, rx) = create(&mut store);
        drop(rx);
        scene.request_scene_transition();
    }

    #[test]
    fn teardown_releases_every_drawable_once() {
        let mut store = ShapeStore::new();
        let (mut scene, _rx) = create(&mut store);
        let mut input = InputState::new();
        input.key_down(Key::Down);
        input.key_down(Key::Space);
        for step in 0..30u32 {
            scene.on_update(&input, DT, step as f64 * 50.0, &mut store);
            input.end_frame();
        }
        scene.resize(640, 480, &mut store);
        scene.teardown(&mut store);
        assert_eq!(store.live_count(), 0);
        assert_eq!(store.created_total(), store.destroyed_total());
    }
}
