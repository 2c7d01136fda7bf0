//! Dust puffs kicked up behind a moving player.
//!
//! Emission runs on a fixed cadence of the simulation clock whether or not the
//! player moves; a tick only produces a puff while moving. Each puff samples
//! its fade and growth from its own spawn time and is destroyed once its
//! lifetime has passed.

use glam::Vec2;
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};
use meadow_core::tween::{ms_to_us, Tween};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::TrailConfig;
use crate::error::ConfigError;

const DUST_COLOR: u32 = 0xF7E9C3;
const DUST_ALPHA: f32 = 0.7;
const DUST_DEPTH: f32 = 10.0;
/// Puffs appear at the player's feet.
pub const FOOT_OFFSET: Vec2 = Vec2::new(0.0, 10.0);

#[derive(Debug, Clone)]
pub struct DustPuff {
    #[allow(dead_code)]
    pub position: Vec2,
    pub spawn_ms: f64,
    pub expires_ms: f64,
    handle: DrawHandle,
}

pub struct DustTrail {
    interval_ms: f64,
    lifetime_ms: f64,
    next_tick_ms: f64,
    fade: Tween,
    grow: Tween,
    puffs: Vec<DustPuff>,
    rng: Pcg32,
    emitted_total: u64,
}

impl DustTrail {
    /// The first tick is due one interval after `now_ms`.
    pub fn new(config: &TrailConfig, seed: u64, now_ms: f64) -> Result<Self, ConfigError> {
        if config.interval_ms <= 0.0 {
            return Err(ConfigError::NonPositiveTrailInterval(config.interval_ms));
        }
        let lifetime_us = ms_to_us(config.lifetime_ms);
        Ok(Self {
            interval_ms: config.interval_ms,
            lifetime_ms: config.lifetime_ms.max(0.0),
            next_tick_ms: now_ms + config.interval_ms,
            fade: Tween::once(1.0, 0.0, lifetime_us),
            grow: Tween::once(1.0, 2.0, lifetime_us),
            puffs: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            emitted_total: 0,
        })
    }

    /// Run the emitter and age existing puffs up to `now_ms`.
    pub fn update(
        &mut self,
        now_ms: f64,
        player_position: Vec2,
        moving: bool,
        backend: &mut dyn DrawBackend,
    ) {
        if now_ms >= self.next_tick_ms {
            if moving {
                self.spawn(now_ms, player_position + FOOT_OFFSET, backend);
            }
            // Missed ticks after a stall collapse into this one.
            while self.next_tick_ms <= now_ms {
                self.next_tick_ms += self.interval_ms;
            }
        }

        let fade = self.fade;
        let grow = self.grow;
        self.puffs.retain(|puff| {
            if now_ms >= puff.expires_ms {
                backend.destroy(puff.handle);
                return false;
            }
            let elapsed = ms_to_us(now_ms - puff.spawn_ms);
            let scale = grow.sample(elapsed);
            backend.set_alpha(puff.handle, fade.sample(elapsed));
            backend.set_scale(puff.handle, scale, scale);
            true
        });
    }

    fn spawn(&mut self, now_ms: f64, position: Vec2, backend: &mut dyn DrawBackend) {
        let radius = self.rng.random_range(3..=8) as f32;
        let handle = backend.create_filled_shape(
            &Geometry::Circle { radius },
            Rgba::from_hex(DUST_COLOR, DUST_ALPHA),
        );
        backend.reposition(handle, position.x, position.y);
        backend.set_depth(handle, DUST_DEPTH);
        self.puffs.push(DustPuff {
            position,
            spawn_ms: now_ms,
            expires_ms: now_ms + self.lifetime_ms,
            handle,
        });
        self.emitted_total += 1;
    }

    #[allow(dead_code)]
    pub fn puffs(&self) -> &[DustPuff] {
        &self.puffs
    }

    pub fn len(&self) -> usize {
        self.puffs.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.puffs.is_empty()
    }

    #[allow(dead_code)]
    pub fn emitted_total(&self) -> u64 {
        self.emitted_total
    }

    pub fn release(&mut self, backend: &mut dyn DrawBackend) {
        for puff in self.puffs.drain(..) {
            backend.destroy(puff.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_render::ShapeStore;

    fn trail() -> DustTrail {
        DustTrail::new(&TrailConfig::default(), 9, 0.0).expect("default trail config is valid")
    }

    #[test]
    fn no_puffs_while_idle() {
        let mut store = ShapeStore::new();
        let mut t = trail();
        for step in 0..60 {
            t.update(step as f64 * 16.667, Vec2::ZERO, false, &mut store);
        }
        assert!(t.is_empty());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn emits_on_each_tick_while_moving() {
        let mut store = ShapeStore::new();
        let mut t = trail();
        t.update(50.0, Vec2::ZERO, true, &mut store);
        assert!(t.is_empty(), "first tick is one interval in");
        t.update(100.0, Vec2::new(4.0, 4.0), true, &mut store);
        assert_eq!(t.len(), 1);
        assert_eq!(t.puffs()[0].position, Vec2::new(4.0, 14.0));
        t.update(150.0, Vec2::ZERO, true, &mut store);
        t.update(200.0, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 2);
    }

    #[test]
    fn cadence_starts_from_creation_time() {
        let mut store = ShapeStore::new();
        let mut t = DustTrail::new(&TrailConfig::default(), 9, 5_000.0).expect("valid config");
        t.update(5_016.667, Vec2::ZERO, true, &mut store);
        t.update(5_083.0, Vec2::ZERO, true, &mut store);
        assert!(t.is_empty(), "no puff before one interval has passed");
        t.update(5_100.0, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 1);
        t.update(5_116.667, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 1);
    }

    #[test]
    fn stall_emits_once() {
        let mut store = ShapeStore::new();
        let mut t = trail();
        t.update(450.0, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 1);
        t.update(480.0, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 1);
        t.update(500.0, Vec2::ZERO, true, &mut store);
        assert_eq!(t.emitted_total(), 2);
    }

    #[test]
    fn puff_fades_grows_and_dies() {
        let mut store = ShapeStore::new();
        let mut t = trail();
        t.update(100.0, Vec2::ZERO, true, &mut store);
        let handle = t.puffs()[0].handle;
        let start = store.transform(handle).expect("puff alive");
        assert_eq!(start.depth, 10.0);

        t.update(350.0, Vec2::ZERO, false, &mut store);
        let mid = store.transform(handle).expect("puff alive");
        assert!((mid.alpha - 0.5).abs() < 1e-4);
        assert!((mid.scale.x - 1.5).abs() < 1e-4);

        t.update(599.0, Vec2::ZERO, false, &mut store);
        assert!(store.is_alive(handle));
        t.update(600.0, Vec2::ZERO, false, &mut store);
        assert!(!store.is_alive(handle));
        assert!(t.is_empty());
    }

    #[test]
    fn release_destroys_live_puffs() {
        let mut store = ShapeStore::new();
        let mut t = trail();
        t.update(100.0, Vec2::ZERO, true, &mut store);
        t.update(200.0, Vec2::ZERO, true, &mut store);
        t.release(&mut store);
        assert_eq!(store.live_count(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn rejects_zero_interval() {
        let config = TrailConfig {
            interval_ms: 0.0,
            ..TrailConfig::default()
        };
        assert_eq!(
            DustTrail::new(&config, 0, 0.0).err(),
            Some(ConfigError::NonPositiveTrailInterval(0.0))
        );
    }
}
