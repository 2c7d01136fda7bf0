//! Throwing stars: cooldown-gated spawn, straight-line flight, timed expiry.

use std::f32::consts::TAU;

use glam::Vec2;
use meadow_core::draw::{DrawBackend, DrawHandle, Geometry, Rgba};
use meadow_core::tween::{ms_to_us, Tween};

use crate::config::ProjectileConfig;
use crate::error::ConfigError;

const STAR_SCALE: f32 = 0.3;
const STAR_DEPTH: f32 = 30.0;
const STAR_COLOR: u32 = 0xD9DDE3;
const SPIN_TURNS: f32 = 5.0;
const SPIN_PERIOD_US: u64 = 1_000_000;

/// Shared by the player sprite and the projectiles.
pub fn star_geometry() -> Geometry {
    Geometry::Star {
        points: 5,
        inner: 10.0,
        outer: 24.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub spawn_ms: f64,
    pub expires_ms: f64,
    spin: Tween,
    handle: DrawHandle,
}

impl Projectile {
    pub fn rotation_at(&self, now_ms: f64) -> f32 {
        self.spin.sample(ms_to_us(now_ms - self.spawn_ms))
    }
}

pub struct ProjectileManager {
    cooldown_ms: f64,
    speed: f32,
    ttl_ms: f64,
    last_fire_ms: Option<f64>,
    projectiles: Vec<Projectile>,
    next_id: u64,
}

impl ProjectileManager {
    pub fn new(config: &ProjectileConfig) -> Result<Self, ConfigError> {
        if config.cooldown_ms <= 0.0 {
            return Err(ConfigError::NonPositiveCooldown(config.cooldown_ms));
        }
        if config.speed <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed {
                what: "projectile",
                value: config.speed,
            });
        }
        if config.ttl_ms <= 0.0 {
            return Err(ConfigError::NonPositiveTtl(config.ttl_ms));
        }
        Ok(Self {
            cooldown_ms: config.cooldown_ms,
            speed: config.speed,
            ttl_ms: config.ttl_ms,
            last_fire_ms: None,
            projectiles: Vec::new(),
            next_id: 0,
        })
    }

    /// Spawn a star at `origin` heading along `direction`, unless the cooldown
    /// since the previous throw has not elapsed.
    pub fn try_fire(
        &mut self,
        now_ms: f64,
        origin: Vec2,
        direction: Vec2,
        backend: &mut dyn DrawBackend,
    ) -> Option<ProjectileId> {
        if let Some(last) = self.last_fire_ms {
            if now_ms - last < self.cooldown_ms {
                return None;
            }
        }

        let heading = direction.normalize_or_zero();
        let velocity = heading * self.speed;
        let base_rotation = heading.y.atan2(heading.x);
        let spin = Tween::forever(base_rotation, base_rotation + TAU * SPIN_TURNS, SPIN_PERIOD_US);

        let handle = backend.create_filled_shape(&star_geometry(), Rgba::from_hex(STAR_COLOR, 1.0));
        backend.reposition(handle, origin.x, origin.y);
        backend.set_scale(handle, STAR_SCALE, STAR_SCALE);
        backend.set_depth(handle, STAR_DEPTH);
        backend.set_rotation(handle, base_rotation);

        let id = ProjectileId(self.next_id);
        self.next_id += 1;
        self.projectiles.push(Projectile {
            id,
            position: origin,
            velocity,
            spawn_ms: now_ms,
            expires_ms: now_ms + self.ttl_ms,
            spin,
            handle,
        });
        self.last_fire_ms = Some(now_ms);
        log::debug!(
            "Projectile {} thrown at ({:.1}, {:.1}) heading ({:.2}, {:.2})",
            id.0,
            origin.x,
            origin.y,
            heading.x,
            heading.y
        );
        Some(id)
    }

    /// Advance flight by `dt` seconds and drop every projectile whose lifetime
    /// has run out at `now_ms`. A star thrown at `now_ms` stays on its origin
    /// until the next step.
    pub fn update(&mut self, now_ms: f64, dt: f32, backend: &mut dyn DrawBackend) {
        self.projectiles.retain_mut(|p| {
            if now_ms >= p.expires_ms {
                backend.destroy(p.handle);
                return false;
            }
            if now_ms <= p.spawn_ms {
                return true;
            }
            p.position += p.velocity * dt;
            backend.reposition(p.handle, p.position.x, p.position.y);
            backend.set_rotation(p.handle, p.rotation_at(now_ms));
            true
        });
    }

    /// Remove one projectile early. Unknown or already expired ids are ignored.
    pub fn destroy(&mut self, id: ProjectileId, backend: &mut dyn DrawBackend) {
        if let Some(index) = self.projectiles.iter().position(|p| p.id == id) {
            let p = self.projectiles.swap_remove(index);
            backend.destroy(p.handle);
        }
    }

    pub fn active(&self) -> &[Projectile] {
        &self.projectiles
    }

    #[allow(dead_code)]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn release(&mut self, backend: &mut dyn DrawBackend) {
        for p in self.projectiles.drain(..) {
            backend.destroy(p.handle);
        }
    }
}
