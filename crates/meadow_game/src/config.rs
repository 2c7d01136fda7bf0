use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/meadow.json";

/// Tuning file. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the grass decorator.
    pub seed: u64,
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub projectiles: ProjectileConfig,
    pub trail: TrailConfig,
    pub camera: CameraConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub view_radius: i32,
    pub tile_size: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub speed: f32,
    pub start_x: f32,
    pub start_y: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProjectileConfig {
    pub cooldown_ms: f64,
    pub speed: f32,
    pub ttl_ms: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrailConfig {
    pub interval_ms: f64,
    pub lifetime_ms: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub zoom: f32,
    pub minimap_zoom: f32,
    /// Minimap size as a fraction of the viewport on each axis.
    pub minimap_fraction: f32,
    pub minimap_margin: f32,
    pub minimap_alpha: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed_6a55,
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            projectiles: ProjectileConfig::default(),
            trail: TrailConfig::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            view_radius: 20,
            tile_size: 64.0,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 300.0,
            start_x: 0.0,
            start_y: 0.0,
        }
    }
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 500.0,
            speed: 400.0,
            ttl_ms: 2000.0,
        }
    }
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100.0,
            lifetime_ms: 500.0,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            zoom: 1.5,
            minimap_zoom: 0.2,
            minimap_fraction: 0.2,
            minimap_margin: 20.0,
            minimap_alpha: 0.8,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.view_radius <= 0 {
            return Err(ConfigError::NonPositiveViewRadius(self.world.view_radius));
        }
        if self.world.tile_size <= 0.0 {
            return Err(ConfigError::NonPositiveTileSize(self.world.tile_size));
        }
        if self.player.speed <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed {
                what: "player",
                value: self.player.speed,
            });
        }
        if self.projectiles.cooldown_ms <= 0.0 {
            return Err(ConfigError::NonPositiveCooldown(self.projectiles.cooldown_ms));
        }
        if self.projectiles.speed <= 0.0 {
            return Err(ConfigError::NonPositiveSpeed {
                what: "projectile",
                value: self.projectiles.speed,
            });
        }
        if self.projectiles.ttl_ms <= 0.0 {
            return Err(ConfigError::NonPositiveTtl(self.projectiles.ttl_ms));
        }
        if self.trail.interval_ms <= 0.0 {
            return Err(ConfigError::NonPositiveTrailInterval(self.trail.interval_ms));
        }
        if self.camera.minimap_fraction <= 0.0 || self.camera.minimap_fraction > 1.0 {
            log::warn!(
                "minimap_fraction {} is outside (0, 1]; the minimap may be hidden or cover the screen",
                self.camera.minimap_fraction
            );
        }
        Ok(())
    }
}

/// Polls the config file's mtime so edits are picked up at frame boundaries.
pub struct ConfigWatcher {
    config_path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(config_path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&config_path);
        Self {
            config_path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.config_path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_config_from_path(config_path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read config file {}: {e}", config_path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", config_path.display()))?;
    config
        .validate()
        .map_err(|e| format!("Config validation failed for {}: {e}", config_path.display()))?;
    Ok(config)
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}
