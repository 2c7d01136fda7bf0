use thiserror::Error;

/// Rejected tuning values. Returned by constructors and `GameConfig::validate`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("view radius must be positive, got {0}")]
    NonPositiveViewRadius(i32),
    #[error("tile size must be positive, got {0}")]
    NonPositiveTileSize(f32),
    #[error("projectile cooldown must be positive, got {0} ms")]
    NonPositiveCooldown(f64),
    #[error("{what} speed must be positive, got {value}")]
    NonPositiveSpeed { what: &'static str, value: f32 },
    #[error("projectile ttl must be positive, got {0} ms")]
    NonPositiveTtl(f64),
    #[error("dust trail interval must be positive, got {0} ms")]
    NonPositiveTrailInterval(f64),
}
