//! Shape Swarm - a 2D canvas arcade game
//!
//! Core modules:
//! - `sim`: Simulation (entities, physics, collisions, modifiers, tick order)
//! - `session`: Pausable game session wrapping the simulation
//! - `renderer`: Display-list render adapter and drawing surfaces
//! - `random`: Pluggable random sources (seeded PCG, external entropy pool)
//! - `settings`: Tunable game settings

pub mod error;
pub mod input;
pub mod random;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{EntropyError, RenderError, SettingsError, SimError};
pub use random::{EntropyPool, PooledSource, RandomSource, RandomSourceKind};
pub use session::Session;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Hero radius, and radius while the grow modifier is active
    pub const HERO_SIZE: f32 = 20.0;
    pub const HERO_GROWN_SIZE: f32 = 40.0;

    /// Pickup radius
    pub const MODIFIER_SIZE: f32 = 15.0;

    /// Enemy spawn size is ENEMY_MIN_SIZE + [0, ENEMY_SIZE_RANGE)
    pub const ENEMY_MIN_SIZE: f32 = 10.0;
    pub const ENEMY_SIZE_RANGE: f32 = 30.0;
    /// Cap for combine growth
    pub const ENEMY_MAX_SIZE: f32 = 40.0;
    /// Enemy lifetime in ticks is ENEMY_LIFE_MIN + [0, ENEMY_LIFE_RANGE)
    pub const ENEMY_LIFE_MIN: f32 = 400.0;
    pub const ENEMY_LIFE_RANGE: f32 = 600.0;
    /// Enemy approach factor per tick is ENEMY_SPEED_MIN + [0, ENEMY_SPEED_RANGE)
    pub const ENEMY_SPEED_MIN: f32 = 0.03;
    pub const ENEMY_SPEED_RANGE: f32 = 0.06;

    /// Wander targets are picked inside the inner 80% of the field
    pub const TARGET_MARGIN: f32 = 0.1;
    pub const TARGET_SPAN: f32 = 0.8;

    /// Per-axis jitter amplitude (uniform in [-1, 1))
    pub const JITTER: f32 = 1.0;

    /// Enemies drift toward the hero inside HERO_PULL_RANGE * hero.size
    pub const HERO_PULL_RANGE: f32 = 5.0;
    pub const HERO_PULL_STRENGTH: f32 = 0.05;

    /// Distance to target that arms a charge
    pub const CHARGE_TRIGGER_DISTANCE: f32 = 5.0;
    /// Ticks an enemy must have lived before it may charge
    pub const CHARGE_WARMUP_TICKS: u32 = 60;
    /// Rotation added per charging tick
    pub const CHARGE_SPIN: f32 = 0.1;
    /// Score step at which enemies start spinning, and the spin per step
    pub const SPIN_SCORE_STEP: u64 = 100;
    pub const SPIN_PER_STEP: f32 = 0.05;

    /// Auto mode: pickup seek radius and wander arrival radius
    pub const AUTO_SEEK_RADIUS: f32 = 200.0;
    pub const AUTO_ARRIVE_RADIUS: f32 = 15.0;

    /// Manual mode tuning
    pub const POINTER_DEADZONE: f32 = 5.0;
    pub const POINTER_EASING: f32 = 0.1;
    pub const MANUAL_SPEED_SCALE: f32 = 100.0;
    pub const KEY_IMPULSE_SCALE: f32 = 20.0;
    pub const KEY_BOOST: f32 = 1.5;
    pub const MANUAL_DRAG: f32 = 0.9;

    /// Hero trail
    pub const TRAIL_LENGTH: usize = 20;
    pub const TRAIL_FADE: f32 = 0.05;
    pub const TRAIL_MIN_SIZE: f32 = 5.0;
    pub const TRAIL_MAX_SIZE: f32 = 20.0;

    /// Modifier buff duration
    pub const MODIFIER_DURATION_TICKS: i32 = 600;
    /// One banked charge per this many score points
    pub const SCORE_PER_CHARGE: u64 = 10;
    /// Real-time cooldown between automatic activations
    pub const AUTO_ACTIVATION_COOLDOWN_MS: f64 = 5000.0;
    /// Real-time delay between shield activation and detonation
    pub const SHIELD_DELAY_MS: f64 = 500.0;
    /// Aim assist destroys enemies inside AIM_ASSIST_RANGE * hero.size
    pub const AIM_ASSIST_RANGE: f32 = 10.0;

    /// Edge flash
    pub const FLASH_TICKS: u32 = 10;
    pub const EDGE_FLASH_WIDTH: f32 = 20.0;

    /// Explosion
    pub const EXPLOSION_LIFE: u32 = 30;
    pub const EXPLOSION_PARTICLES: usize = 10;

    /// Pointer click spawns this many enemies within +-CLICK_SPREAD/2
    pub const CLICK_SPAWN_COUNT: usize = 3;
    pub const CLICK_SPREAD: f32 = 50.0;

    /// Default field size before the host reports a canvas size
    pub const DEFAULT_FIELD_WIDTH: f32 = 1280.0;
    pub const DEFAULT_FIELD_HEIGHT: f32 = 720.0;
}

/// Map a uniform draw to a coordinate inside the inner band of `range`
#[inline]
pub fn inner_coordinate(range: f32, r: f32) -> f32 {
    range * consts::TARGET_MARGIN + r * range * consts::TARGET_SPAN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inner_coordinate_bounds() {
        assert_eq!(inner_coordinate(1000.0, 0.0), 100.0);
        assert!((inner_coordinate(1000.0, 0.999_999) - 900.0).abs() < 0.01);
    }
}
