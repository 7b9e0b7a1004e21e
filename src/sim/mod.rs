//! Simulation module
//!
//! All gameplay logic lives here:
//! - One tick per animation frame, no delta time
//! - Randomness only through the world's `RandomSource`
//! - Stable iteration order (stored order of `World::shapes`)
//! - No rendering or platform dependencies

pub mod collision;
pub mod explosion;
pub mod modifiers;
pub mod scheduler;
pub mod shape;
pub mod state;
pub mod tick;

pub use collision::{destroy_shapes, resolve, trigger_collision};
pub use explosion::{Explosion, Particle};
pub use modifiers::{ActiveEffects, ActiveModifier, ModifierBank};
pub use scheduler::{DeferredTask, Scheduler};
pub use shape::{
    Enemy, EnemyKind, GameMode, HeroSnapshot, ModifierKind, Role, Shape, ShapeColor, TrailPoint,
};
pub use state::{EdgeFlash, FlashFrame, GameEvent, HudSnapshot, ShapeStats, World};
pub use tick::tick;
