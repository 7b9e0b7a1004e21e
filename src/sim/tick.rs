//! Simulation tick
//!
//! Advances the world by one frame. Ordering matters: each phase sees the
//! results of the phases before it.

use super::collision;
use super::modifiers::{self, ActiveEffects};
use super::shape::{Shape, UpdateContext};
use super::state::World;
use crate::consts::AUTO_SEEK_RADIUS;
use crate::error::SimError;

/// Advance the world by one tick
///
/// `now_ms` is wall-clock time, used only for the auto-activation cooldown
/// and deferred tasks.
pub fn tick(world: &mut World, now_ms: f64) -> Result<(), SimError> {
    world.run_due_tasks(now_ms);
    world.time_ticks += 1;

    spawn(world);

    let effects = ActiveEffects::from_modifiers(&world.active_modifiers);
    update_shapes(world, effects);

    for explosion in &mut world.explosions {
        explosion.update();
    }
    world.explosions.retain(|e| !e.is_done());

    world.shapes.retain(Shape::is_alive);

    modifiers::tick_timers(world);
    modifiers::prune_expired(world);

    collision::resolve(world);

    modifiers::award_charges(world);
    modifiers::auto_activate(world, now_ms);

    world.flash_frame = world.flash.advance();

    world.validate()
}

fn spawn(world: &mut World) {
    let roll = world.rng().next_f32();
    if roll < world.settings.spawn_rate && world.live_enemy_count() < world.settings.max_shapes {
        world.spawn_enemy(None);
    }

    let pickup_rate = world.settings.pickup_spawn_rate;
    if pickup_rate > 0.0 && world.rng().next_f32() < pickup_rate {
        world.spawn_random_modifier();
    }
}

/// Update every shape in stored order
///
/// The hero snapshot is retaken for each shape, so enemies after the hero see
/// where it moved to this tick.
fn update_shapes(world: &mut World, effects: ActiveEffects) {
    let mut shapes = std::mem::take(&mut world.shapes);
    let input = world.input.clone();

    for i in 0..shapes.len() {
        let hero = shapes.iter().find(|s| s.is_hero()).map(Shape::snapshot);
        let pickup = if shapes[i].is_hero() {
            let pos = shapes[i].pos;
            shapes
                .iter()
                .find(|s| s.is_modifier() && s.distance_to(pos) < AUTO_SEEK_RADIUS)
                .map(|s| s.pos)
        } else {
            None
        };

        let ctx = UpdateContext {
            effects,
            mode: world.mode,
            input: &input,
            mouse_sensitivity: world.settings.mouse_sensitivity,
            field: world.field,
            hero,
            score: world.score,
            pickup,
        };
        shapes[i].update(&ctx, world.rng());
    }

    world.shapes = shapes;
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::random::ScriptedSource;
    use crate::settings::Settings;
    use crate::sim::modifiers::ActiveModifier;
    use crate::sim::shape::{GameMode, ModifierKind};

    fn quiet_settings() -> Settings {
        Settings {
            spawn_rate: 0.0,
            ..Settings::default()
        }
    }

    fn world_with(settings: Settings, value: f32) -> World {
        World::new(
            settings,
            Vec2::new(1000.0, 1000.0),
            Box::new(ScriptedSource::constant(value)),
        )
    }

    #[test]
    fn test_tick_advances_time() {
        let mut world = world_with(quiet_settings(), 0.5);
        tick(&mut world, 0.0).unwrap();
        tick(&mut world, 16.0).unwrap();
        assert_eq!(world.time_ticks, 2);
        assert_eq!(world.hero().unwrap().age, 2);
    }

    #[test]
    fn test_spawn_respects_cap() {
        let settings = Settings {
            spawn_rate: 1.0,
            max_shapes: 2,
            ..Settings::default()
        };
        // a constant draw of 0.5 spawns every tick
        let mut world = world_with(settings, 0.5);
        for _ in 0..5 {
            tick(&mut world, 0.0).unwrap();
        }
        assert!(world.live_enemy_count() <= 2);
    }

    #[test]
    fn test_zero_spawn_rate_never_spawns() {
        let mut world = world_with(quiet_settings(), 0.0);
        for _ in 0..50 {
            tick(&mut world, 0.0).unwrap();
        }
        assert_eq!(world.live_enemy_count(), 0);
    }

    #[test]
    fn test_freeze_stops_enemies_then_reverts() {
        let mut world = world_with(quiet_settings(), 0.5);
        world.hero_mut().unwrap().pos = Vec2::new(900.0, 900.0);
        let id = world.spawn_enemy(Some(Vec2::new(100.0, 100.0)));
        let mut freeze = ActiveModifier::new(ModifierKind::Freeze);
        freeze.timer = 1;
        world.active_modifiers.push(freeze);

        tick(&mut world, 0.0).unwrap();
        let enemy = world.shape(id).unwrap();
        assert_eq!(enemy.speed, 0.0);
        assert!(world.active_modifiers.is_empty());

        tick(&mut world, 16.0).unwrap();
        let enemy = world.shape(id).unwrap();
        assert_eq!(enemy.speed, enemy.base_speed);
    }

    #[test]
    fn test_auto_hero_targets_near_pickup() {
        let mut world = world_with(quiet_settings(), 0.5);
        world.hero_mut().unwrap().pos = Vec2::new(500.0, 500.0);
        world.spawn_modifier(ModifierKind::Grow, Vec2::new(600.0, 500.0));
        tick(&mut world, 0.0).unwrap();
        assert_eq!(world.hero().unwrap().target, Vec2::new(600.0, 500.0));
    }

    #[test]
    fn test_manual_hero_ignores_pickup() {
        let mut world = world_with(quiet_settings(), 0.5);
        world.set_mode(GameMode::Manual);
        world.hero_mut().unwrap().pos = Vec2::new(500.0, 500.0);
        world.spawn_modifier(ModifierKind::Grow, Vec2::new(600.0, 500.0));
        let before = world.hero().unwrap().target;
        tick(&mut world, 0.0).unwrap();
        assert_eq!(world.hero().unwrap().target, before);
    }

    #[test]
    fn test_score_past_threshold_awards_and_activates() {
        let mut world = world_with(quiet_settings(), 0.0);
        world.score = 10;
        tick(&mut world, 10_000.0).unwrap();
        // awarded then immediately auto-activated
        assert_eq!(world.bank.total(), 0);
        assert_eq!(world.active_modifiers.len(), 1);
        assert_eq!(world.last_auto_activation_ms, 10_000.0);
    }

    #[test]
    fn test_determinism() {
        let settings = Settings {
            spawn_rate: 0.5,
            pickup_spawn_rate: 0.05,
            ..Settings::default()
        };
        let field = Vec2::new(800.0, 600.0);
        let mut a = World::seeded(settings.clone(), field, 4242);
        let mut b = World::seeded(settings, field, 4242);
        for frame in 0..300 {
            let now = frame as f64 * 16.0;
            tick(&mut a, now).unwrap();
            tick(&mut b, now).unwrap();
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.shapes, b.shapes);
        assert_eq!(a.explosions.len(), b.explosions.len());
    }
}
