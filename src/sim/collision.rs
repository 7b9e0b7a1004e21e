//! Collision detection and resolution
//!
//! One pass per tick after every shape has moved. Removals are collected
//! into a pending set and applied once the whole pairwise scan is done.

use std::collections::BTreeSet;

use super::explosion::Explosion;
use super::modifiers::ActiveModifier;
use super::shape::Role;
use super::state::{GameEvent, World};
use crate::consts::FLASH_TICKS;

/// Shared destroy-and-reward side effect for the shape at `index`
///
/// Flashes the field edges in the shape's colour, leaves an explosion,
/// scores a point and bumps the kind and colour counters. The shape itself
/// is not removed here.
pub fn trigger_collision(world: &mut World, index: usize) {
    let Some(shape) = world.shapes.get(index) else {
        return;
    };
    let (id, pos, size, color) = (shape.id, shape.pos, shape.size, shape.color);
    let kind = shape.enemy_state().map(|e| e.kind);

    world.flash.start(color, FLASH_TICKS);
    let explosion = Explosion::new(pos, size, color, world.rng());
    world.explosions.push(explosion);
    world.score += 1;
    if let Some(kind) = kind {
        world.stats.record(kind);
    }
    *world.color_counts.entry(color.key()).or_insert(0) += 1;

    log::debug!("Shape {} destroyed, score {}", id, world.score);
    world.events.push(GameEvent::ShapeDestroyed { kind, pos, score: world.score });
}

/// Trigger each index, then remove them all in one pass
pub fn destroy_shapes(world: &mut World, indices: impl IntoIterator<Item = usize>) {
    let indices: BTreeSet<usize> = indices.into_iter().collect();
    for &i in &indices {
        trigger_collision(world, i);
    }
    remove_indices(world, &indices);
}

fn remove_indices(world: &mut World, indices: &BTreeSet<usize>) {
    if indices.is_empty() {
        return;
    }
    let mut i = 0;
    world.shapes.retain(|_| {
        let keep = !indices.contains(&i);
        i += 1;
        keep
    });
}

/// Resolve every contact for this tick
///
/// - hero touching a pickup: the pickup becomes an active buff
/// - hero touching anything else: collision trigger
/// - same-kind enemies: the earlier one absorbs the later one
/// - different-kind enemies: both lose health equal to the other's size
pub fn resolve(world: &mut World) {
    let mut pending: BTreeSet<usize> = BTreeSet::new();
    let n = world.shapes.len();

    for i in 0..n {
        if world.shapes[i].is_hero() {
            for j in 0..n {
                if i == j || !world.shapes[i].collides_with(&world.shapes[j]) {
                    continue;
                }
                match world.shapes[j].role {
                    Role::Modifier { kind, .. } => {
                        log::debug!("Picked up {}", kind.glyph());
                        world.active_modifiers.push(ActiveModifier::new(kind));
                        world.events.push(GameEvent::ModifierCollected { kind });
                    }
                    _ => trigger_collision(world, j),
                }
                pending.insert(j);
            }
            continue;
        }

        for j in (i + 1)..n {
            let (a, b) = (&world.shapes[i], &world.shapes[j]);
            if b.is_hero() || !a.collides_with(b) {
                continue;
            }
            let (Some(ea), Some(eb)) = (a.enemy_state(), b.enemy_state()) else {
                continue;
            };

            if ea.kind == eb.kind {
                let absorbed = b.size;
                world.shapes[i].combine_with(absorbed);
                pending.insert(j);
            } else {
                let (size_a, size_b) = (a.size, b.size);
                let dead_a = damage(world, i, size_b);
                let dead_b = damage(world, j, size_a);
                if dead_a {
                    pending.insert(i);
                }
                if dead_b {
                    pending.insert(j);
                }
            }
        }
    }

    remove_indices(world, &pending);
}

/// Subtract health; true when the enemy is now dead
fn damage(world: &mut World, index: usize, amount: f32) -> bool {
    match world.shapes[index].enemy_state_mut() {
        Some(enemy) => {
            enemy.health -= amount;
            enemy.health <= 0.0
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::random::ScriptedSource;
    use crate::settings::Settings;
    use crate::sim::shape::{EnemyKind, ModifierKind};

    fn world() -> World {
        let mut w = World::new(
            Settings::default(),
            Vec2::new(1000.0, 1000.0),
            Box::new(ScriptedSource::constant(0.5)),
        );
        // park the hero in a corner away from the action
        if let Some(hero) = w.hero_mut() {
            hero.pos = Vec2::new(950.0, 950.0);
        }
        w
    }

    fn enemy(w: &mut World, kind: EnemyKind, pos: Vec2, size: f32) -> u32 {
        let id = w.spawn_enemy(Some(pos));
        let shape = w.shapes.iter_mut().find(|s| s.id == id).unwrap();
        shape.size = size;
        let e = shape.enemy_state_mut().unwrap();
        e.kind = kind;
        e.health = size * 2.0;
        id
    }

    #[test]
    fn test_same_kind_merges_into_earlier() {
        let mut w = world();
        let a = enemy(&mut w, EnemyKind::Square, Vec2::new(100.0, 100.0), 20.0);
        let b = enemy(&mut w, EnemyKind::Square, Vec2::new(110.0, 100.0), 16.0);
        resolve(&mut w);

        assert!(w.shape(b).is_none());
        let merged = w.shape(a).unwrap();
        assert_eq!(merged.size, 28.0);
        assert_eq!(merged.enemy_state().unwrap().health, 56.0);
        assert_eq!(w.score, 0);
    }

    #[test]
    fn test_different_kinds_damage_simultaneously() {
        let mut w = world();
        let a = enemy(&mut w, EnemyKind::Circle, Vec2::new(100.0, 100.0), 30.0);
        let b = enemy(&mut w, EnemyKind::Triangle, Vec2::new(110.0, 100.0), 12.0);
        resolve(&mut w);

        // a: 60 - 12, b: 24 - 30 <= 0
        assert_eq!(w.shape(a).unwrap().enemy_state().unwrap().health, 48.0);
        assert!(w.shape(b).is_none());
    }

    #[test]
    fn test_hero_destroys_enemy_and_collects_pickup() {
        let mut w = world();
        let hero_pos = w.hero().unwrap().pos;
        let e = enemy(&mut w, EnemyKind::Circle, hero_pos + Vec2::new(5.0, 0.0), 10.0);
        let m = w.spawn_modifier(ModifierKind::Grow, hero_pos - Vec2::new(5.0, 0.0));
        resolve(&mut w);

        assert!(w.shape(e).is_none());
        assert!(w.shape(m).is_none());
        assert_eq!(w.score, 1);
        assert_eq!(w.stats.count(EnemyKind::Circle), 1);
        assert_eq!(w.explosions.len(), 1);
        assert_eq!(w.flash.timer, FLASH_TICKS);
        assert_eq!(w.active_modifiers, vec![ActiveModifier::new(ModifierKind::Grow)]);
    }

    #[test]
    fn test_pickups_do_not_collide_with_enemies() {
        let mut w = world();
        let e = enemy(&mut w, EnemyKind::Circle, Vec2::new(100.0, 100.0), 20.0);
        let m = w.spawn_modifier(ModifierKind::Haste, Vec2::new(105.0, 100.0));
        resolve(&mut w);
        assert!(w.shape(e).is_some());
        assert!(w.shape(m).is_some());
    }

    #[test]
    fn test_trigger_counts_colour() {
        let mut w = world();
        let e = enemy(&mut w, EnemyKind::Square, Vec2::new(100.0, 100.0), 20.0);
        let key = w.shape(e).unwrap().color.key();
        let idx = w.shapes.iter().position(|s| s.id == e).unwrap();
        destroy_shapes(&mut w, [idx]);
        assert_eq!(w.color_counts.get(&key), Some(&1));
        assert!(w.shape(e).is_none());
    }

    #[test]
    fn test_hero_is_never_removed() {
        let mut w = world();
        let hero_id = w.hero().unwrap().id;
        let pos = w.hero().unwrap().pos;
        enemy(&mut w, EnemyKind::Circle, pos, 40.0);
        resolve(&mut w);
        assert!(w.shape(hero_id).is_some());
    }

    proptest! {
        #[test]
        fn prop_overlapping_pair_outcome(
            sa in 10.0f32..35.0,
            sb in 10.0f32..35.0,
            same in any::<bool>(),
        ) {
            let mut w = world();
            let kind_b = if same { EnemyKind::Circle } else { EnemyKind::Square };
            let a = enemy(&mut w, EnemyKind::Circle, Vec2::new(200.0, 200.0), sa);
            let b = enemy(&mut w, kind_b, Vec2::new(205.0, 200.0), sb);
            resolve(&mut w);

            if same {
                prop_assert!(w.shape(b).is_none());
                let merged = w.shape(a).unwrap();
                let size = (sa + sb * 0.5).min(40.0);
                prop_assert!((merged.size - size).abs() < 1e-4);
                prop_assert!((merged.enemy_state().unwrap().health - size * 2.0).abs() < 1e-4);
            } else {
                for (id, health) in [(a, sa * 2.0 - sb), (b, sb * 2.0 - sa)] {
                    match w.shape(id) {
                        Some(s) => {
                            prop_assert!((s.enemy_state().unwrap().health - health).abs() < 1e-4);
                        }
                        None => {
                            prop_assert!(health <= 0.0);
                        }
                    }
                }
            }
            prop_assert_eq!(w.score, 0);
        }
    }
}
