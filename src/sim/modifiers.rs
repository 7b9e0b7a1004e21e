//! Timed buffs, banked charges and their activation rules

use serde::{Deserialize, Serialize};

use super::collision::destroy_shapes;
use super::scheduler::DeferredTask;
use super::shape::ModifierKind;
use super::state::{GameEvent, World};
use crate::consts::*;

/// A buff currently in effect
///
/// Copied from a pickup or created from a banked charge; it never refers
/// back to the shape that granted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveModifier {
    pub kind: ModifierKind,
    /// Ticks remaining
    pub timer: i32,
}

impl ActiveModifier {
    pub fn new(kind: ModifierKind) -> Self {
        Self {
            kind,
            timer: MODIFIER_DURATION_TICKS,
        }
    }

    pub fn color(&self) -> &'static str {
        self.kind.color()
    }

    pub fn is_expired(&self) -> bool {
        self.timer <= 0
    }
}

/// Which buff kinds are active this tick (stacked buffs collapse to a flag)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveEffects {
    pub haste: bool,
    pub aim_assist: bool,
    pub shield: bool,
    pub grow: bool,
    pub freeze: bool,
}

impl ActiveEffects {
    pub fn from_modifiers(modifiers: &[ActiveModifier]) -> Self {
        let mut effects = Self::default();
        for m in modifiers {
            match m.kind {
                ModifierKind::Haste => effects.haste = true,
                ModifierKind::AimAssist => effects.aim_assist = true,
                ModifierKind::Shield => effects.shield = true,
                ModifierKind::Grow => effects.grow = true,
                ModifierKind::Freeze => effects.freeze = true,
            }
        }
        effects
    }
}

/// Banked, not yet activated charges per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierBank {
    counts: [u32; 5],
}

impl ModifierBank {
    fn slot(kind: ModifierKind) -> usize {
        ModifierKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default()
    }

    pub fn count(&self, kind: ModifierKind) -> u32 {
        self.counts[Self::slot(kind)]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn add(&mut self, kind: ModifierKind) -> u32 {
        let slot = &mut self.counts[Self::slot(kind)];
        *slot += 1;
        *slot
    }

    /// Remove one charge; false when none is banked
    pub fn take(&mut self, kind: ModifierKind) -> bool {
        let slot = &mut self.counts[Self::slot(kind)];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// Kinds with at least one charge, in canonical order
    pub fn available(&self) -> Vec<ModifierKind> {
        ModifierKind::ALL
            .into_iter()
            .filter(|k| self.count(*k) > 0)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModifierKind, u32)> + '_ {
        ModifierKind::ALL.into_iter().map(|k| (k, self.count(k)))
    }
}

/// Whether the current score earns another charge
///
/// One award per multiple of SCORE_PER_CHARGE, and never more charges
/// banked than score / SCORE_PER_CHARGE.
pub fn award_due(score: u64, banked: u32) -> bool {
    score > 0 && score % SCORE_PER_CHARGE == 0 && (banked as u64) < score / SCORE_PER_CHARGE
}

/// Bank a random charge if the score milestone allows it
pub fn award_charges(world: &mut World) {
    if !award_due(world.score, world.bank.total()) {
        return;
    }
    let kind = ModifierKind::ALL[world.rng().index(ModifierKind::ALL.len())];
    let count = world.bank.add(kind);
    log::info!("Charge awarded: {} (now {})", kind.glyph(), count);
    world.events.push(GameEvent::ChargeAwarded { kind, count });
}

/// Activate a random banked charge once the cooldown has elapsed
pub fn auto_activate(world: &mut World, now_ms: f64) {
    if now_ms - world.last_auto_activation_ms < AUTO_ACTIVATION_COOLDOWN_MS {
        return;
    }
    let available = world.bank.available();
    if available.is_empty() {
        return;
    }
    let kind = available[world.rng().index(available.len())];
    activate(world, kind, now_ms, false);
    world.last_auto_activation_ms = now_ms;
}

/// Spend one banked charge of `kind`
///
/// Manual activation goes through here too and skips the cooldown.
/// Returns false when nothing of that kind is banked.
pub fn activate(world: &mut World, kind: ModifierKind, now_ms: f64, manual: bool) -> bool {
    if !world.bank.take(kind) {
        return false;
    }
    world.active_modifiers.push(ActiveModifier::new(kind));
    if kind == ModifierKind::Shield {
        apply_shield(world, now_ms);
    }
    log::info!(
        "Activated {} ({}), {} left",
        kind.glyph(),
        if manual { "manual" } else { "auto" },
        world.bank.count(kind)
    );
    world.events.push(GameEvent::ModifierActivated { kind, manual });
    true
}

/// Mark every enemy and schedule their detonation
pub fn apply_shield(world: &mut World, now_ms: f64) {
    for shape in &mut world.shapes {
        if let Some(enemy) = shape.enemy_state_mut() {
            enemy.marked = true;
        }
    }
    world
        .scheduler
        .schedule(now_ms + SHIELD_DELAY_MS, DeferredTask::ShieldDetonation);
}

/// Destroy every shape still marked by a shield
pub fn detonate_shield(world: &mut World) {
    let marked: Vec<usize> = world
        .shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.enemy_state().is_some_and(|e| e.marked))
        .map(|(i, _)| i)
        .collect();
    log::debug!("Shield detonation: {} shapes", marked.len());
    let count = marked.len();
    destroy_shapes(world, marked);
    world.events.push(GameEvent::ShieldDetonated { count });
}

/// Destroy every enemy in aim-assist range of the hero
pub fn apply_aim_assist(world: &mut World) {
    let Some(hero) = world.hero_snapshot() else {
        return;
    };
    let range = hero.size * AIM_ASSIST_RANGE;
    let in_range: Vec<usize> = world
        .shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_enemy() && s.distance_to(hero.pos) < range)
        .map(|(i, _)| i)
        .collect();
    if !in_range.is_empty() {
        destroy_shapes(world, in_range);
    }
}

/// Count every buff down once; aim assist fires once per active copy
pub fn tick_timers(world: &mut World) {
    for i in 0..world.active_modifiers.len() {
        world.active_modifiers[i].timer -= 1;
        if world.active_modifiers[i].kind == ModifierKind::AimAssist {
            apply_aim_assist(world);
        }
    }
}

pub fn prune_expired(world: &mut World) {
    world.active_modifiers.retain(|m| !m.is_expired());
}
