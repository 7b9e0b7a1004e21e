//! World state
//!
//! One `World` per game session. It owns every entity; entities never hold
//! references to each other, lookups (the hero, nearby pickups) are resolved
//! fresh each tick.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use super::explosion::Explosion;
use super::modifiers::{self, ActiveModifier, ModifierBank};
use super::scheduler::{DeferredTask, Scheduler};
use super::shape::{EnemyKind, GameMode, HeroSnapshot, ModifierKind, Shape, ShapeColor};
use crate::consts::*;
use crate::error::SimError;
use crate::input::InputState;
use crate::random::{RandomSource, SeededSource};
use crate::settings::Settings;

/// Field-edge flash started by the collision trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeFlash {
    /// Ticks remaining
    pub timer: u32,
    pub color: ShapeColor,
}

impl Default for EdgeFlash {
    fn default() -> Self {
        Self {
            timer: 0,
            color: ShapeColor::White,
        }
    }
}

impl EdgeFlash {
    pub fn start(&mut self, color: ShapeColor, ticks: u32) {
        self.timer = ticks;
        self.color = color;
    }

    /// What to draw this frame, then count down
    pub fn advance(&mut self) -> Option<FlashFrame> {
        if self.timer == 0 {
            return None;
        }
        let frame = FlashFrame {
            color: self.color,
            alpha: self.timer as f32 / FLASH_TICKS as f32,
        };
        self.timer -= 1;
        Some(frame)
    }
}

/// Edge-flash overlay for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlashFrame {
    pub color: ShapeColor,
    pub alpha: f32,
}

/// Destroyed-shape counters per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShapeStats {
    counts: BTreeMap<EnemyKind, u32>,
}

impl ShapeStats {
    pub fn record(&mut self, kind: EnemyKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: EnemyKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Kinds by count, highest first; ties keep canonical order
    pub fn ranked(&self) -> Vec<(EnemyKind, u32)> {
        let mut ranked: Vec<_> = EnemyKind::ALL.iter().map(|k| (*k, self.count(*k))).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

/// Things the host should react to (HUD refresh, sounds)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    ShapeDestroyed {
        kind: Option<EnemyKind>,
        #[serde(skip)]
        pos: Vec2,
        score: u64,
    },
    ModifierCollected {
        kind: ModifierKind,
    },
    ModifierActivated {
        kind: ModifierKind,
        manual: bool,
    },
    ChargeAwarded {
        kind: ModifierKind,
        count: u32,
    },
    ShieldDetonated {
        count: usize,
    },
}

/// Page-facing summary of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HudSnapshot {
    pub score: u64,
    pub mode: GameMode,
    /// (icon, count), highest first
    pub top_shapes: Vec<(String, u32)>,
    pub color_counts: BTreeMap<String, u32>,
    /// (glyph, banked count)
    pub bank: Vec<(String, u32)>,
    /// (glyph, ticks remaining)
    pub active: Vec<(String, i32)>,
}

/// The game world
pub struct World {
    /// Field size (canvas width, height)
    pub field: Vec2,
    /// Live shapes; the hero is pushed first and never removed
    pub shapes: Vec<Shape>,
    pub explosions: Vec<Explosion>,
    pub active_modifiers: Vec<ActiveModifier>,
    pub bank: ModifierBank,
    pub score: u64,
    pub stats: ShapeStats,
    pub color_counts: BTreeMap<String, u32>,
    pub mode: GameMode,
    pub input: InputState,
    pub flash: EdgeFlash,
    /// Overlay to draw for the most recent tick
    pub flash_frame: Option<FlashFrame>,
    pub settings: Settings,
    /// Wall-clock time of the last automatic activation
    pub last_auto_activation_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub scheduler: Scheduler,
    /// Pending host notifications
    pub events: Vec<GameEvent>,
    rng: Box<dyn RandomSource>,
    next_id: u32,
}

impl World {
    /// Create a world with its hero
    pub fn new(settings: Settings, field: Vec2, mut rng: Box<dyn RandomSource>) -> Self {
        rng.set_kind(settings.random_source);
        let mut world = Self {
            field,
            shapes: Vec::new(),
            explosions: Vec::new(),
            active_modifiers: Vec::new(),
            bank: ModifierBank::default(),
            score: 0,
            stats: ShapeStats::default(),
            color_counts: BTreeMap::new(),
            mode: GameMode::Auto,
            input: InputState::default(),
            flash: EdgeFlash::default(),
            flash_frame: None,
            settings,
            last_auto_activation_ms: 0.0,
            time_ticks: 0,
            scheduler: Scheduler::new(),
            events: Vec::new(),
            rng,
            next_id: 1,
        };
        world.spawn_hero();
        world
    }

    /// World driven by a seeded PCG source
    pub fn seeded(settings: Settings, field: Vec2, seed: u64) -> Self {
        Self::new(settings, field, Box::new(SeededSource::new(seed)))
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut dyn RandomSource {
        self.rng.as_mut()
    }

    fn spawn_hero(&mut self) -> u32 {
        let id = self.next_entity_id();
        let hero = Shape::hero(id, self.field, self.settings.hero_speed, self.rng.as_mut());
        self.shapes.insert(0, hero);
        id
    }

    pub fn hero(&self) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.is_hero())
    }

    pub fn hero_mut(&mut self) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.is_hero())
    }

    pub fn hero_snapshot(&self) -> Option<HeroSnapshot> {
        self.hero().map(Shape::snapshot)
    }

    pub fn shape(&self, id: u32) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn live_enemy_count(&self) -> usize {
        self.shapes.iter().filter(|s| s.is_enemy()).count()
    }

    /// Spawn an enemy at `pos`, or at a random position
    pub fn spawn_enemy(&mut self, pos: Option<Vec2>) -> u32 {
        let id = self.next_entity_id();
        let enemy = Shape::enemy(id, self.field, pos, self.rng.as_mut());
        self.shapes.push(enemy);
        id
    }

    pub fn spawn_modifier(&mut self, kind: ModifierKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let pickup = Shape::modifier(id, kind, pos, self.rng.as_mut());
        self.shapes.push(pickup);
        id
    }

    pub fn spawn_random_modifier(&mut self) -> u32 {
        let id = self.next_entity_id();
        let pickup = Shape::random_modifier(id, self.field, self.rng.as_mut());
        log::debug!("Pickup {} spawned", pickup.modifier_kind().map_or("?", |k| k.glyph()));
        self.shapes.push(pickup);
        id
    }

    /// Pointer click: a few enemies scattered around the click
    pub fn spawn_cluster(&mut self, at: Vec2) -> Vec<u32> {
        (0..CLICK_SPAWN_COUNT)
            .map(|_| {
                let dx = self.rng.centered() * CLICK_SPREAD;
                let dy = self.rng.centered() * CLICK_SPREAD;
                self.spawn_enemy(Some(at + Vec2::new(dx, dy)))
            })
            .collect()
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        if let Some(hero) = self.hero_mut() {
            hero.stop();
        }
        log::info!("Mode: {:?}", mode);
    }

    pub fn toggle_mode(&mut self) -> GameMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Takes effect on the next tick
    pub fn apply_settings(&mut self, settings: Settings) {
        if let Some(hero) = self.hero_mut() {
            hero.base_speed = settings.hero_speed;
        }
        self.rng.set_kind(settings.random_source);
        log::info!("Settings applied: {:?}", settings);
        self.settings = settings;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.field = Vec2::new(width, height);
    }

    /// Manual activation of a banked charge (no cooldown)
    pub fn activate_modifier(&mut self, kind: ModifierKind, now_ms: f64) -> bool {
        modifiers::activate(self, kind, now_ms, true)
    }

    /// Run deferred tasks that are due
    pub fn run_due_tasks(&mut self, now_ms: f64) {
        for task in self.scheduler.take_due(now_ms) {
            match task {
                DeferredTask::ShieldDetonation => modifiers::detonate_shield(self),
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Check the post-tick invariants
    pub fn validate(&self) -> Result<(), SimError> {
        if self.hero().is_none() {
            return Err(SimError::HeroMissing);
        }
        if let Some(bad) = self.shapes.iter().find(|s| !is_finite(s)) {
            return Err(SimError::NonFinite { id: bad.id });
        }
        Ok(())
    }

    /// Recover from a failed validation
    pub fn repair(&mut self, error: &SimError) {
        match error {
            SimError::HeroMissing => {
                log::warn!("Respawning missing hero");
                self.spawn_hero();
            }
            SimError::NonFinite { .. } => {
                self.shapes.retain(|s| s.is_hero() || is_finite(s));
                for shape in self.shapes.iter_mut().filter(|s| !is_finite(s)) {
                    // only the hero is left to fix
                    shape.pos = self.field / 2.0;
                    shape.target = shape.pos;
                    shape.stop();
                }
                self.explosions.retain(|e| e.pos.is_finite() && e.size.is_finite());
            }
        }
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.score,
            mode: self.mode,
            top_shapes: self
                .stats
                .ranked()
                .into_iter()
                .map(|(k, c)| (k.icon().to_string(), c))
                .collect(),
            color_counts: self.color_counts.clone(),
            bank: self
                .bank
                .iter()
                .map(|(k, c)| (k.glyph().to_string(), c))
                .collect(),
            active: self
                .active_modifiers
                .iter()
                .map(|m| (m.kind.glyph().to_string(), m.timer))
                .collect(),
        }
    }
}

fn is_finite(shape: &Shape) -> bool {
    shape.pos.is_finite()
        && shape.target.is_finite()
        && shape.size.is_finite()
        && shape.velocity().is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::shape::Role;
    use crate::random::ScriptedSource;

    fn world() -> World {
        World::new(
            Settings::default(),
            Vec2::new(800.0, 600.0),
            Box::new(ScriptedSource::constant(0.5)),
        )
    }

    #[test]
    fn test_new_world_has_hero_first() {
        let w = world();
        assert_eq!(w.shapes.len(), 1);
        assert!(w.shapes[0].is_hero());
        assert_eq!(w.hero().unwrap().base_speed, 0.1);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_flash_counts_down() {
        let mut flash = EdgeFlash::default();
        assert_eq!(flash.advance(), None);
        flash.start(ShapeColor::Hue(30.0), FLASH_TICKS);
        let first = flash.advance().unwrap();
        assert_eq!(first.alpha, 1.0);
        assert_eq!(flash.timer, FLASH_TICKS - 1);
        for _ in 0..(FLASH_TICKS - 1) {
            assert!(flash.advance().is_some());
        }
        assert_eq!(flash.advance(), None);
    }

    #[test]
    fn test_ranked_stats_ties_keep_order() {
        let mut stats = ShapeStats::default();
        stats.record(EnemyKind::Triangle);
        let ranked = stats.ranked();
        assert_eq!(ranked[0], (EnemyKind::Triangle, 1));
        assert_eq!(ranked[1], (EnemyKind::Circle, 0));
        assert_eq!(ranked[2], (EnemyKind::Square, 0));
    }

    #[test]
    fn test_toggle_mode_zeroes_velocity() {
        let mut w = world();
        if let Role::Hero { vel, .. } = &mut w.shapes[0].role {
            *vel = Vec2::new(3.0, 4.0);
        }
        assert_eq!(w.toggle_mode(), GameMode::Manual);
        assert_eq!(w.hero().unwrap().velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_apply_settings_overwrites_hero_speed() {
        let mut w = world();
        w.apply_settings(Settings {
            hero_speed: 0.4,
            ..Settings::default()
        });
        assert_eq!(w.hero().unwrap().base_speed, 0.4);
    }

    #[test]
    fn test_validate_and_repair_non_finite() {
        let mut w = world();
        let id = w.spawn_enemy(Some(Vec2::new(10.0, 10.0)));
        w.shapes.iter_mut().find(|s| s.id == id).unwrap().pos.x = f32::NAN;
        let err = w.validate().unwrap_err();
        assert_eq!(err, SimError::NonFinite { id });
        w.repair(&err);
        assert!(w.shape(id).is_none());
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_repair_respawns_hero() {
        let mut w = world();
        w.shapes.clear();
        let err = w.validate().unwrap_err();
        assert_eq!(err, SimError::HeroMissing);
        w.repair(&err);
        assert!(w.shapes[0].is_hero());
    }

    #[test]
    fn test_hud_snapshot_serializes() {
        let mut w = world();
        w.bank.add(ModifierKind::Shield);
        let json = serde_json::to_string(&w.hud_snapshot()).unwrap();
        assert!(json.contains("\"score\":0"));
        assert!(json.contains("\"mode\":\"auto\""));
        assert!(json.contains("[\"🛡️\",1]"));
    }
}
