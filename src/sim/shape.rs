//! Shapes: the hero, enemy shapes and modifier pickups
//!
//! All three share one record; role-specific state lives in [`Role`].

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::modifiers::ActiveEffects;
use crate::consts::*;
use crate::inner_coordinate;
use crate::input::{Direction, InputState};
use crate::random::RandomSource;

/// Enemy silhouette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Circle,
    Square,
    Triangle,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Circle, EnemyKind::Square, EnemyKind::Triangle];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Circle => "circle",
            EnemyKind::Square => "square",
            EnemyKind::Triangle => "triangle",
        }
    }

    /// HUD icon
    pub fn icon(&self) -> &'static str {
        match self {
            EnemyKind::Circle => "●",
            EnemyKind::Square => "■",
            EnemyKind::Triangle => "▲",
        }
    }
}

/// Power-up kinds, usable both as pickups and as timed buffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModifierKind {
    /// Triples hero speed
    Haste,
    /// Destroys enemies near the hero every tick
    AimAssist,
    /// Marks every enemy, detonating them shortly after
    Shield,
    /// Doubles hero size
    Grow,
    /// Stops every enemy
    Freeze,
}

impl ModifierKind {
    pub const ALL: [ModifierKind; 5] = [
        ModifierKind::Haste,
        ModifierKind::AimAssist,
        ModifierKind::Shield,
        ModifierKind::Grow,
        ModifierKind::Freeze,
    ];

    pub fn glyph(&self) -> &'static str {
        match self {
            ModifierKind::Haste => "🚀",
            ModifierKind::AimAssist => "🎯",
            ModifierKind::Shield => "🛡️",
            ModifierKind::Grow => "🌟",
            ModifierKind::Freeze => "❄️",
        }
    }

    /// Fixed palette colour
    pub fn color(&self) -> &'static str {
        match self {
            ModifierKind::Haste => "#ff0000",
            ModifierKind::AimAssist => "#00ff00",
            ModifierKind::Shield => "#0000ff",
            ModifierKind::Grow => "#ffff00",
            ModifierKind::Freeze => "#00ffff",
        }
    }

    /// Accepts the glyph or a lowercase name ("haste", "aim", "shield", ...)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "🚀" | "haste" | "speed" => Some(ModifierKind::Haste),
            "🎯" | "aim" | "aimassist" | "aim-assist" => Some(ModifierKind::AimAssist),
            "🛡️" | "🛡" | "shield" => Some(ModifierKind::Shield),
            "🌟" | "grow" => Some(ModifierKind::Grow),
            "❄️" | "❄" | "freeze" => Some(ModifierKind::Freeze),
            _ => None,
        }
    }
}

/// Fill colour of a shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeColor {
    White,
    /// Fully saturated hue, in degrees
    Hue(f32),
}

impl ShapeColor {
    /// Stable key used for per-colour counters
    pub fn key(&self) -> String {
        match self {
            ShapeColor::White => "#ffffff".to_string(),
            ShapeColor::Hue(h) => format!("hsl({}, 100%, 50%)", h),
        }
    }
}

/// Hero trail sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub opacity: f32,
    pub size: f32,
}

/// Enemy-only state
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub health: f32,
    /// Ticks to live
    pub life: f32,
    /// Cap for combine growth
    pub max_size: f32,
    /// Lunging at the hero this tick
    pub charging: bool,
    /// Waiting for a shield detonation
    pub marked: bool,
}

/// What a shape is, with its role-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Hero {
        /// Manual-mode velocity
        vel: Vec2,
        /// Oldest sample first
        trail: VecDeque<TrailPoint>,
    },
    Enemy(Enemy),
    Modifier {
        kind: ModifierKind,
        /// Ticks to live
        life: f32,
    },
}

/// Hero steering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Auto,
    Manual,
}

impl GameMode {
    pub fn toggled(self) -> Self {
        match self {
            GameMode::Auto => GameMode::Manual,
            GameMode::Manual => GameMode::Auto,
        }
    }
}

/// By-value copy of the hero taken once per update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroSnapshot {
    pub pos: Vec2,
    pub size: f32,
}

/// Read-only world facts a shape needs to update itself
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub effects: ActiveEffects,
    pub mode: GameMode,
    pub input: &'a InputState,
    pub mouse_sensitivity: f32,
    pub field: Vec2,
    pub hero: Option<HeroSnapshot>,
    pub score: u64,
    /// First pickup within seek range of the hero, in stored order
    pub pickup: Option<Vec2>,
}

/// A game entity
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub pos: Vec2,
    pub target: Vec2,
    /// Radius-equivalent
    pub size: f32,
    pub base_speed: f32,
    /// Effective speed this tick
    pub speed: f32,
    /// Radians, cosmetic
    pub rotation: f32,
    /// Ticks alive
    pub age: u32,
    pub color: ShapeColor,
    pub role: Role,
}

fn random_position(field: Vec2, rng: &mut dyn RandomSource) -> Vec2 {
    let x = rng.next_f32() * field.x;
    let y = rng.next_f32() * field.y;
    Vec2::new(x, y)
}

fn wander_target(field: Vec2, rng: &mut dyn RandomSource) -> Vec2 {
    let x = inner_coordinate(field.x, rng.next_f32());
    let y = inner_coordinate(field.y, rng.next_f32());
    Vec2::new(x, y)
}

impl Shape {
    /// Create the hero at a random position
    pub fn hero(id: u32, field: Vec2, hero_speed: f32, rng: &mut dyn RandomSource) -> Self {
        let pos = random_position(field, rng);
        let target = wander_target(field, rng);
        Self {
            id,
            pos,
            target,
            size: HERO_SIZE,
            base_speed: hero_speed,
            speed: hero_speed,
            rotation: 0.0,
            age: 0,
            color: ShapeColor::White,
            role: Role::Hero {
                vel: Vec2::ZERO,
                trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            },
        }
    }

    /// Create an enemy, at `pos` or at a random position
    pub fn enemy(id: u32, field: Vec2, pos: Option<Vec2>, rng: &mut dyn RandomSource) -> Self {
        let pos = match pos {
            Some(p) => p,
            None => random_position(field, rng),
        };
        let kind = EnemyKind::ALL[rng.index(EnemyKind::ALL.len())];
        let size = ENEMY_MIN_SIZE + rng.next_f32() * ENEMY_SIZE_RANGE;
        let hue = rng.next_f32() * 360.0;
        let life = rng.next_f32() * ENEMY_LIFE_RANGE + ENEMY_LIFE_MIN;
        let base_speed = ENEMY_SPEED_MIN + rng.next_f32() * ENEMY_SPEED_RANGE;
        let target = wander_target(field, rng);
        Self {
            id,
            pos,
            target,
            size,
            base_speed,
            speed: base_speed,
            rotation: 0.0,
            age: 0,
            color: ShapeColor::Hue(hue),
            role: Role::Enemy(Enemy {
                kind,
                health: size * 2.0,
                life,
                max_size: ENEMY_MAX_SIZE,
                charging: false,
                marked: false,
            }),
        }
    }

    /// Create a pickup of a given kind
    pub fn modifier(id: u32, kind: ModifierKind, pos: Vec2, rng: &mut dyn RandomSource) -> Self {
        let life = rng.next_f32() * ENEMY_LIFE_RANGE + ENEMY_LIFE_MIN;
        Self {
            id,
            pos,
            target: pos,
            size: MODIFIER_SIZE,
            base_speed: 0.0,
            speed: 0.0,
            rotation: 0.0,
            age: 0,
            color: ShapeColor::White,
            role: Role::Modifier { kind, life },
        }
    }

    /// Create a pickup of a random kind at a random position
    pub fn random_modifier(id: u32, field: Vec2, rng: &mut dyn RandomSource) -> Self {
        let pos = random_position(field, rng);
        let kind = ModifierKind::ALL[rng.index(ModifierKind::ALL.len())];
        Self::modifier(id, kind, pos, rng)
    }

    pub fn is_hero(&self) -> bool {
        matches!(self.role, Role::Hero { .. })
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.role, Role::Enemy(_))
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self.role, Role::Modifier { .. })
    }

    pub fn enemy_state(&self) -> Option<&Enemy> {
        match &self.role {
            Role::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn enemy_state_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.role {
            Role::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn modifier_kind(&self) -> Option<ModifierKind> {
        match self.role {
            Role::Modifier { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Hero velocity (zero for everything else)
    pub fn velocity(&self) -> Vec2 {
        match self.role {
            Role::Hero { vel, .. } => vel,
            _ => Vec2::ZERO,
        }
    }

    pub fn trail(&self) -> Option<&VecDeque<TrailPoint>> {
        match &self.role {
            Role::Hero { trail, .. } => Some(trail),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> HeroSnapshot {
        HeroSnapshot {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.pos.distance(point)
    }

    /// Circles overlap
    pub fn collides_with(&self, other: &Shape) -> bool {
        self.distance_to(other.pos) < self.size + other.size
    }

    /// Liveness for the post-update prune. The hero never dies.
    pub fn is_alive(&self) -> bool {
        match &self.role {
            Role::Hero { .. } => true,
            Role::Enemy(e) => (self.age as f32) < e.life && e.health > 0.0,
            Role::Modifier { life, .. } => (self.age as f32) < *life,
        }
    }

    /// Draw opacity: enemies fade with lost health
    pub fn opacity(&self) -> f32 {
        match &self.role {
            Role::Enemy(e) => (e.health / (self.size * 2.0)).max(0.0),
            _ => 1.0,
        }
    }

    /// Absorb another enemy's mass
    pub fn combine_with(&mut self, other_size: f32) {
        let size = self.size;
        if let Role::Enemy(e) = &mut self.role {
            if size < e.max_size {
                self.size = e.max_size.min(size + other_size * 0.5);
                e.health = self.size * 2.0;
            }
        }
    }

    /// Zero manual-mode velocity (on mode switch)
    pub fn stop(&mut self) {
        if let Role::Hero { vel, .. } = &mut self.role {
            *vel = Vec2::ZERO;
        }
    }

    /// Advance one tick
    pub fn update(&mut self, ctx: &UpdateContext<'_>, rng: &mut dyn RandomSource) {
        self.apply_effects(&ctx.effects);
        match self.role {
            Role::Hero { .. } => match ctx.mode {
                GameMode::Auto => self.update_auto(ctx, rng),
                GameMode::Manual => self.update_manual(ctx),
            },
            Role::Enemy(_) => self.update_enemy(ctx),
            Role::Modifier { .. } => {}
        }
        self.step(ctx, rng);
        self.age += 1;
        self.record_trail(ctx.mode);
    }

    fn apply_effects(&mut self, effects: &ActiveEffects) {
        self.speed = if effects.freeze && self.is_enemy() {
            0.0
        } else {
            self.base_speed
        };
        if self.is_hero() {
            self.size = if effects.grow { HERO_GROWN_SIZE } else { HERO_SIZE };
            if effects.haste {
                self.speed = self.base_speed * 3.0;
            }
        }
    }

    fn update_auto(&mut self, ctx: &UpdateContext<'_>, rng: &mut dyn RandomSource) {
        if let Some(pickup) = ctx.pickup {
            self.target = pickup;
        } else if self.distance_to(self.target) < AUTO_ARRIVE_RADIUS {
            self.target = wander_target(ctx.field, rng);
        }
    }

    fn update_manual(&mut self, ctx: &UpdateContext<'_>) {
        let speed = self.speed;
        let pos = self.pos;
        let Role::Hero { vel, .. } = &mut self.role else {
            return;
        };

        let to_pointer = ctx.input.pointer - pos;
        let distance = to_pointer.length();
        let base = speed * MANUAL_SPEED_SCALE;
        if distance > POINTER_DEADZONE {
            *vel += to_pointer / distance * base * ctx.mouse_sensitivity * POINTER_EASING;
        }

        let boost = if ctx.input.keys.any() { KEY_BOOST } else { 1.0 };
        for direction in Direction::ALL {
            if ctx.input.keys.is_held(direction) {
                *vel += direction.vector() * speed * KEY_IMPULSE_SCALE * boost;
            }
        }

        *vel *= MANUAL_DRAG;

        let max_speed = base * boost;
        let current = vel.length();
        if current > max_speed {
            *vel *= max_speed / current;
        }
    }

    fn update_enemy(&mut self, ctx: &UpdateContext<'_>) {
        let Some(hero) = ctx.hero else {
            return;
        };

        let pull_range = hero.size * HERO_PULL_RANGE;
        let distance = self.distance_to(hero.pos);
        if distance < pull_range {
            let pull = (1.0 - distance / pull_range) * HERO_PULL_STRENGTH;
            self.pos += (hero.pos - self.pos) * pull;
        }

        let armed = self.distance_to(self.target) < CHARGE_TRIGGER_DISTANCE
            && self.age > CHARGE_WARMUP_TICKS;
        if armed {
            self.target = hero.pos;
            self.speed *= 2.0;
            self.rotation += CHARGE_SPIN;
        }
        if let Role::Enemy(e) = &mut self.role {
            e.charging = armed;
        }

        if ctx.score >= SPIN_SCORE_STEP {
            self.rotation += SPIN_PER_STEP * (ctx.score / SPIN_SCORE_STEP) as f32;
        }
    }

    fn step(&mut self, ctx: &UpdateContext<'_>, rng: &mut dyn RandomSource) {
        match self.role {
            Role::Modifier { .. } => {}
            Role::Hero { vel, .. } if ctx.mode == GameMode::Manual => {
                self.pos += vel;
                // max/min rather than clamp: a field smaller than the hero must not panic
                self.pos.x = self.size.max((ctx.field.x - self.size).min(self.pos.x));
                self.pos.y = self.size.max((ctx.field.y - self.size).min(self.pos.y));
            }
            _ => {
                let jitter_x = rng.centered() * 2.0 * JITTER;
                self.pos.x += (self.target.x - self.pos.x) * self.speed + jitter_x;
                let jitter_y = rng.centered() * 2.0 * JITTER;
                self.pos.y += (self.target.y - self.pos.y) * self.speed + jitter_y;
            }
        }
    }

    fn record_trail(&mut self, mode: GameMode) {
        let speed = self.speed;
        let pos = self.pos;
        let Role::Hero { vel, trail } = &mut self.role else {
            return;
        };

        let speed_factor = match mode {
            GameMode::Manual => vel.length() / 10.0,
            GameMode::Auto => speed * 100.0,
        };
        trail.push_back(TrailPoint {
            pos,
            opacity: 1.0,
            size: TRAIL_MAX_SIZE.min(TRAIL_MIN_SIZE + speed_factor * 1.5),
        });
        if trail.len() > TRAIL_LENGTH {
            trail.pop_front();
        }
        for point in trail.iter_mut() {
            point.opacity -= TRAIL_FADE;
        }
    }
}
