//! Explosion visual effect

use glam::Vec2;

use super::shape::ShapeColor;
use crate::consts::{EXPLOSION_LIFE, EXPLOSION_PARTICLES};
use crate::random::RandomSource;

/// A spark thrown out by an explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    /// Ticks remaining
    pub life: f32,
}

/// Shrinking disc plus sparks left where a shape was destroyed
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub pos: Vec2,
    /// Current disc radius
    pub size: f32,
    pub max_size: f32,
    pub color: ShapeColor,
    pub life: u32,
    pub age: u32,
    pub particles: Vec<Particle>,
}

impl Explosion {
    pub fn new(pos: Vec2, size: f32, color: ShapeColor, rng: &mut dyn RandomSource) -> Self {
        let particles = (0..EXPLOSION_PARTICLES)
            .map(|_| {
                let vx = rng.centered() * 6.0;
                let vy = rng.centered() * 6.0;
                Particle {
                    pos,
                    vel: Vec2::new(vx, vy),
                    size: rng.next_f32() * 5.0 + 2.0,
                    life: rng.next_f32() * 20.0 + 10.0,
                }
            })
            .collect();
        Self {
            pos,
            size,
            max_size: size * 2.0,
            color,
            life: EXPLOSION_LIFE,
            age: 0,
            particles,
        }
    }

    pub fn update(&mut self) {
        self.age += 1;
        self.size = self.size_at(self.age);
        for p in &mut self.particles {
            p.pos += p.vel;
            p.life -= 1.0;
            p.size *= 0.95;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Disc radius at a given age: linear from twice the spawn size to zero
    pub fn size_at(&self, age: u32) -> f32 {
        (self.max_size * (1.0 - age as f32 / self.life as f32)).max(0.0)
    }

    /// Disc opacity
    pub fn opacity(&self) -> f32 {
        (1.0 - self.age as f32 / self.life as f32).max(0.0)
    }

    pub fn is_done(&self) -> bool {
        self.age >= self.life && self.particles.is_empty()
    }
}
