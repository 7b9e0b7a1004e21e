//! Display list generation
//!
//! Turns a `World` into the ordered list of 2D drawing commands for one frame.
//! Nothing here touches a real canvas, so frames can be inspected in tests.

use glam::Vec2;
use std::f32::consts::PI;

use crate::consts::{AIM_ASSIST_RANGE, EDGE_FLASH_WIDTH, SPIN_SCORE_STEP};
use crate::sim::explosion::{Explosion, Particle};
use crate::sim::modifiers::ActiveEffects;
use crate::sim::shape::{EnemyKind, Role, Shape, ShapeColor};
use crate::sim::state::{FlashFrame, World};

/// Longest particle life, used to normalise the spark tint
const PARTICLE_MAX_LIFE: f32 = 30.0;

/// Fill or stroke colour
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Rgba(u8, u8, u8, f32),
    /// Fully saturated hue in degrees, with alpha
    Hsla(f32, f32),
    /// Fixed `#rrggbb` palette entry
    Hex(&'static str),
}

impl Color {
    pub fn white(alpha: f32) -> Self {
        Color::Rgba(255, 255, 255, alpha)
    }

    pub fn red() -> Self {
        Color::Hex("#ff0000")
    }

    /// Shape colour at the given opacity
    pub fn shape(color: ShapeColor, alpha: f32) -> Self {
        match color {
            ShapeColor::White => Color::white(alpha),
            ShapeColor::Hue(h) => Color::Hsla(h, alpha),
        }
    }

    /// CSS colour string
    pub fn css(&self) -> String {
        match *self {
            Color::Rgba(r, g, b, a) => format!("rgba({}, {}, {}, {})", r, g, b, a),
            Color::Hsla(h, a) => format!("hsla({}, 100%, 50%, {})", h, a),
            Color::Hex(hex) => hex.to_string(),
        }
    }
}

/// Outline of a fillable or strokable region
#[derive(Debug, Clone, PartialEq)]
pub enum Path {
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned square of half-width `half`
    Square { center: Vec2, half: f32 },
    /// Apex up, base at the bottom
    Triangle { center: Vec2, half: f32 },
    /// Two diagonals through the square of half-width `half`
    Cross { center: Vec2, half: f32 },
}

/// One drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    Save,
    Restore,
    /// Rotate subsequent drawing about `center`
    Rotate { center: Vec2, angle: f32 },
    Fill { path: Path, color: Color },
    Stroke { path: Path, color: Color, width: f32 },
    /// Centered text, `px` is the monospace font size
    Text { text: String, pos: Vec2, px: f32, color: Color },
    FillRect { pos: Vec2, size: Vec2, color: Color },
}

/// Build the full frame for the current world state
///
/// `now_ms` only drives the pulsing pickup outline.
pub fn build_frame(world: &World, now_ms: f64) -> Vec<DrawCommand> {
    let mut out = vec![DrawCommand::Clear {
        width: world.field.x,
        height: world.field.y,
    }];

    let effects = ActiveEffects::from_modifiers(&world.active_modifiers);
    let hero = world.hero_snapshot();
    let pulse = (now_ms * 0.005).sin() as f32 * 2.0 + 3.0;

    for shape in &world.shapes {
        let rotates = match &shape.role {
            Role::Enemy(e) => e.charging || world.score >= SPIN_SCORE_STEP,
            _ => false,
        };

        out.push(DrawCommand::Save);
        if rotates {
            out.push(DrawCommand::Rotate {
                center: shape.pos,
                angle: shape.rotation,
            });
        }

        if shape.is_hero() {
            hero_trail(shape, &mut out);
        }

        body(shape, &mut out);

        match &shape.role {
            Role::Modifier { kind, .. } => out.push(DrawCommand::Stroke {
                path: Path::Circle {
                    center: shape.pos,
                    radius: shape.size,
                },
                color: Color::Hex(kind.color()),
                width: pulse,
            }),
            Role::Enemy(e) => {
                let in_range = hero.is_some_and(|h| {
                    shape.distance_to(h.pos) < h.size * AIM_ASSIST_RANGE
                });
                if effects.aim_assist && in_range {
                    out.push(DrawCommand::Stroke {
                        path: enemy_path(shape, e.kind),
                        color: Color::red(),
                        width: 4.0,
                    });
                }
                if e.marked {
                    out.push(DrawCommand::Stroke {
                        path: Path::Cross {
                            center: shape.pos,
                            half: shape.size,
                        },
                        color: Color::red(),
                        width: 2.0,
                    });
                }
            }
            Role::Hero { .. } => hero_badges(world, shape, &mut out),
        }

        out.push(DrawCommand::Restore);
    }

    for explosion in &world.explosions {
        explosion_commands(explosion, &mut out);
    }

    if let Some(flash) = world.flash_frame {
        edge_flash(flash, world.field, &mut out);
    }

    out
}

fn enemy_path(shape: &Shape, kind: EnemyKind) -> Path {
    let (center, half) = (shape.pos, shape.size);
    match kind {
        EnemyKind::Circle => Path::Circle {
            center,
            radius: half,
        },
        EnemyKind::Square => Path::Square { center, half },
        EnemyKind::Triangle => Path::Triangle { center, half },
    }
}

fn hero_trail(hero: &Shape, out: &mut Vec<DrawCommand>) {
    if let Some(trail) = hero.trail() {
        for point in trail {
            out.push(DrawCommand::Fill {
                path: Path::Circle {
                    center: point.pos,
                    radius: point.size * 0.8,
                },
                color: Color::Rgba(200, 200, 200, point.opacity * 0.2),
            });
        }
    }
    out.push(DrawCommand::Fill {
        path: Path::Circle {
            center: hero.pos,
            radius: hero.size * 1.5,
        },
        color: Color::white(0.3),
    });
}

fn body(shape: &Shape, out: &mut Vec<DrawCommand>) {
    let color = Color::shape(shape.color, shape.opacity());
    match &shape.role {
        Role::Hero { .. } => out.push(DrawCommand::Fill {
            path: Path::Circle {
                center: shape.pos,
                radius: shape.size,
            },
            color,
        }),
        Role::Enemy(e) => out.push(DrawCommand::Fill {
            path: enemy_path(shape, e.kind),
            color,
        }),
        Role::Modifier { kind, .. } => out.push(DrawCommand::Text {
            text: kind.glyph().to_string(),
            pos: shape.pos,
            px: shape.size * 2.0,
            color,
        }),
    }
}

/// Active-modifier badges orbiting the hero, a quarter turn apart
fn hero_badges(world: &World, hero: &Shape, out: &mut Vec<DrawCommand>) {
    for (i, modifier) in world.active_modifiers.iter().enumerate() {
        let offset = i as f32 * PI / 2.0;
        let pos = hero.pos + Vec2::new(offset.cos(), offset.sin()) * (hero.size + 5.0);
        out.push(DrawCommand::Fill {
            path: Path::Circle {
                center: pos,
                radius: 10.0,
            },
            color: Color::Hex("#ffffff"),
        });
        out.push(DrawCommand::Text {
            text: modifier.kind.glyph().to_string(),
            pos,
            px: 20.0,
            color: Color::Hex(modifier.color()),
        });
    }
}

fn particle_color(p: &Particle) -> Color {
    let ratio = (p.life / PARTICLE_MAX_LIFE).clamp(0.0, 1.0);
    let green = (100.0 + 100.0 * ratio) as u8;
    Color::Rgba(255, green, 0, p.life / 20.0)
}

fn explosion_commands(explosion: &Explosion, out: &mut Vec<DrawCommand>) {
    out.push(DrawCommand::Fill {
        path: Path::Circle {
            center: explosion.pos,
            radius: explosion.size,
        },
        color: Color::shape(explosion.color, explosion.opacity()),
    });
    for p in &explosion.particles {
        out.push(DrawCommand::Fill {
            path: Path::Circle {
                center: p.pos,
                radius: p.size,
            },
            color: particle_color(p),
        });
    }
}

/// Four border strips in the flash colour
fn edge_flash(flash: FlashFrame, field: Vec2, out: &mut Vec<DrawCommand>) {
    let color = Color::shape(flash.color, flash.alpha);
    let w = EDGE_FLASH_WIDTH;
    let strips = [
        (Vec2::ZERO, Vec2::new(field.x, w)),
        (Vec2::new(0.0, field.y - w), Vec2::new(field.x, w)),
        (Vec2::ZERO, Vec2::new(w, field.y)),
        (Vec2::new(field.x - w, 0.0), Vec2::new(w, field.y)),
    ];
    for (pos, size) in strips {
        out.push(DrawCommand::FillRect { pos, size, color });
    }
}
