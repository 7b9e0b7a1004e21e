//! Canvas2D surface

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::commands::{DrawCommand, Path};
use super::Surface;
use crate::error::RenderError;

fn backend(err: JsValue) -> RenderError {
    RenderError::Backend(format!("{:?}", err))
}

/// Draws display lists onto an HTML canvas
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(backend)?
            .ok_or_else(|| RenderError::Backend("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Backend("not a 2d context".into()))?;
        Ok(Self { ctx })
    }

    fn trace(&self, path: &Path) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        ctx.begin_path();
        match *path {
            Path::Circle { center, radius } => {
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    radius.max(0.0) as f64,
                    0.0,
                    TAU,
                )
                .map_err(backend)?;
            }
            Path::Square { center, half } => {
                let h = half as f64;
                ctx.rect(center.x as f64 - h, center.y as f64 - h, h * 2.0, h * 2.0);
            }
            Path::Triangle { center, half } => {
                let (x, y, h) = (center.x as f64, center.y as f64, half as f64);
                ctx.move_to(x, y - h);
                ctx.line_to(x - h, y + h);
                ctx.line_to(x + h, y + h);
                ctx.close_path();
            }
            Path::Cross { center, half } => {
                let (x, y, h) = (center.x as f64, center.y as f64, half as f64);
                ctx.move_to(x - h, y - h);
                ctx.line_to(x + h, y + h);
                ctx.move_to(x + h, y - h);
                ctx.line_to(x - h, y + h);
            }
        }
        Ok(())
    }

    fn rotate_about(&self, center: Vec2, angle: f32) -> Result<(), RenderError> {
        let (x, y) = (center.x as f64, center.y as f64);
        self.ctx.translate(x, y).map_err(backend)?;
        self.ctx.rotate(angle as f64).map_err(backend)?;
        self.ctx.translate(-x, -y).map_err(backend)
    }
}

impl Surface for CanvasSurface {
    fn draw(&mut self, commands: &[DrawCommand]) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        for command in commands {
            match command {
                DrawCommand::Clear { width, height } => {
                    ctx.clear_rect(0.0, 0.0, *width as f64, *height as f64);
                }
                DrawCommand::Save => ctx.save(),
                DrawCommand::Restore => ctx.restore(),
                DrawCommand::Rotate { center, angle } => self.rotate_about(*center, *angle)?,
                DrawCommand::Fill { path, color } => {
                    self.trace(path)?;
                    ctx.set_fill_style_str(&color.css());
                    ctx.fill();
                }
                DrawCommand::Stroke { path, color, width } => {
                    self.trace(path)?;
                    ctx.set_stroke_style_str(&color.css());
                    ctx.set_line_width(*width as f64);
                    ctx.stroke();
                }
                DrawCommand::Text {
                    text,
                    pos,
                    px,
                    color,
                } => {
                    ctx.set_font(&format!("{}px monospace", px));
                    ctx.set_text_align("center");
                    ctx.set_text_baseline("middle");
                    ctx.set_fill_style_str(&color.css());
                    ctx.fill_text(text, pos.x as f64, pos.y as f64)
                        .map_err(backend)?;
                }
                DrawCommand::FillRect { pos, size, color } => {
                    ctx.set_fill_style_str(&color.css());
                    ctx.fill_rect(pos.x as f64, pos.y as f64, size.x as f64, size.y as f64);
                }
            }
        }
        Ok(())
    }
}
