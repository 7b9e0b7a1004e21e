//! Rendering module
//!
//! The simulation is drawn through a display list (`commands`), executed by a
//! `Surface`. The browser build uses a Canvas2D surface; tests and the native
//! binary record frames instead.

pub mod commands;
#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use commands::{Color, DrawCommand, Path, build_frame};
#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

use crate::error::RenderError;

/// Something that can execute a frame's display list
pub trait Surface {
    fn draw(&mut self, commands: &[DrawCommand]) -> Result<(), RenderError>;
}

/// Surface that keeps the last frame instead of drawing it
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub frames: u64,
    pub last: Vec<DrawCommand>,
}

impl Surface for RecordingSurface {
    fn draw(&mut self, commands: &[DrawCommand]) -> Result<(), RenderError> {
        self.frames += 1;
        self.last = commands.to_vec();
        Ok(())
    }
}
