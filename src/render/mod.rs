//! Drawing seam used by the `Renderer` and `Font` script classes.
//!
//! Scripts draw in surface units: for the terminal backend one unit is one
//! character cell.

mod font;
mod terminal;

#[cfg(test)]
use std::any::Any;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use font::Font;
pub use terminal::TerminalRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl RenColor {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn gray(level: u8) -> Self {
        Self::rgba(level, level, level, 255)
    }

    /// Composite `self` over `dst` using `self`'s alpha
    pub fn over(self, dst: RenColor) -> RenColor {
        let a = self.a as u32;
        let mix = |src: u8, dst: u8| ((src as u32 * a + dst as u32 * (255 - a)) / 255) as u8;
        RenColor::rgba(mix(self.r, dst.r), mix(self.g, dst.g), mix(self.b, dst.b), 255)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl RenRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edges saturate, so rects built from huge script coordinates stay
    /// ordered instead of wrapping
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn intersect(self, other: RenRect) -> RenRect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        RenRect::new(
            x1,
            y1,
            x2.saturating_sub(x1).max(0),
            y2.saturating_sub(y1).max(0),
        )
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to load font {path}: {source}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("font {0} is not a regular file")]
    NotAFile(PathBuf),

    #[error("invalid font size {0}")]
    InvalidSize(f32),
}

/// The drawing API the bridge consumes
pub trait RenderBackend {
    fn show_debug(&mut self, enable: bool);
    fn size(&self) -> (i32, i32);
    fn resize(&mut self, width: i32, height: i32);

    fn begin_frame(&mut self);
    fn end_frame(&mut self) -> io::Result<()>;

    fn set_clip_rect(&mut self, rect: RenRect);
    fn draw_rect(&mut self, rect: RenRect, color: RenColor);
    /// Draws `text` starting at `(x, y)` and returns the x just past it
    fn draw_text(&mut self, font: &Font, text: &str, x: i32, y: i32, color: RenColor) -> i32;

    /// Forget what is on screen so the next frame is redrawn in full
    fn invalidate(&mut self);

    #[cfg(test)]
    fn as_any(&self) -> &dyn Any;
}
