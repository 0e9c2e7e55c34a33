#[cfg(test)]
use std::any::Any;
use std::collections::HashMap;
use std::io;

use super::event::EventSource;

/// Pointer shapes scripts can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    Arrow,
    Ibeam,
    SizeH,
    SizeV,
    Hand,
}

impl CursorShape {
    /// Script names, in option-index order
    pub const OPTIONS: [&'static str; 5] = ["arrow", "ibeam", "sizeh", "sizev", "hand"];
    const ALL: [CursorShape; 5] = [
        CursorShape::Arrow,
        CursorShape::Ibeam,
        CursorShape::SizeH,
        CursorShape::SizeV,
        CursorShape::Hand,
    ];

    pub fn from_option(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Normal,
    Maximized,
    Fullscreen,
}

impl WindowMode {
    pub const OPTIONS: [&'static str; 3] = ["normal", "maximized", "fullscreen"];

    pub fn from_option(index: usize) -> Option<Self> {
        match index {
            0 => Some(WindowMode::Normal),
            1 => Some(WindowMode::Maximized),
            2 => Some(WindowMode::Fullscreen),
            _ => None,
        }
    }
}

/// Opaque id of a cursor created by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCursor(pub u32);

/// The window handle half of the display subsystem
pub trait Window {
    fn set_title(&mut self, title: &str) -> io::Result<()>;
    fn set_mode(&mut self, mode: WindowMode) -> io::Result<()>;
    fn has_focus(&self) -> bool;

    /// Top-left corner of the window in global coordinates
    fn position(&self) -> (i32, i32);
    /// Pointer position in global coordinates
    fn global_mouse(&self) -> (i32, i32);
    /// Keep reporting pointer motion while it is outside the window
    fn capture_mouse(&mut self, enabled: bool);

    fn create_cursor(&mut self, shape: CursorShape) -> NativeCursor;
    fn set_cursor(&mut self, cursor: NativeCursor) -> io::Result<()>;

    fn clipboard_text(&self) -> Option<String>;
    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()>;

    /// Ask a yes/no question, blocking until it is answered
    fn confirm(&mut self, title: &str, message: &str) -> io::Result<bool>;

    #[cfg(test)]
    fn as_any(&self) -> &dyn Any;
}

/// Everything the bridge needs from the display subsystem
pub trait Platform: EventSource + Window {}

impl<T: EventSource + Window> Platform for T {}

/// Shape to native cursor mapping, created on first use and kept for the
/// lifetime of the host
#[derive(Debug, Default)]
pub struct CursorCache {
    cursors: HashMap<CursorShape, NativeCursor>,
}

impl CursorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<W: Window + ?Sized>(
        &mut self,
        shape: CursorShape,
        window: &mut W,
    ) -> NativeCursor {
        *self
            .cursors
            .entry(shape)
            .or_insert_with(|| window.create_cursor(shape))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }
}
