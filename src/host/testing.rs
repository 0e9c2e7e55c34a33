//! Headless stand-ins for the display subsystem and renderer.

use std::any::Any;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::HostContext;
use super::event::{EventSource, RawEvent};
use super::window::{CursorShape, NativeCursor, Window, WindowMode};
use crate::config::Settings;
use crate::render::{Font, RenColor, RenRect, RenderBackend};

#[derive(Debug, Default)]
pub struct QueuePlatform {
    queue: VecDeque<RawEvent>,
    pub window_position: (i32, i32),
    pub mouse: (i32, i32),
    pub captured: bool,
    pub unfocused: bool,
    pub cursors_created: usize,
    pub cursor: Option<CursorShape>,
    pub title: String,
    pub mode: Option<WindowMode>,
    pub clipboard: Option<String>,
    pub waits: Vec<Duration>,
    /// Answers handed out by `confirm`, in order; declines once exhausted
    pub confirm_answers: VecDeque<bool>,
    pub prompts: Vec<(String, String)>,
    shapes: Vec<CursorShape>,
}

impl QueuePlatform {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            queue: events.into(),
            ..Self::default()
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for QueuePlatform {
    fn poll(&mut self) -> Option<RawEvent> {
        self.queue.pop_front()
    }

    fn wait(&mut self, timeout: Duration) -> bool {
        self.waits.push(timeout);
        !self.queue.is_empty()
    }

    fn flush_key_down(&mut self) {
        self.queue.retain(|e| !matches!(e, RawEvent::KeyDown(_)));
    }
}

impl Window for QueuePlatform {
    fn set_title(&mut self, title: &str) -> io::Result<()> {
        self.title = title.to_string();
        Ok(())
    }

    fn set_mode(&mut self, mode: WindowMode) -> io::Result<()> {
        self.mode = Some(mode);
        Ok(())
    }

    fn has_focus(&self) -> bool {
        !self.unfocused
    }

    fn position(&self) -> (i32, i32) {
        self.window_position
    }

    fn global_mouse(&self) -> (i32, i32) {
        self.mouse
    }

    fn capture_mouse(&mut self, enabled: bool) {
        self.captured = enabled;
    }

    fn create_cursor(&mut self, shape: CursorShape) -> NativeCursor {
        self.cursors_created += 1;
        self.shapes.push(shape);
        NativeCursor(self.shapes.len() as u32 - 1)
    }

    fn set_cursor(&mut self, cursor: NativeCursor) -> io::Result<()> {
        self.cursor = self.shapes.get(cursor.0 as usize).copied();
        Ok(())
    }

    fn clipboard_text(&self) -> Option<String> {
        self.clipboard.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }

    fn confirm(&mut self, title: &str, message: &str) -> io::Result<bool> {
        self.prompts.push((title.to_string(), message.to_string()));
        Ok(self.confirm_answers.pop_front().unwrap_or(false))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Renderer that records draw calls instead of presenting them
#[derive(Debug)]
pub struct RecordingRenderer {
    pub size: (i32, i32),
    pub debug: bool,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub invalidations: usize,
    pub clip: Option<RenRect>,
    pub rects: Vec<(RenRect, RenColor)>,
    pub texts: Vec<(String, i32, i32, RenColor)>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            size: (80, 24),
            debug: false,
            frames_begun: 0,
            frames_ended: 0,
            invalidations: 0,
            clip: None,
            rects: Vec::new(),
            texts: Vec::new(),
        }
    }
}

impl RenderBackend for RecordingRenderer {
    fn show_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    fn size(&self) -> (i32, i32) {
        self.size
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.size = (width, height);
    }

    fn begin_frame(&mut self) {
        self.frames_begun += 1;
        self.clip = None;
    }

    fn end_frame(&mut self) -> io::Result<()> {
        self.frames_ended += 1;
        Ok(())
    }

    fn set_clip_rect(&mut self, rect: RenRect) {
        self.clip = Some(rect);
    }

    fn draw_rect(&mut self, rect: RenRect, color: RenColor) {
        self.rects.push((rect, color));
    }

    fn draw_text(&mut self, font: &Font, text: &str, x: i32, y: i32, color: RenColor) -> i32 {
        self.texts.push((text.to_string(), x, y, color));
        x.saturating_add(font.width(text))
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Host over the headless doubles, with `events` queued
pub fn headless_host(events: Vec<RawEvent>) -> HostContext {
    headless_host_with(Settings::default(), events)
}

pub fn headless_host_with(settings: Settings, events: Vec<RawEvent>) -> HostContext {
    HostContext::new(
        vec!["plume".to_string(), "notes.txt".to_string()],
        settings,
        Box::new(QueuePlatform::new(events)),
        Box::new(RecordingRenderer::default()),
    )
}

pub fn platform(host: &HostContext) -> &QueuePlatform {
    host.platform
        .as_any()
        .downcast_ref()
        .expect("headless host runs on QueuePlatform")
}

pub fn renderer(host: &HostContext) -> &RecordingRenderer {
    host.renderer
        .as_any()
        .downcast_ref()
        .expect("headless host renders to RecordingRenderer")
}
