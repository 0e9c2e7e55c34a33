//! Everything a native handler may touch, owned in one place.
//!
//! The script engine holds one [`HostContext`] for the whole run and lends
//! it to each foreign call. There are no process globals: the cursor cache,
//! captured arguments and exit request all live here.

mod event;
mod terminal;
mod window;

#[cfg(test)]
pub mod testing;

use std::io;
use std::time::{Duration, Instant};

pub use event::{Event, EventSource, RawEvent, WindowEvent, poll_event};
pub use terminal::TerminalPlatform;
pub use window::{CursorCache, CursorShape, NativeCursor, Platform, Window, WindowMode};

use crate::config::Settings;
use crate::render::RenderBackend;

pub struct HostContext {
    args: Vec<String>,
    settings: Settings,
    platform: Box<dyn Platform>,
    renderer: Box<dyn RenderBackend>,
    cursors: CursorCache,
    started: Instant,
    exit_code: Option<i32>,
}

impl HostContext {
    pub fn new(
        args: Vec<String>,
        settings: Settings,
        platform: Box<dyn Platform>,
        renderer: Box<dyn RenderBackend>,
    ) -> Self {
        Self {
            args,
            settings,
            platform,
            renderer,
            cursors: CursorCache::new(),
            started: Instant::now(),
            exit_code: None,
        }
    }

    /// Command line as captured at startup
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn platform(&mut self) -> &mut dyn Platform {
        &mut *self.platform
    }

    pub fn renderer(&mut self) -> &mut dyn RenderBackend {
        &mut *self.renderer
    }

    /// Seconds since the host came up, from a monotonic clock
    pub fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Next normalized event, or `None` when the queue is drained. A resize
    /// is applied to the renderer before it is reported.
    pub fn poll_event(&mut self) -> Option<Event> {
        let event = poll_event(&mut *self.platform, &mut *self.renderer)?;
        if let Event::Resized { width, height } = event {
            self.renderer.resize(width, height);
        }
        Some(event)
    }

    pub fn wait_event(&mut self, timeout: Duration) -> bool {
        self.platform.wait(timeout)
    }

    pub fn set_cursor(&mut self, shape: CursorShape) -> io::Result<()> {
        let cursor = self.cursors.get_or_create(shape, &mut *self.platform);
        self.platform.set_cursor(cursor)
    }

    pub fn request_exit(&mut self, code: i32) {
        log::info!("exit requested with status {code}");
        self.exit_code = Some(code);
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{headless_host, platform, renderer};
    use super::*;

    #[test]
    fn resize_reaches_the_renderer() {
        let mut host = headless_host(vec![RawEvent::Window(WindowEvent::Resized {
            width: 120,
            height: 40,
        })]);
        assert_eq!(
            host.poll_event(),
            Some(Event::Resized {
                width: 120,
                height: 40
            })
        );
        assert_eq!(renderer(&host).size, (120, 40));
        assert_eq!(host.poll_event(), None);
    }

    #[test]
    fn cursor_shapes_are_cached_per_host() {
        let mut host = headless_host(Vec::new());
        host.set_cursor(CursorShape::Hand).unwrap();
        host.set_cursor(CursorShape::Ibeam).unwrap();
        host.set_cursor(CursorShape::Hand).unwrap();
        assert_eq!(platform(&host).cursors_created, 2);
        assert_eq!(platform(&host).cursor, Some(CursorShape::Hand));
    }

    #[test]
    fn exit_request_is_recorded() {
        let mut host = headless_host(Vec::new());
        assert_eq!(host.exit_code(), None);
        host.request_exit(3);
        assert_eq!(host.exit_code(), Some(3));
    }
}
