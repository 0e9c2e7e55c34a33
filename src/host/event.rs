//! Platform events and their normalized, script-facing form.
//!
//! The platform produces [`RawEvent`]s in the order the OS delivered them.
//! [`poll_event`] drains that queue until it finds something worth
//! reporting and turns it into an [`Event`], dropping the rest.

use std::time::Duration;

use super::window::Platform;
use crate::api::Value;
use crate::render::RenderBackend;

#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    Resized { width: i32, height: i32 },
    Exposed,
    FocusGained,
    FocusLost,
    Other,
}

/// An event as the platform reports it, before filtering
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    Quit,
    Window(WindowEvent),
    DropFile(String),
    /// Platform key name, e.g. `Left Ctrl` or `Return`
    KeyDown(String),
    KeyUp(String),
    TextInput(String),
    MouseDown {
        button: u8,
        x: i32,
        y: i32,
        clicks: u32,
    },
    MouseUp {
        button: u8,
        x: i32,
        y: i32,
    },
    MouseMotion {
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
    },
    MouseWheel {
        y: i32,
    },
    Other,
}

/// The event queue half of the display subsystem
pub trait EventSource {
    /// Next queued event, without blocking
    fn poll(&mut self) -> Option<RawEvent>;
    /// Block until an event is queued or `timeout` passes
    fn wait(&mut self, timeout: Duration) -> bool;
    /// Drop every key-down currently queued
    fn flush_key_down(&mut self);
}

/// A classified event, ready to hand to a script
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Quit,
    Resized {
        width: i32,
        height: i32,
    },
    Exposed,
    FileDropped {
        path: String,
        x: i32,
        y: i32,
    },
    KeyPressed(String),
    KeyReleased(String),
    TextInput(String),
    MousePressed {
        button: &'static str,
        x: i32,
        y: i32,
        clicks: u32,
    },
    MouseReleased {
        button: &'static str,
        x: i32,
        y: i32,
    },
    MouseMoved {
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
    },
    MouseWheel {
        dy: i32,
    },
}

impl Event {
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Quit => "quit",
            Event::Resized { .. } => "resized",
            Event::Exposed => "exposed",
            Event::FileDropped { .. } => "filedropped",
            Event::KeyPressed(_) => "keypressed",
            Event::KeyReleased(_) => "keyreleased",
            Event::TextInput(_) => "textinput",
            Event::MousePressed { .. } => "mousepressed",
            Event::MouseReleased { .. } => "mousereleased",
            Event::MouseMoved { .. } => "mousemoved",
            Event::MouseWheel { .. } => "mousewheel",
        }
    }

    /// Script form: a list of the tag followed by the payload
    pub fn to_value(&self) -> Value {
        let mut items = vec![Value::from(self.tag())];
        match self {
            Event::Quit | Event::Exposed => {}
            Event::Resized { width, height } => {
                items.extend([Value::from(*width), Value::from(*height)]);
            }
            Event::FileDropped { path, x, y } => {
                items.extend([Value::from(path.as_str()), Value::from(*x), Value::from(*y)]);
            }
            Event::KeyPressed(name) | Event::KeyReleased(name) | Event::TextInput(name) => {
                items.push(Value::from(name.as_str()));
            }
            Event::MousePressed {
                button,
                x,
                y,
                clicks,
            } => {
                items.extend([
                    Value::from(*button),
                    Value::from(*x),
                    Value::from(*y),
                    Value::Num(*clicks as f64),
                ]);
            }
            Event::MouseReleased { button, x, y } => {
                items.extend([Value::from(*button), Value::from(*x), Value::from(*y)]);
            }
            Event::MouseMoved { x, y, dx, dy } => {
                items.extend([
                    Value::from(*x),
                    Value::from(*y),
                    Value::from(*dx),
                    Value::from(*dy),
                ]);
            }
            Event::MouseWheel { dy } => items.push(Value::from(*dy)),
        }
        Value::List(items)
    }
}

pub fn button_name(button: u8) -> &'static str {
    match button {
        1 => "left",
        2 => "middle",
        3 => "right",
        _ => "?",
    }
}

pub fn key_name(platform_name: &str) -> String {
    platform_name.to_lowercase()
}

/// Drain the platform queue up to the next reportable event.
///
/// Returns `None` once the queue is empty. Window sub-events other than
/// resize/expose and unrecognized events are consumed silently. Gaining
/// focus flushes queued key-downs, since some systems replay the
/// focus-switch shortcut as a burst of presses.
pub fn poll_event(platform: &mut dyn Platform, renderer: &mut dyn RenderBackend) -> Option<Event> {
    loop {
        let raw = platform.poll()?;

        let event = match raw {
            RawEvent::Quit => Event::Quit,

            RawEvent::Window(WindowEvent::Resized { width, height }) => {
                Event::Resized { width, height }
            }
            RawEvent::Window(WindowEvent::Exposed) => {
                renderer.invalidate();
                Event::Exposed
            }
            RawEvent::Window(WindowEvent::FocusGained) => {
                platform.flush_key_down();
                continue;
            }
            RawEvent::Window(_) => continue,

            RawEvent::DropFile(path) => {
                let (mx, my) = platform.global_mouse();
                let (wx, wy) = platform.position();
                Event::FileDropped {
                    path,
                    x: mx - wx,
                    y: my - wy,
                }
            }

            RawEvent::KeyDown(name) => Event::KeyPressed(key_name(&name)),
            RawEvent::KeyUp(name) => Event::KeyReleased(key_name(&name)),
            RawEvent::TextInput(text) => Event::TextInput(text),

            RawEvent::MouseDown {
                button,
                x,
                y,
                clicks,
            } => {
                if button == 1 {
                    platform.capture_mouse(true);
                }
                Event::MousePressed {
                    button: button_name(button),
                    x,
                    y,
                    clicks,
                }
            }
            RawEvent::MouseUp { button, x, y } => {
                if button == 1 {
                    platform.capture_mouse(false);
                }
                Event::MouseReleased {
                    button: button_name(button),
                    x,
                    y,
                }
            }
            RawEvent::MouseMotion { x, y, xrel, yrel } => Event::MouseMoved {
                x,
                y,
                dx: xrel,
                dy: yrel,
            },
            RawEvent::MouseWheel { y } => Event::MouseWheel { dy: y },

            RawEvent::Other => continue,
        };

        return Some(event);
    }
}
