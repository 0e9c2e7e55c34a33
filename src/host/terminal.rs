//! The terminal as a window and event source.
//!
//! crossterm reports whole key presses, so each press is lowered into the
//! down/up sequence a windowing system would deliver: modifier downs, the
//! key down, its text, the key up, then modifier ups.

#[cfg(test)]
use std::any::Any;
use std::collections::VecDeque;
use std::io::{self, stdout};
use std::time::{Duration, Instant};

use crossterm::{
    cursor::SetCursorStyle,
    event::{
        self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    cursor::MoveTo,
    execute,
    style::Print,
    terminal::{self, Clear, ClearType, SetTitle},
};

use super::event::{EventSource, RawEvent, WindowEvent};
use super::window::{CursorShape, NativeCursor, Window, WindowMode};

const MODIFIERS: [(KeyModifiers, &str); 4] = [
    (KeyModifiers::CONTROL, "Left Ctrl"),
    (KeyModifiers::SHIFT, "Left Shift"),
    (KeyModifiers::ALT, "Left Alt"),
    (KeyModifiers::SUPER, "Left GUI"),
];

pub struct TerminalPlatform {
    pending: VecDeque<RawEvent>,
    focused: bool,
    mouse: (i32, i32),
    last_click: Option<(u8, Instant)>,
    clicks: u32,
    double_click: Duration,
    shapes: Vec<CursorShape>,
    clipboard: Option<String>,
}

impl TerminalPlatform {
    pub fn new(double_click: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            focused: true,
            mouse: (0, 0),
            last_click: None,
            clicks: 0,
            double_click,
            shapes: Vec::new(),
            clipboard: None,
        }
    }

    /// Move every event the terminal has ready into the pending queue
    fn pump(&mut self) {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(ev) => self.lower(ev, Instant::now()),
                    Err(e) => {
                        log::warn!("failed to read terminal event: {e}");
                        return;
                    }
                },
                Ok(false) => return,
                Err(e) => {
                    log::warn!("failed to poll terminal: {e}");
                    return;
                }
            }
        }
    }

    fn lower(&mut self, ev: TermEvent, now: Instant) {
        match ev {
            TermEvent::Key(key) => self.lower_key(key),
            TermEvent::Mouse(mouse) => self.lower_mouse(mouse, now),
            TermEvent::Resize(width, height) => {
                self.pending.push_back(RawEvent::Window(WindowEvent::Resized {
                    width: width as i32,
                    height: height as i32,
                }));
                // a resized terminal has lost whatever we drew
                self.pending.push_back(RawEvent::Window(WindowEvent::Exposed));
            }
            TermEvent::FocusGained => {
                self.focused = true;
                self.pending
                    .push_back(RawEvent::Window(WindowEvent::FocusGained));
            }
            TermEvent::FocusLost => {
                self.focused = false;
                self.pending.push_back(RawEvent::Window(WindowEvent::FocusLost));
            }
            TermEvent::Paste(text) => self.pending.push_back(RawEvent::TextInput(text)),
        }
    }

    fn lower_key(&mut self, key: KeyEvent) {
        // presses already carry their release
        if key.kind == KeyEventKind::Release {
            return;
        }
        let Some(name) = key_name(key.code) else {
            self.pending.push_back(RawEvent::Other);
            return;
        };

        let held: Vec<&str> = MODIFIERS
            .iter()
            .filter(|(m, _)| key.modifiers.contains(*m))
            .map(|(_, name)| *name)
            .collect();

        for m in &held {
            self.pending.push_back(RawEvent::KeyDown(m.to_string()));
        }
        self.pending.push_back(RawEvent::KeyDown(name.clone()));
        if let Some(text) = key_text(&key) {
            self.pending.push_back(RawEvent::TextInput(text));
        }
        self.pending.push_back(RawEvent::KeyUp(name));
        for m in held.iter().rev() {
            self.pending.push_back(RawEvent::KeyUp(m.to_string()));
        }
    }

    fn lower_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let (x, y) = (mouse.column as i32, mouse.row as i32);
        let (last_x, last_y) = self.mouse;
        self.mouse = (x, y);

        let raw = match mouse.kind {
            MouseEventKind::Down(button) => {
                let button = button_id(button);
                self.clicks = match self.last_click {
                    Some((last, at)) if last == button && now - at <= self.double_click => {
                        self.clicks + 1
                    }
                    _ => 1,
                };
                self.last_click = Some((button, now));
                RawEvent::MouseDown {
                    button,
                    x,
                    y,
                    clicks: self.clicks,
                }
            }
            MouseEventKind::Up(button) => RawEvent::MouseUp {
                button: button_id(button),
                x,
                y,
            },
            MouseEventKind::Drag(_) | MouseEventKind::Moved => RawEvent::MouseMotion {
                x,
                y,
                xrel: x - last_x,
                yrel: y - last_y,
            },
            MouseEventKind::ScrollUp => RawEvent::MouseWheel { y: 1 },
            MouseEventKind::ScrollDown => RawEvent::MouseWheel { y: -1 },
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => RawEvent::Other,
        };
        self.pending.push_back(raw);
    }

    fn drop_pending_key_downs(&mut self) {
        self.pending.retain(|e| !matches!(e, RawEvent::KeyDown(_)));
    }
}

fn button_id(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => 1,
        MouseButton::Middle => 2,
        MouseButton::Right => 3,
    }
}

/// Key names as a desktop windowing system spells them
fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(' ') => "Space",
        KeyCode::Char(c) => return Some(c.to_lowercase().collect()),
        KeyCode::Enter => "Return",
        KeyCode::Esc => "Escape",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab | KeyCode::BackTab => "Tab",
        KeyCode::Delete => "Delete",
        KeyCode::Insert => "Insert",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Left => "Left",
        KeyCode::Right => "Right",
        KeyCode::Up => "Up",
        KeyCode::Down => "Down",
        KeyCode::F(n) => return Some(format!("F{n}")),
        _ => return None,
    };
    Some(name.to_string())
}

fn key_text(key: &KeyEvent) -> Option<String> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if !c.is_control() => Some(c.to_string()),
        _ => None,
    }
}

fn cursor_style(shape: CursorShape) -> SetCursorStyle {
    match shape {
        CursorShape::Arrow => SetCursorStyle::DefaultUserShape,
        CursorShape::Ibeam => SetCursorStyle::SteadyBar,
        CursorShape::SizeH | CursorShape::SizeV => SetCursorStyle::SteadyUnderScore,
        CursorShape::Hand => SetCursorStyle::SteadyBlock,
    }
}

impl EventSource for TerminalPlatform {
    fn poll(&mut self) -> Option<RawEvent> {
        if self.pending.is_empty() {
            self.pump();
        }
        self.pending.pop_front()
    }

    fn wait(&mut self, timeout: Duration) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        event::poll(timeout).unwrap_or_else(|e| {
            log::warn!("failed to wait for terminal events: {e}");
            false
        })
    }

    fn flush_key_down(&mut self) {
        self.pump();
        self.drop_pending_key_downs();
    }
}

impl Window for TerminalPlatform {
    fn set_title(&mut self, title: &str) -> io::Result<()> {
        execute!(stdout(), SetTitle(title))
    }

    fn set_mode(&mut self, mode: WindowMode) -> io::Result<()> {
        log::debug!("terminal ignores window mode {mode:?}");
        Ok(())
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn position(&self) -> (i32, i32) {
        (0, 0)
    }

    fn global_mouse(&self) -> (i32, i32) {
        self.mouse
    }

    fn capture_mouse(&mut self, _enabled: bool) {
        // mouse capture is enabled for the whole session
    }

    fn create_cursor(&mut self, shape: CursorShape) -> NativeCursor {
        self.shapes.push(shape);
        NativeCursor(self.shapes.len() as u32 - 1)
    }

    fn set_cursor(&mut self, cursor: NativeCursor) -> io::Result<()> {
        match self.shapes.get(cursor.0 as usize) {
            Some(shape) => execute!(stdout(), cursor_style(*shape)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown cursor {}", cursor.0),
            )),
        }
    }

    fn clipboard_text(&self) -> Option<String> {
        self.clipboard.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) -> io::Result<()> {
        self.clipboard = Some(text.to_string());
        Ok(())
    }

    /// Prompt on the bottom row. Events other than the answer are queued
    /// as usual so nothing is lost while the question is up.
    fn confirm(&mut self, title: &str, message: &str) -> io::Result<bool> {
        let (_, rows) = terminal::size()?;
        execute!(
            stdout(),
            MoveTo(0, rows.saturating_sub(1)),
            Clear(ClearType::CurrentLine),
            Print(format!("{title}: {message} [y/n]"))
        )?;

        loop {
            match event::read()? {
                TermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(answer) = confirm_answer(key.code) {
                        log::debug!("confirm {title:?} answered {answer}");
                        return Ok(answer);
                    }
                }
                TermEvent::Key(_) => {}
                other => self.lower(other, Instant::now()),
            }
        }
    }

    #[cfg(test)]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `y` or Return accept, `n` or Escape decline, anything else is ignored
fn confirm_answer(code: KeyCode) -> Option<bool> {
    match code {
        KeyCode::Char('y' | 'Y') | KeyCode::Enter => Some(true),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform() -> TerminalPlatform {
        TerminalPlatform::new(Duration::from_millis(400))
    }

    fn drained(platform: &mut TerminalPlatform) -> Vec<RawEvent> {
        platform.pending.drain(..).collect()
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> TermEvent {
        TermEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> TermEvent {
        TermEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn plain_char_produces_down_text_up() {
        let mut p = platform();
        p.lower(press(KeyCode::Char('a'), KeyModifiers::NONE), Instant::now());
        assert_eq!(
            drained(&mut p),
            vec![
                RawEvent::KeyDown("a".into()),
                RawEvent::TextInput("a".into()),
                RawEvent::KeyUp("a".into()),
            ]
        );
    }

    #[test]
    fn modifiers_wrap_the_key_without_text() {
        let mut p = platform();
        p.lower(press(KeyCode::Char('s'), KeyModifiers::CONTROL), Instant::now());
        assert_eq!(
            drained(&mut p),
            vec![
                RawEvent::KeyDown("Left Ctrl".into()),
                RawEvent::KeyDown("s".into()),
                RawEvent::KeyUp("s".into()),
                RawEvent::KeyUp("Left Ctrl".into()),
            ]
        );
    }

    #[test]
    fn shifted_char_keeps_its_text() {
        let mut p = platform();
        p.lower(press(KeyCode::Char('A'), KeyModifiers::SHIFT), Instant::now());
        let events = drained(&mut p);
        assert_eq!(events[1], RawEvent::KeyDown("a".into()));
        assert_eq!(events[2], RawEvent::TextInput("A".into()));
    }

    #[test]
    fn special_keys_use_desktop_names() {
        assert_eq!(key_name(KeyCode::Enter).as_deref(), Some("Return"));
        assert_eq!(key_name(KeyCode::Esc).as_deref(), Some("Escape"));
        assert_eq!(key_name(KeyCode::F(5)).as_deref(), Some("F5"));
        assert_eq!(key_name(KeyCode::Char(' ')).as_deref(), Some("Space"));
        assert_eq!(key_name(KeyCode::CapsLock), None);
    }

    #[test]
    fn resize_is_followed_by_expose() {
        let mut p = platform();
        p.lower(TermEvent::Resize(100, 30), Instant::now());
        assert_eq!(
            drained(&mut p),
            vec![
                RawEvent::Window(WindowEvent::Resized {
                    width: 100,
                    height: 30
                }),
                RawEvent::Window(WindowEvent::Exposed),
            ]
        );
    }

    #[test]
    fn repeat_clicks_count_up_within_interval() {
        let mut p = platform();
        let t0 = Instant::now();
        let down = || mouse(MouseEventKind::Down(MouseButton::Left), 2, 3);
        p.lower(down(), t0);
        p.lower(down(), t0 + Duration::from_millis(100));
        p.lower(down(), t0 + Duration::from_secs(2));
        let clicks: Vec<u32> = drained(&mut p)
            .into_iter()
            .filter_map(|e| match e {
                RawEvent::MouseDown { clicks, .. } => Some(clicks),
                _ => None,
            })
            .collect();
        assert_eq!(clicks, vec![1, 2, 1]);
    }

    #[test]
    fn motion_is_relative_to_last_position() {
        let mut p = platform();
        let now = Instant::now();
        p.lower(mouse(MouseEventKind::Moved, 5, 5), now);
        p.lower(mouse(MouseEventKind::Drag(MouseButton::Left), 7, 4), now);
        assert_eq!(
            drained(&mut p)[1],
            RawEvent::MouseMotion {
                x: 7,
                y: 4,
                xrel: 2,
                yrel: -1
            }
        );
        assert_eq!(p.global_mouse(), (7, 4));
    }

    #[test]
    fn focus_is_tracked_and_key_downs_can_be_dropped() {
        let mut p = platform();
        let now = Instant::now();
        p.lower(TermEvent::FocusLost, now);
        assert!(!p.has_focus());
        p.lower(TermEvent::FocusGained, now);
        p.lower(press(KeyCode::Tab, KeyModifiers::NONE), now);
        p.drop_pending_key_downs();
        assert!(p.has_focus());
        assert_eq!(
            drained(&mut p),
            vec![
                RawEvent::Window(WindowEvent::FocusLost),
                RawEvent::Window(WindowEvent::FocusGained),
                RawEvent::KeyUp("Tab".into()),
            ]
        );
    }

    #[test]
    fn clipboard_is_kept_in_process() {
        let mut p = platform();
        assert_eq!(p.clipboard_text(), None);
        p.set_clipboard_text("copied").unwrap();
        assert_eq!(p.clipboard_text().as_deref(), Some("copied"));
    }

    #[test]
    fn confirm_keys_map_to_answers() {
        assert_eq!(confirm_answer(KeyCode::Char('y')), Some(true));
        assert_eq!(confirm_answer(KeyCode::Enter), Some(true));
        assert_eq!(confirm_answer(KeyCode::Char('N')), Some(false));
        assert_eq!(confirm_answer(KeyCode::Esc), Some(false));
        assert_eq!(confirm_answer(KeyCode::Char('q')), None);
    }
}
