use std::io::{self, Stdout, Write, stdout};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    event::{
        DisableBracketedPaste, DisableFocusChange, DisableMouseCapture, EnableBracketedPaste,
        EnableFocusChange, EnableMouseCapture,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};

use super::{Font, RenColor, RenRect, RenderBackend};

const BACKGROUND: RenColor = RenColor::gray(0);
const FOREGROUND: RenColor = RenColor::gray(255);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: RenColor,
    bg: RenColor,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: FOREGROUND,
        bg: BACKGROUND,
    };
}

fn to_crossterm(color: RenColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Cell renderer that caches the last presented frame and only writes the
/// cells that changed since.
pub struct TerminalRenderer<W: Write> {
    out: W,
    width: i32,
    height: i32,
    clip: RenRect,
    frame: Vec<Cell>,
    presented: Vec<Cell>,
    full_redraw: bool,
    debug: bool,
}

impl TerminalRenderer<Stdout> {
    pub fn stdout() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::new(stdout(), width as i32, height as i32))
    }

    pub fn setup() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            EnableBracketedPaste,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    pub fn teardown() -> io::Result<()> {
        execute!(
            stdout(),
            ResetColor,
            SetCursorStyle::DefaultUserShape,
            DisableBracketedPaste,
            DisableFocusChange,
            DisableMouseCapture,
            Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let cells = (width * height) as usize;
        Self {
            out,
            width,
            height,
            clip: RenRect::new(0, 0, width, height),
            frame: vec![Cell::BLANK; cells],
            presented: vec![Cell::BLANK; cells],
            full_redraw: true,
            debug: false,
        }
    }

    fn screen(&self) -> RenRect {
        RenRect::new(0, 0, self.width, self.height)
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> &mut Cell {
        let idx = (y * self.width + x) as usize;
        &mut self.frame[idx]
    }

    fn present(&mut self) -> io::Result<usize> {
        let mut changed = 0;
        let mut pen: Option<(RenColor, RenColor)> = None;

        for y in 0..self.height {
            let mut x = 0;
            while x < self.width {
                let idx = (y * self.width + x) as usize;
                if !self.full_redraw && self.frame[idx] == self.presented[idx] {
                    x += 1;
                    continue;
                }

                // write the whole run of changed cells in one go
                queue!(self.out, MoveTo(x as u16, y as u16))?;
                while x < self.width {
                    let idx = (y * self.width + x) as usize;
                    let cell = self.frame[idx];
                    if !self.full_redraw && cell == self.presented[idx] {
                        break;
                    }
                    if pen != Some((cell.fg, cell.bg)) {
                        queue!(
                            self.out,
                            SetForegroundColor(to_crossterm(cell.fg)),
                            SetBackgroundColor(to_crossterm(cell.bg))
                        )?;
                        pen = Some((cell.fg, cell.bg));
                    }
                    queue!(self.out, Print(cell.ch))?;
                    changed += 1;
                    x += 1;
                }
            }
        }

        self.out.flush()?;
        Ok(changed)
    }

    #[cfg(test)]
    fn char_at(&self, x: i32, y: i32) -> char {
        self.frame[(y * self.width + x) as usize].ch
    }

    #[cfg(test)]
    fn bg_at(&self, x: i32, y: i32) -> RenColor {
        self.frame[(y * self.width + x) as usize].bg
    }

}

impl<W: Write + 'static> RenderBackend for TerminalRenderer<W> {
    fn show_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(0), height.max(0));
        if (width, height) == (self.width, self.height) {
            return;
        }
        let cells = (width * height) as usize;
        self.width = width;
        self.height = height;
        self.frame = vec![Cell::BLANK; cells];
        self.presented = vec![Cell::BLANK; cells];
        self.clip = self.screen();
        self.full_redraw = true;
    }

    fn begin_frame(&mut self) {
        self.clip = self.screen();
        self.frame.fill(Cell::BLANK);
    }

    fn end_frame(&mut self) -> io::Result<()> {
        let changed = self.present()?;
        if self.debug {
            log::debug!("frame presented, {changed} cells written");
        }
        self.presented.copy_from_slice(&self.frame);
        self.full_redraw = false;
        Ok(())
    }

    fn set_clip_rect(&mut self, rect: RenRect) {
        self.clip = rect.intersect(self.screen());
    }

    fn draw_rect(&mut self, rect: RenRect, color: RenColor) {
        if color.a == 0 {
            return;
        }
        let area = rect.intersect(self.clip);
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let cell = self.cell_mut(x, y);
                if color.a == 255 {
                    *cell = Cell {
                        ch: ' ',
                        fg: cell.fg,
                        bg: color,
                    };
                } else {
                    cell.bg = color.over(cell.bg);
                    cell.fg = color.over(cell.fg);
                }
            }
        }
    }

    fn draw_text(&mut self, font: &Font, text: &str, x: i32, y: i32, color: RenColor) -> i32 {
        let mut pen_x = x;
        for ch in text.chars() {
            let advance = font.advance(ch);
            if !ch.is_control() && self.clip.contains(pen_x, y) {
                let cell = self.cell_mut(pen_x, y);
                cell.ch = ch;
                cell.fg = color.over(cell.bg);
            }
            pen_x = pen_x.saturating_add(advance);
        }
        pen_x
    }

    fn invalidate(&mut self) {
        self.full_redraw = true;
    }

    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
