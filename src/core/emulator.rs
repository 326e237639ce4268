//! Terminal state machine
//!
//! Applies parser [`Event`]s to the grid, cursor and mode state following
//! VT102 semantics with a few xterm additions. Every visual delta is
//! reported to the [`Observer`]; the emulator never renders anything itself.
//!
//! # Coordinates
//!
//! The cursor is 0-based. `x` may equal the grid width after a character is
//! placed in the last column; the wrap is deferred until the next
//! character. Event payloads that come off the wire are 1-based.

use serde::{Deserialize, Serialize};

use super::charset::Charsets;
use super::cursor::{Cursor, CursorStack};
use super::grid::{Cell, Grid, LineAttr};
use super::modes::{ModeChange, Modes, NewLineMode, Origin, ScreenBuffer};
use super::observer::{Observer, Special};
use super::snapshot::EmulatorSnapshot;
use crate::parser::{
    CharsetAction, Direction, EraseScope, Event, EventSink, GotoTarget, Hardware, IndexKind, Led,
    ReportKind, SpecialChar, StackAction, TabAction,
};

/// Saved cursors kept by default before the oldest is dropped
pub const DEFAULT_CURSOR_STACK_DEPTH: usize = 64;

/// Scroll region, 0-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: usize,
    pub bottom: usize,
}

/// Everything a freeze captures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TermState {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Indexed by [`ScreenBuffer::index`]
    pub(crate) screens: [Grid; 2],
    pub(crate) cursor: Cursor,
    pub(crate) cursor_stack: CursorStack,
    pub(crate) modes: Modes,
    pub(crate) margins: Margins,
    pub(crate) tabs: Vec<bool>,
    pub(crate) window_title: String,
    pub(crate) icon_title: String,
    pub(crate) charsets: Charsets,
    pub(crate) leds: [bool; 4],
}

fn default_tabs(width: usize) -> Vec<bool> {
    (0..width).map(|x| x % 8 == 0).collect()
}

impl TermState {
    pub(crate) fn new(width: usize, height: usize, stack_depth: usize) -> Self {
        Self {
            width,
            height,
            screens: [Grid::new(width, height), Grid::new(width, height)],
            cursor: Cursor::default(),
            cursor_stack: CursorStack::new(stack_depth),
            modes: Modes::default(),
            margins: Margins {
                top: 0,
                bottom: height - 1,
            },
            tabs: default_tabs(width),
            window_title: String::new(),
            icon_title: String::new(),
            charsets: Charsets::default(),
            leds: [false; 4],
        }
    }

    /// Check every structural invariant; used when loading snapshots from
    /// outside the process.
    pub(crate) fn check_consistent(&self) -> Result<(), String> {
        if self.width < 1 || self.height < 2 {
            return Err(format!("bad dimensions {}x{}", self.width, self.height));
        }
        for grid in &self.screens {
            if grid.width() != self.width || grid.height() != self.height {
                return Err(format!(
                    "grid is {}x{}, expected {}x{}",
                    grid.width(),
                    grid.height(),
                    self.width,
                    self.height
                ));
            }
            grid.check_consistent()?;
        }
        if self.tabs.len() != self.width {
            return Err(format!("{} tab slots for width {}", self.tabs.len(), self.width));
        }
        let Margins { top, bottom } = self.margins;
        if top >= bottom || bottom >= self.height {
            return Err(format!("bad margins {top}..={bottom}"));
        }
        if self.cursor.x > self.width || self.cursor.y >= self.height {
            return Err(format!("cursor ({}, {}) out of range", self.cursor.x, self.cursor.y));
        }
        self.cursor_stack.check_consistent(self.width, self.height)
    }
}

/// VT102 emulator
#[derive(Debug)]
pub struct Emulator<O: Observer = ()> {
    state: TermState,
    observer: O,
}

impl Emulator<()> {
    /// Create an emulator nobody observes
    ///
    /// # Panics
    ///
    /// Panics if `width < 1` or `height < 2`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_observer(width, height, ())
    }
}

impl<O: Observer> Emulator<O> {
    /// # Panics
    ///
    /// Panics if `width < 1` or `height < 2`.
    pub fn with_observer(width: usize, height: usize, observer: O) -> Self {
        Self::with_options(width, height, DEFAULT_CURSOR_STACK_DEPTH, observer)
    }

    /// # Panics
    ///
    /// Panics if `width < 1` or `height < 2`.
    pub fn with_options(width: usize, height: usize, stack_depth: usize, observer: O) -> Self {
        assert!(
            width >= 1 && height >= 2,
            "terminal must be at least 1x2, got {width}x{height}"
        );
        Self {
            state: TermState::new(width, height, stack_depth),
            observer,
        }
    }

    // Accessors

    pub fn width(&self) -> usize {
        self.state.width
    }

    pub fn height(&self) -> usize {
        self.state.height
    }

    /// The live grid
    pub fn grid(&self) -> &Grid {
        &self.state.screens[self.state.modes.current_screen.index()]
    }

    pub fn screen(&self, which: ScreenBuffer) -> &Grid {
        &self.state.screens[which.index()]
    }

    pub fn cursor(&self) -> &Cursor {
        &self.state.cursor
    }

    pub fn cursor_stack(&self) -> &CursorStack {
        &self.state.cursor_stack
    }

    pub fn modes(&self) -> &Modes {
        &self.state.modes
    }

    pub fn margins(&self) -> Margins {
        self.state.margins
    }

    pub fn tabs(&self) -> &[bool] {
        &self.state.tabs
    }

    pub fn charsets(&self) -> &Charsets {
        &self.state.charsets
    }

    pub fn window_title(&self) -> &str {
        &self.state.window_title
    }

    pub fn icon_title(&self) -> &str {
        &self.state.icon_title
    }

    pub fn leds(&self) -> [bool; 4] {
        self.state.leds
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.grid().cell(x, y)
    }

    /// Text of one row with trailing blanks removed
    pub fn row_text(&self, y: usize) -> String {
        self.grid().row_text(y).trim_end().to_string()
    }

    /// Text of the live grid, one line per row, trailing blanks removed
    pub fn screen_text(&self) -> String {
        (0..self.state.height)
            .map(|y| self.row_text(y))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    // Snapshots

    /// Deep copy of the full state
    pub fn freeze(&self) -> EmulatorSnapshot {
        EmulatorSnapshot::new(self.state.clone())
    }

    /// Replace the full state. The last notification sent is always
    /// [`Special::Thaw`].
    pub fn thaw(&mut self, snapshot: &EmulatorSnapshot) {
        self.state = snapshot.state().clone();
        self.post_cursor();
        self.observer.special(&Special::Thaw);
    }

    // Notification helpers

    fn post_change(&mut self, row: usize, min: usize, max: usize) {
        self.observer.change(row, min, max);
    }

    fn post_rows(&mut self, rows: impl Iterator<Item = usize>) {
        let last = self.state.width - 1;
        for y in rows {
            self.observer.change(y, 0, last);
        }
    }

    fn post_cursor(&mut self) {
        self.observer.cursor(self.state.cursor.x, self.state.cursor.y);
    }

    fn post_special(&mut self, special: Special) {
        self.observer.special(&special);
    }

    fn log_warning(&mut self, message: &str) {
        tracing::warn!("{message}");
        self.observer.warn(message);
    }

    fn grid_mut(&mut self) -> &mut Grid {
        &mut self.state.screens[self.state.modes.current_screen.index()]
    }

    /// Cursor column for operations that need a real cell
    fn cursor_col(&self) -> usize {
        self.state.cursor.x.min(self.state.width - 1)
    }

    /// Row bounds for cursor movement under the current origin mode,
    /// as `(first, last)` inclusive
    fn row_bounds(&self) -> (usize, usize) {
        match self.state.modes.origin {
            Origin::Screen => (0, self.state.height - 1),
            Origin::Margin => (self.state.margins.top, self.state.margins.bottom),
        }
    }

    // Event dispatch

    /// Apply one event
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::SpecialChar(c) => self.special_char(c),
            Event::Charset(CharsetAction::Switch(slot)) => self.state.charsets.switch(slot),
            Event::Charset(CharsetAction::Set(slot, name)) => self.state.charsets.set(slot, name),
            Event::NormalString(s) => {
                for ch in s.chars() {
                    self.normal_char(ch);
                }
            }
            Event::Arrow(dir, count) => self.arrow(dir, usize::from(count)),
            Event::Goto(GotoTarget::Home) => self.goto(0, 0),
            Event::Goto(GotoTarget::Position { row, col }) => {
                self.goto(usize::from(col).saturating_sub(1), usize::from(row).saturating_sub(1))
            }
            Event::GotoColumn(col) => {
                self.state.cursor.x = (usize::from(col).saturating_sub(1)).min(self.state.width - 1);
                self.post_cursor();
            }
            Event::GotoRow(row) => {
                let x = self.cursor_col();
                self.goto(x, usize::from(row).saturating_sub(1));
            }
            Event::Index(kind) => self.index(kind),
            Event::CursorStack(action) => self.stack_action(action),
            Event::Mode(change) => self.mode(change),
            Event::OriginMode(origin) => {
                self.state.modes.origin = origin;
                self.goto(0, 0);
            }
            Event::SingleShift(slot, ch) => {
                self.log_warning(&format!("single shift {slot:?} for {ch:?} is not supported"))
            }
            Event::TabStop(action) => self.tab_stop(action),
            Event::LineAttr(attr) => self.line_attr(attr),
            Event::EraseInLine(scope) => self.erase_in_line(scope),
            Event::EraseInDisplay(scope) => self.erase_in_display(scope),
            Event::DeleteChars(n) => self.delete_chars(usize::from(n)),
            Event::InsertChars(n) => self.insert_chars(usize::from(n)),
            Event::EraseChars(n) => self.erase_chars(usize::from(n)),
            Event::InsertLines(n) => self.insert_lines(usize::from(n)),
            Event::DeleteLines(n) => self.delete_lines(usize::from(n)),
            Event::ScrollUp(n) => self.scroll(i32::from(n)),
            Event::ScrollDown(n) => self.scroll(-i32::from(n)),
            Event::Report(kind) => self.report(kind),
            Event::Led(led) => self.led(led),
            Event::SetWindowTitle(title) => self.set_window_title(title),
            Event::SetIconTitle(title) => self.set_icon_title(title),
            Event::SetWindowIconTitle(title) => {
                self.set_window_title(title.clone());
                self.set_icon_title(title);
            }
            Event::SetMargins { top, bottom } => self.set_margins(top, bottom),
            Event::ResetMargins => self.set_margins(None, None),
            Event::SoftReset => self.soft_reset(),
            Event::Reset => self.reset(),
            Event::SetAttribute(attr) => {
                if !self.state.cursor.set_attribute(attr) {
                    self.log_warning(&format!("ignoring setAttribute({attr})"));
                }
            }
            Event::Hardware(Hardware::SelfTest(params)) => {
                tracing::debug!(params = %params, "ignoring self test request");
            }
            Event::Hardware(Hardware::ScreenAlignment) => self.screen_alignment(),
        }
    }

    /// First addressable row under the current origin mode
    fn origin_offset(&self) -> usize {
        match self.state.modes.origin {
            Origin::Screen => 0,
            Origin::Margin => self.state.margins.top,
        }
    }

    // Handlers

    fn normal_char(&mut self, ch: char) {
        let ch = self.state.charsets.translate(ch);
        let width = self.state.width;

        if self.state.cursor.x == width {
            if self.state.modes.auto_wrap {
                self.state.cursor.x = 0;
                self.line_advance();
            } else {
                self.state.cursor.x = width - 1;
            }
        }

        let Cursor { x, y, .. } = self.state.cursor;
        let cell = Cell::new(ch, self.state.cursor.pen());
        if self.state.modes.insert {
            self.grid_mut().insert_cell(x, y, cell);
            self.post_change(y, x, width - 1);
        } else {
            self.grid_mut().set(x, y, cell);
            self.post_change(y, x, x);
        }

        self.state.cursor.x += 1;
        self.post_cursor();
    }

    /// Move down one row, scrolling at the bottom margin. Shared by line
    /// feeds and autowrap; does not notify.
    fn line_advance(&mut self) {
        let bottom = self.state.margins.bottom;
        self.state.cursor.y += 1;
        if self.state.cursor.y == bottom + 1 {
            self.scroll(1);
            self.state.cursor.y = bottom;
        }
        if self.state.cursor.y >= self.state.height {
            self.state.cursor.y = self.state.height - 1;
        }
    }

    fn special_char(&mut self, c: SpecialChar) {
        match c {
            SpecialChar::CarriageReturn => {
                self.state.cursor.x = 0;
                self.post_cursor();
            }
            SpecialChar::Backspace => {
                self.state.cursor.x = self.state.cursor.x.saturating_sub(1);
                self.post_cursor();
            }
            SpecialChar::LineFeed | SpecialChar::VerticalTab | SpecialChar::FormFeed => {
                self.line_advance();
                if self.state.modes.new_line == NewLineMode::CrLf {
                    self.state.cursor.x = 0;
                }
                self.post_cursor();
            }
            SpecialChar::HorizontalTab => {
                let width = self.state.width;
                let mut x = self.state.cursor.x;
                loop {
                    x += 1;
                    if x >= width || self.state.tabs[x] {
                        break;
                    }
                }
                self.state.cursor.x = x.min(width);
                self.post_cursor();
            }
            SpecialChar::Bell => self.post_special(Special::Bell),
        }
    }

    fn arrow(&mut self, dir: Direction, count: usize) {
        let (first, last) = self.row_bounds();
        let cursor = &mut self.state.cursor;
        match dir {
            Direction::Up => cursor.y = cursor.y.saturating_sub(count).max(first),
            Direction::Down => cursor.y = cursor.y.saturating_add(count).min(last),
            Direction::Left => cursor.x = cursor.x.saturating_sub(count),
            Direction::Right => {
                cursor.x = cursor.x.saturating_add(count).min(self.state.width - 1)
            }
        }
        self.post_cursor();
    }

    /// Absolute move; `y` is relative to the top margin in margin origin mode
    fn goto(&mut self, x: usize, y: usize) {
        let x = x.min(self.state.width - 1);
        let y = match self.state.modes.origin {
            Origin::Screen => y.min(self.state.height - 1),
            Origin::Margin => (y + self.state.margins.top).min(self.state.margins.bottom),
        };
        self.state.cursor.x = x;
        self.state.cursor.y = y;
        self.post_cursor();
    }

    fn index(&mut self, kind: IndexKind) {
        match kind {
            IndexKind::Down => {
                if self.state.cursor.y == self.state.margins.bottom {
                    self.scroll(1);
                } else if self.state.cursor.y + 1 < self.state.height {
                    self.state.cursor.y += 1;
                    self.post_cursor();
                }
            }
            IndexKind::Up => {
                if self.state.cursor.y == self.state.margins.top {
                    self.scroll(-1);
                } else if self.state.cursor.y > 0 {
                    self.state.cursor.y -= 1;
                    self.post_cursor();
                }
            }
            IndexKind::NextLine => {
                self.index(IndexKind::Down);
                self.state.cursor.x = 0;
                self.post_cursor();
            }
        }
    }

    fn stack_action(&mut self, action: StackAction) {
        match action {
            StackAction::Push => self.state.cursor_stack.push(self.state.cursor),
            StackAction::Pop => {
                if let Some(saved) = self.state.cursor_stack.pop() {
                    self.state.cursor = saved;
                }
                self.post_cursor();
            }
        }
    }

    fn mode(&mut self, change: ModeChange) {
        match change {
            ModeChange::CurrentScreen(target) => {
                self.state.modes.current_screen = target;
                self.post_rows(0..self.state.height);
                self.post_special(Special::Mode(change));
            }
            ModeChange::Width(_) | ModeChange::Vt52(_) => {
                self.log_warning(&format!("can't handle mode change {change:?}"));
            }
            _ => {
                self.state.modes.store(change);
                self.post_special(Special::Mode(change));
            }
        }
    }

    fn tab_stop(&mut self, action: TabAction) {
        let x = self.cursor_col();
        match action {
            TabAction::Add => self.state.tabs[x] = true,
            TabAction::Remove => self.state.tabs[x] = false,
            TabAction::Clear => self.state.tabs.iter_mut().for_each(|t| *t = false),
        }
    }

    fn line_attr(&mut self, attr: LineAttr) {
        let y = self.state.cursor.y;
        self.grid_mut().set_line_attr(y, attr);
        self.post_change(y, 0, self.state.width - 1);
    }

    fn erase_in_line(&mut self, scope: EraseScope) {
        let (x, y) = (self.cursor_col(), self.state.cursor.y);
        let last = self.state.width - 1;
        let (from, to) = match scope {
            EraseScope::ToEnd => (x, last),
            EraseScope::ToStart => (0, x),
            EraseScope::Whole => (0, last),
        };
        self.grid_mut().blank_span(y, from, to);
        self.post_change(y, from, to);
    }

    fn erase_in_display(&mut self, scope: EraseScope) {
        let y = self.state.cursor.y;
        let height = self.state.height;
        match scope {
            EraseScope::ToEnd => {
                self.erase_in_line(EraseScope::ToEnd);
                for row in y + 1..height {
                    self.grid_mut().blank_row(row);
                }
                self.post_rows(y + 1..height);
            }
            EraseScope::ToStart => {
                self.erase_in_line(EraseScope::ToStart);
                for row in 0..y {
                    self.grid_mut().blank_row(row);
                }
                self.post_rows((0..y).rev());
            }
            EraseScope::Whole => {
                for row in 0..height {
                    self.grid_mut().blank_row(row);
                }
                self.post_rows(0..height);
            }
        }
    }

    fn delete_chars(&mut self, count: usize) {
        let (x, y) = (self.cursor_col(), self.state.cursor.y);
        let width = self.state.width;
        for _ in 0..count.min(width - x) {
            self.grid_mut().delete_cell(x, y);
        }
        self.post_change(y, x, width - 1);
    }

    fn insert_chars(&mut self, count: usize) {
        let (x, y) = (self.cursor_col(), self.state.cursor.y);
        let width = self.state.width;
        for _ in 0..count.min(width - x) {
            self.grid_mut().insert_cell(x, y, Cell::BLANK);
        }
        self.post_change(y, x, width - 1);
    }

    fn erase_chars(&mut self, count: usize) {
        let (x, y) = (self.cursor_col(), self.state.cursor.y);
        let to = (x + count.max(1) - 1).min(self.state.width - 1);
        self.grid_mut().blank_span(y, x, to);
        self.post_change(y, x, to);
    }

    fn insert_lines(&mut self, count: usize) {
        let Margins { top, bottom } = self.state.margins;
        let y = self.state.cursor.y;
        if y < top || y > bottom {
            return;
        }
        for _ in 0..count.min(bottom - y + 1) {
            self.grid_mut().cycle_rows(bottom, y);
        }
        self.post_rows(y..=bottom);
    }

    fn delete_lines(&mut self, count: usize) {
        let Margins { top, bottom } = self.state.margins;
        let y = self.state.cursor.y;
        if y < top || y > bottom {
            return;
        }
        for _ in 0..count.min(bottom - y + 1) {
            self.grid_mut().cycle_rows(y, bottom);
        }
        self.post_rows(y..=bottom);
    }

    /// Scroll the region up (`lines > 0`) or down (`lines < 0`), reporting
    /// each row that leaves it.
    fn scroll(&mut self, lines: i32) {
        let Margins { top, bottom } = self.state.margins;
        let (remove, insert, direction) = match lines.signum() {
            1 => (top, bottom, 1),
            -1 => (bottom, top, -1),
            _ => return,
        };
        // Past the region height every further row is already blank
        let steps = (lines.unsigned_abs() as usize).min(bottom - top + 1);
        for _ in 0..steps {
            let line = self.grid_mut().cycle_rows(remove, insert);
            self.post_special(Special::ScrollLine { line, direction });
        }
        self.post_rows(top..=bottom);
    }

    fn report(&mut self, kind: ReportKind) {
        let reply = match kind {
            ReportKind::Status => "\x1b[0n".to_string(),
            ReportKind::Printer => "\x1b[?13n".to_string(),
            ReportKind::CursorPosition => {
                let row = self.state.cursor.y.saturating_sub(self.origin_offset()) + 1;
                format!("\x1b[{};{}R", row, self.cursor_col() + 1)
            }
            ReportKind::DeviceAttributes => "\x1b[?6c".to_string(),
            ReportKind::VersionString => "\x1b[>0;10;0c".to_string(),
        };
        tracing::debug!(?kind, reply = %reply.escape_debug(), "answering report");
        self.observer.reply(reply.as_bytes());
    }

    fn led(&mut self, led: Led) {
        match led {
            Led::AllOff => self.state.leds = [false; 4],
            Led::On(n @ 1..=4) => self.state.leds[usize::from(n) - 1] = true,
            Led::On(n) => tracing::debug!(led = n, "ignoring unknown LED"),
        }
    }

    fn set_window_title(&mut self, title: String) {
        self.state.window_title = title.clone();
        self.post_special(Special::WindowTitle(title));
    }

    fn set_icon_title(&mut self, title: String) {
        self.state.icon_title = title.clone();
        self.post_special(Special::IconTitle(title));
    }

    /// DECSTBM with 1-based bounds; missing or zero bounds mean the screen
    /// edge. The result always spans at least two rows.
    fn set_margins(&mut self, top: Option<u16>, bottom: Option<u16>) {
        let height = self.state.height;
        let top = top.filter(|&t| t != 0).map_or(1, usize::from) - 1;
        let bottom = bottom.filter(|&b| b != 0).map_or(height, usize::from) - 1;

        let mut top = if top + 1 >= bottom { bottom.saturating_sub(1) } else { top };
        top = top.min(height - 2);
        let bottom = bottom.clamp(1, height - 1);
        if top >= bottom {
            top = bottom - 1;
        }

        self.state.margins = Margins { top, bottom };
        self.goto(0, 0);
    }

    /// DECSTR: modes, margins, pen, charsets and saved cursors go back to
    /// their defaults. Grid contents, cursor position and the live screen
    /// are kept.
    fn soft_reset(&mut self) {
        let screen = self.state.modes.current_screen;
        self.state.modes = Modes {
            current_screen: screen,
            ..Modes::default()
        };
        self.state.margins = Margins {
            top: 0,
            bottom: self.state.height - 1,
        };
        self.state.cursor.reset_attributes();
        self.state.charsets = Charsets::default();
        self.state.cursor_stack.clear();
    }

    /// RIS: back to the power-on state
    fn reset(&mut self) {
        let depth = self.state.cursor_stack.depth();
        self.state = TermState::new(self.state.width, self.state.height, depth);
        self.post_rows(0..self.state.height);
        self.post_cursor();
    }

    /// DECALN: fill with `E`, reset margins, home
    fn screen_alignment(&mut self) {
        self.grid_mut().fill('E');
        self.state.margins = Margins {
            top: 0,
            bottom: self.state.height - 1,
        };
        self.state.cursor.x = 0;
        self.state.cursor.y = 0;
        self.post_rows(0..self.state.height);
        self.post_cursor();
    }
}

impl<O: Observer> EventSink for Emulator<O> {
    fn event(&mut self, event: Event) {
        self.handle_event(event);
    }

    fn warn(&mut self, message: &str) {
        self.log_warning(message);
    }
}
