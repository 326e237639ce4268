//! Terminal mode flags
//!
//! One authoritative copy of every mode the emulator tracks. Modes only
//! change through recognized set/reset sequences.

use serde::{Deserialize, Serialize};

/// Scrolling style (DECSCLM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScrollMode {
    #[default]
    Jump,
    Smooth,
}

/// Cursor addressing origin (DECOM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    /// Coordinates are absolute
    #[default]
    Screen,
    /// Coordinates are relative to the top margin
    Margin,
}

/// Which grid is live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScreenBuffer {
    #[default]
    Primary,
    Alternate,
}

impl ScreenBuffer {
    pub fn index(self) -> usize {
        match self {
            ScreenBuffer::Primary => 0,
            ScreenBuffer::Alternate => 1,
        }
    }
}

/// Line feed behavior (LNM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NewLineMode {
    /// LF only moves down
    #[default]
    Cr,
    /// LF also returns the carriage
    CrLf,
}

/// Keypad mode (DECKPAM/DECKPNM)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeypadMode {
    #[default]
    Numeric,
    Application,
}

/// A single mode change as decoded from a set/reset sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeChange {
    /// DECCKM; `false` means application cursor keys
    CursorKeyAnsi(bool),
    /// DECANM reset; VT52 mode is not emulated
    Vt52(bool),
    /// DECCOLM column count; not emulated
    Width(u16),
    Scroll(ScrollMode),
    ReverseScreen(bool),
    AutoWrap(bool),
    AutoRepeat(bool),
    MouseTrackingDown(bool),
    MouseTrackingUp(bool),
    CurrentScreen(ScreenBuffer),
    KeyboardLocked(bool),
    Insert(bool),
    LocalEcho(bool),
    NewLine(NewLineMode),
    Keypad(KeypadMode),
    /// DECTCEM
    CursorVisible(bool),
}

/// Terminal mode flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modes {
    pub cursor_key_ansi: bool,
    pub keypad: KeypadMode,
    pub scroll: ScrollMode,
    pub reverse_screen: bool,
    pub origin: Origin,
    pub auto_wrap: bool,
    pub auto_repeat: bool,
    pub mouse_tracking_down: bool,
    pub mouse_tracking_up: bool,
    pub current_screen: ScreenBuffer,
    pub keyboard_locked: bool,
    pub insert: bool,
    pub local_echo: bool,
    pub new_line: NewLineMode,
    pub cursor_visible: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            cursor_key_ansi: true,
            keypad: KeypadMode::Numeric,
            scroll: ScrollMode::Jump,
            reverse_screen: false,
            origin: Origin::Screen,
            auto_wrap: true,
            auto_repeat: true,
            mouse_tracking_down: false,
            mouse_tracking_up: false,
            current_screen: ScreenBuffer::Primary,
            keyboard_locked: false,
            insert: false,
            local_echo: true,
            new_line: NewLineMode::Cr,
            cursor_visible: true,
        }
    }
}

impl Modes {
    /// Store a plain flag change. Returns `false` for changes that need
    /// more than a store (screen switch) or are not emulated.
    pub fn store(&mut self, change: ModeChange) -> bool {
        match change {
            ModeChange::CursorKeyAnsi(v) => self.cursor_key_ansi = v,
            ModeChange::Scroll(v) => self.scroll = v,
            ModeChange::ReverseScreen(v) => self.reverse_screen = v,
            ModeChange::AutoWrap(v) => self.auto_wrap = v,
            ModeChange::AutoRepeat(v) => self.auto_repeat = v,
            ModeChange::MouseTrackingDown(v) => self.mouse_tracking_down = v,
            ModeChange::MouseTrackingUp(v) => self.mouse_tracking_up = v,
            ModeChange::KeyboardLocked(v) => self.keyboard_locked = v,
            ModeChange::Insert(v) => self.insert = v,
            ModeChange::LocalEcho(v) => self.local_echo = v,
            ModeChange::NewLine(v) => self.new_line = v,
            ModeChange::Keypad(v) => self.keypad = v,
            ModeChange::CursorVisible(v) => self.cursor_visible = v,
            ModeChange::CurrentScreen(_) | ModeChange::Vt52(_) | ModeChange::Width(_) => {
                return false
            }
        }
        true
    }
}
