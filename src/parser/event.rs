//! Events produced by the parser
//!
//! A closed set: every recognized sequence maps to exactly one variant with
//! a typed payload, and the emulator matches on it exhaustively.

use serde::{Deserialize, Serialize};

use crate::core::{CharsetName, LineAttr, ModeChange, Origin, Slot};

/// Single-byte controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialChar {
    Bell,
    Backspace,
    HorizontalTab,
    LineFeed,
    VerticalTab,
    FormFeed,
    CarriageReturn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetAction {
    /// SI/SO: make a slot active
    Switch(Slot),
    /// SCS: bind a slot to a table
    Set(Slot, CharsetName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GotoTarget {
    Home,
    /// 1-based, as sent on the wire
    Position { row: u16, col: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// IND
    Down,
    /// RI
    Up,
    /// NEL
    NextLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackAction {
    Push,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EraseScope {
    /// From the start up to and including the cursor
    ToStart,
    /// From the cursor to the end
    ToEnd,
    Whole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabAction {
    /// HTS: set a stop at the cursor column
    Add,
    /// TBC 0: clear the stop at the cursor column
    Remove,
    /// TBC 3: clear every stop
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    Status,
    Printer,
    CursorPosition,
    DeviceAttributes,
    VersionString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Led {
    AllOff,
    On(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftSlot {
    G2,
    G3,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hardware {
    /// DECTST with its raw parameter text
    SelfTest(String),
    /// DECALN
    ScreenAlignment,
}

/// One structured event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    SpecialChar(SpecialChar),
    Charset(CharsetAction),
    /// A run of printable characters
    NormalString(String),
    Arrow(Direction, u16),
    Goto(GotoTarget),
    /// CHA, 1-based
    GotoColumn(u16),
    /// VPA, 1-based
    GotoRow(u16),
    Index(IndexKind),
    CursorStack(StackAction),
    Mode(ModeChange),
    OriginMode(Origin),
    /// SS2/SS3 followed by one character
    SingleShift(ShiftSlot, char),
    TabStop(TabAction),
    LineAttr(LineAttr),
    EraseInLine(EraseScope),
    EraseInDisplay(EraseScope),
    DeleteChars(u16),
    InsertChars(u16),
    EraseChars(u16),
    InsertLines(u16),
    DeleteLines(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    Report(ReportKind),
    Led(Led),
    SetWindowTitle(String),
    SetIconTitle(String),
    SetWindowIconTitle(String),
    /// DECSTBM, 1-based; `None` means the screen edge
    SetMargins { top: Option<u16>, bottom: Option<u16> },
    ResetMargins,
    SoftReset,
    Reset,
    SetAttribute(u16),
    Hardware(Hardware),
}
