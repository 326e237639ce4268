//! Escape sequence parser
//!
//! Turns a byte stream into structured [`Event`]s. Input may arrive in
//! arbitrary chunks; incomplete sequences are held until they complete.

mod event;
mod lexer;
mod state;

pub use event::{
    CharsetAction, Direction, EraseScope, Event, GotoTarget, Hardware, IndexKind, Led, ReportKind,
    ShiftSlot, SpecialChar, StackAction, TabAction,
};
pub use state::{EventSink, ParseError, Parser, ParserSnapshot, DEFAULT_MAX_PENDING};
