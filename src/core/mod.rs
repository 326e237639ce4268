//! Terminal Core Module
//!
//! Platform-independent terminal state. This module contains:
//! - Parallel-array grids (primary and alternate)
//! - Cursor state, SGR handling and the save/restore stack
//! - Mode flags, charsets and tab stops
//! - The emulator that applies parser events and reports deltas
//! - Consumer-side observers for dirty spans and scrollback
//! - Snapshots for freeze/thaw
//!
//! The core is deterministic: the same event sequence always produces the
//! same state and the same notifications.

mod charset;
mod cursor;
mod dirty;
mod emulator;
mod grid;
mod modes;
mod observer;
mod scrollback;
mod snapshot;

pub use charset::{CharsetName, Charsets, Slot};
pub use cursor::{Cursor, CursorStack};
pub use dirty::{DirtySpan, DirtySpans};
pub use emulator::{Emulator, Margins, DEFAULT_CURSOR_STACK_DEPTH};
pub use grid::{Cell, Grid, LineAttr, LineHeight, LineWidth, Pen, ScrolledLine};
pub use modes::{KeypadMode, ModeChange, Modes, NewLineMode, Origin, ScreenBuffer, ScrollMode};
pub use observer::{Notification, Observer, Recorder, Special};
pub use scrollback::Scrollback;
pub use snapshot::{EmulatorSnapshot, SnapshotError};
