//! Emulator snapshots
//!
//! A snapshot is an owned deep copy of every piece of emulator state: both
//! grids, cursor and saved cursors, modes, margins, tabs, titles and charset
//! bindings. Snapshots compare structurally and serialize to JSON so a
//! paused session can be stored and compared later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cursor::Cursor;
use super::emulator::{Margins, TermState};
use super::grid::Grid;
use super::modes::Modes;

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inconsistent snapshot: {0}")]
    Inconsistent(String),
}

/// Full emulator state at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmulatorSnapshot {
    state: TermState,
}

impl EmulatorSnapshot {
    pub(crate) fn new(state: TermState) -> Self {
        Self { state }
    }

    pub(crate) fn state(&self) -> &TermState {
        &self.state
    }

    pub fn width(&self) -> usize {
        self.state.width
    }

    pub fn height(&self) -> usize {
        self.state.height
    }

    /// The grid that was live when the snapshot was taken
    pub fn grid(&self) -> &Grid {
        &self.state.screens[self.state.modes.current_screen.index()]
    }

    pub fn cursor(&self) -> &Cursor {
        &self.state.cursor
    }

    pub fn modes(&self) -> &Modes {
        &self.state.modes
    }

    pub fn margins(&self) -> Margins {
        self.state.margins
    }

    /// Text of the live grid with trailing blanks trimmed per row
    pub fn to_text(&self) -> String {
        let grid = self.grid();
        (0..grid.height())
            .map(|y| grid.row_text(y).trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a snapshot and check its structural invariants
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check array lengths, margins, cursor bounds and saved cursors
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.state.check_consistent().map_err(SnapshotError::Inconsistent)
    }
}
