//! vtplay: terminal recording replay core
//!
//! Turns recorded terminal output into screen state without drawing it:
//!
//! - `parser`: streaming escape sequence parser producing structured events
//! - `core`: VT102 emulator over parallel-array grids, with observers for
//!   change notifications and freeze/thaw snapshots
//! - `ttyrec`: recording file reader and writer
//! - `replay`: parser/emulator pairing and tick-driven playback
//! - `config`: JSON configuration

pub mod config;
pub mod core;
pub mod parser;
pub mod replay;
pub mod ttyrec;

pub use crate::config::{Config, ConfigError};
pub use crate::core::{Emulator, EmulatorSnapshot, Observer};
pub use crate::parser::{Event, ParseError, Parser};
pub use crate::replay::{Player, PlayerSnapshot, Replay, ReplayError};
