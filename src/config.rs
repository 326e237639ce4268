//! Configuration for the replay core

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Replay configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terminal: TerminalConfig,
    pub parser: ParserConfig,
    pub replay: ReplayConfig,
}

/// Grid geometry and per-terminal limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub columns: usize,
    pub rows: usize,
    /// Saved cursors kept before the oldest is dropped
    pub cursor_stack_depth: usize,
    /// Lines kept by the scrollback observer
    pub scrollback_lines: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 24,
            cursor_stack_depth: 64,
            scrollback_lines: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Unmatched bytes tolerated before input is declared stuck
    pub max_pending_bytes: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_pending_bytes: 1024,
        }
    }
}

/// Playback scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Records fed per tick at most; the rest wait for the next tick
    pub max_records_per_tick: usize,
    /// Recording seconds per wall-clock second
    pub speed: f64,
    /// Ticks per second for the headless runner
    pub tick_rate: u32,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_records_per_tick: 60,
            speed: 1.0,
            tick_rate: 60,
        }
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from the default location or return the default
    pub fn load_or_default() -> Self {
        let Some(path) = default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring config: {e}");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.terminal.columns < 1 {
            return invalid("terminal.columns must be at least 1");
        }
        if self.terminal.rows < 2 {
            return invalid("terminal.rows must be at least 2");
        }
        if self.terminal.cursor_stack_depth < 1 {
            return invalid("terminal.cursor_stack_depth must be at least 1");
        }
        if self.parser.max_pending_bytes < 16 {
            return invalid("parser.max_pending_bytes must be at least 16");
        }
        if self.replay.max_records_per_tick < 1 {
            return invalid("replay.max_records_per_tick must be at least 1");
        }
        if !(self.replay.speed.is_finite() && self.replay.speed > 0.0) {
            return invalid("replay.speed must be a positive number");
        }
        if self.replay.tick_rate < 1 {
            return invalid("replay.tick_rate must be at least 1");
        }
        Ok(())
    }
}

/// `$HOME/.config/vtplay/config.json`
pub fn default_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("vtplay")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
