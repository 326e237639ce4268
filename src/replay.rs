//! Playback of recordings
//!
//! [`Player`] pairs a parser with an emulator. [`Replay`] drives a player
//! through a list of records on a caller-supplied clock: each
//! [`Replay::tick`] advances recording time and feeds whatever became due.
//! Nothing here sleeps or reads the wall clock.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::core::{Emulator, EmulatorSnapshot, Observer};
use crate::parser::{ParseError, Parser, ParserSnapshot};
use crate::ttyrec::Record;

/// Replay errors
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("record {record} left the parser stuck: {source}")]
    Corrupt {
        record: usize,
        #[source]
        source: ParseError,
    },
}

/// Parser and emulator state frozen together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub parser: ParserSnapshot,
    pub emulator: EmulatorSnapshot,
}

/// One parser feeding one emulator
#[derive(Debug)]
pub struct Player<O: Observer = ()> {
    parser: Parser,
    emulator: Emulator<O>,
}

impl<O: Observer> Player<O> {
    pub fn new(parser: Parser, emulator: Emulator<O>) -> Self {
        Self { parser, emulator }
    }

    /// Build from configured geometry and limits
    ///
    /// # Panics
    ///
    /// Panics if the configured grid is smaller than 1x2; call
    /// [`Config::validate`] first.
    pub fn from_config(config: &Config, observer: O) -> Self {
        let term = &config.terminal;
        Self::new(
            Parser::with_max_pending(config.parser.max_pending_bytes),
            Emulator::with_options(term.columns, term.rows, term.cursor_stack_depth, observer),
        )
    }

    pub fn feed(&mut self, data: &[u8]) -> Result<(), ParseError> {
        self.parser.feed(data, &mut self.emulator)
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn emulator(&self) -> &Emulator<O> {
        &self.emulator
    }

    pub fn emulator_mut(&mut self) -> &mut Emulator<O> {
        &mut self.emulator
    }

    pub fn freeze(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            parser: self.parser.freeze(),
            emulator: self.emulator.freeze(),
        }
    }

    pub fn thaw(&mut self, snapshot: &PlayerSnapshot) {
        self.parser.thaw(&snapshot.parser);
        self.emulator.thaw(&snapshot.emulator);
    }
}

impl Player<()> {
    /// Unobserved player with default limits
    pub fn with_size(width: usize, height: usize) -> Self {
        Self::new(Parser::new(), Emulator::new(width, height))
    }
}

/// A saved playback position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub player: PlayerSnapshot,
    /// Index of the next record to feed
    pub next: usize,
    /// Recording time reached
    pub clock: Duration,
}

/// Tick-driven playback of a record list
#[derive(Debug)]
pub struct Replay<O: Observer = ()> {
    player: Player<O>,
    records: Vec<Record>,
    initial: PlayerSnapshot,
    next: usize,
    clock: Duration,
    speed: f64,
    max_records_per_tick: usize,
}

impl<O: Observer> Replay<O> {
    /// Start a replay from the player's current state
    pub fn new(player: Player<O>, records: Vec<Record>) -> Self {
        let initial = player.freeze();
        Self {
            player,
            records,
            initial,
            next: 0,
            clock: Duration::ZERO,
            speed: 1.0,
            max_records_per_tick: 60,
        }
    }

    pub fn from_config(config: &Config, records: Vec<Record>, observer: O) -> Self {
        let mut replay = Self::new(Player::from_config(config, observer), records);
        replay.set_speed(config.replay.speed);
        replay.max_records_per_tick = config.replay.max_records_per_tick.max(1);
        replay
    }

    pub fn with_max_records_per_tick(mut self, max: usize) -> Self {
        self.max_records_per_tick = max.max(1);
        self
    }

    pub fn player(&self) -> &Player<O> {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player<O> {
        &mut self.player
    }

    pub fn emulator(&self) -> &Emulator<O> {
        self.player.emulator()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Index of the next record to feed
    pub fn position(&self) -> usize {
        self.next
    }

    /// Recording time reached, relative to the first record
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the playback rate; non-positive or non-finite rates are ignored
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
        } else {
            tracing::warn!(speed, "ignoring invalid replay speed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.records.len()
    }

    /// Offset of record `i` from the first record
    fn offset(&self, i: usize) -> Duration {
        let start = self.records.first().map_or(Duration::ZERO, |r| r.time);
        self.records[i].time.saturating_sub(start)
    }

    fn feed_next(&mut self) -> Result<(), ReplayError> {
        let record = self.next;
        self.next += 1;
        self.player
            .feed(&self.records[record].data)
            .map_err(|source| ReplayError::Corrupt { record, source })
    }

    /// Advance recording time by `elapsed * speed` and feed every record
    /// that is now due, up to the per-tick limit. Returns how many records
    /// were fed.
    pub fn tick(&mut self, elapsed: Duration) -> Result<usize, ReplayError> {
        let advance = Duration::try_from_secs_f64(elapsed.as_secs_f64() * self.speed)
            .unwrap_or(Duration::MAX);
        self.clock = self.clock.saturating_add(advance);
        let mut fed = 0;
        while fed < self.max_records_per_tick
            && !self.is_finished()
            && self.offset(self.next) <= self.clock
        {
            self.feed_next()?;
            fed += 1;
        }
        if fed == self.max_records_per_tick && !self.is_finished() {
            tracing::debug!(position = self.next, "tick limit reached");
        }
        Ok(fed)
    }

    /// Feed every remaining record regardless of time
    pub fn run_to_end(&mut self) -> Result<usize, ReplayError> {
        let mut fed = 0;
        while !self.is_finished() {
            self.feed_next()?;
            fed += 1;
        }
        if let Some(last) = self.records.len().checked_sub(1) {
            self.clock = self.clock.max(self.offset(last));
        }
        Ok(fed)
    }

    /// Back to the state the replay started from
    pub fn rewind(&mut self) {
        self.player.thaw(&self.initial);
        self.next = 0;
        self.clock = Duration::ZERO;
    }

    pub fn bookmark(&self) -> Bookmark {
        Bookmark {
            player: self.player.freeze(),
            next: self.next,
            clock: self.clock,
        }
    }

    pub fn restore(&mut self, mark: &Bookmark) {
        self.player.thaw(&mark.player);
        self.next = mark.next.min(self.records.len());
        self.clock = mark.clock;
    }
}
