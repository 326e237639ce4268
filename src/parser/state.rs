//! Streaming parser
//!
//! Bytes are appended to a pending buffer and the lexer claims tokens from
//! its front until nothing matches. Whatever is left stays buffered for the
//! next call, so chunk boundaries never change the event stream. If the
//! leftover grows past the configured bound the input is declared stuck.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::Event;
use super::lexer::{self, Output};

/// Default bound on unmatched bytes
pub const DEFAULT_MAX_PENDING: usize = 1024;

/// Parser errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("stuck on {} unmatched bytes: {}", .pending.len(), .pending.escape_ascii())]
    StuckInput { pending: Vec<u8> },
}

/// Receives events in input order
pub trait EventSink {
    fn event(&mut self, event: Event);

    /// Unhandled or malformed input that was consumed without an event
    fn warn(&mut self, message: &str) {
        tracing::warn!("{message}");
    }
}

impl EventSink for Vec<Event> {
    fn event(&mut self, event: Event) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn event(&mut self, event: Event) {
        (**self).event(event);
    }

    fn warn(&mut self, message: &str) {
        (**self).warn(message);
    }
}

/// Buffered parser state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserSnapshot {
    pub pending: Vec<u8>,
}

/// The byte-stream parser
#[derive(Debug, Clone)]
pub struct Parser {
    pending: Vec<u8>,
    max_pending: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with the default pending bound
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING)
    }

    pub fn with_max_pending(max_pending: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_pending,
        }
    }

    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    /// Bytes waiting for the rest of a sequence
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Drop any buffered bytes
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Append `data` and deliver every complete token to `sink`
    ///
    /// Events are delivered before the bound is checked, so a stuck error
    /// only ever concerns bytes that produced nothing.
    pub fn feed<S: EventSink + ?Sized>(
        &mut self,
        data: &[u8],
        sink: &mut S,
    ) -> Result<(), ParseError> {
        self.pending.extend_from_slice(data);

        let mut offset = 0;
        while let Some(lexeme) = lexer::next_lexeme(&self.pending[offset..]) {
            offset += lexeme.len;
            for out in lexeme.out {
                match out {
                    Output::Event(event) => sink.event(event),
                    Output::Warn(message) => sink.warn(&message),
                }
            }
        }
        self.pending.drain(..offset);

        if self.pending.len() > self.max_pending {
            return Err(ParseError::StuckInput {
                pending: self.pending.clone(),
            });
        }
        Ok(())
    }

    /// Feed `data` and collect the events
    pub fn parse(&mut self, data: &[u8]) -> Result<Vec<Event>, ParseError> {
        let mut events = Vec::new();
        self.feed(data, &mut events)?;
        Ok(events)
    }

    pub fn freeze(&self) -> ParserSnapshot {
        ParserSnapshot {
            pending: self.pending.clone(),
        }
    }

    pub fn thaw(&mut self, snapshot: &ParserSnapshot) {
        self.pending.clone_from(&snapshot.pending);
    }
}
