//! Emulator notifications
//!
//! The emulator reports every visual delta through an [`Observer`]. It never
//! merges or deduplicates what it reports; consumers such as
//! [`DirtySpans`](super::DirtySpans) do that themselves.

use serde::{Deserialize, Serialize};

use super::grid::ScrolledLine;
use super::modes::ModeChange;

/// Non-cell notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Special {
    Bell,
    WindowTitle(String),
    IconTitle(String),
    Mode(ModeChange),
    /// A row left the scroll region; `direction` is `1` for up, `-1` for down
    ScrollLine { line: ScrolledLine, direction: i8 },
    /// State was replaced wholesale; everything must be repainted
    Thaw,
}

/// Receiver of emulator notifications. Every method defaults to a no-op.
pub trait Observer {
    /// Cells `min..=max` on `row` were written
    fn change(&mut self, _row: usize, _min: usize, _max: usize) {}

    /// The cursor moved; `x` may equal the width while a wrap is pending
    fn cursor(&mut self, _x: usize, _y: usize) {}

    fn special(&mut self, _special: &Special) {}

    /// Bytes the terminal would send back to the host (status reports)
    fn reply(&mut self, _bytes: &[u8]) {}

    /// Unsupported input; the emulator has already logged it
    fn warn(&mut self, _message: &str) {}
}

impl Observer for () {}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn change(&mut self, row: usize, min: usize, max: usize) {
        (**self).change(row, min, max);
    }

    fn cursor(&mut self, x: usize, y: usize) {
        (**self).cursor(x, y);
    }

    fn special(&mut self, special: &Special) {
        (**self).special(special);
    }

    fn reply(&mut self, bytes: &[u8]) {
        (**self).reply(bytes);
    }

    fn warn(&mut self, message: &str) {
        (**self).warn(message);
    }
}

impl<A: Observer, B: Observer> Observer for (A, B) {
    fn change(&mut self, row: usize, min: usize, max: usize) {
        self.0.change(row, min, max);
        self.1.change(row, min, max);
    }

    fn cursor(&mut self, x: usize, y: usize) {
        self.0.cursor(x, y);
        self.1.cursor(x, y);
    }

    fn special(&mut self, special: &Special) {
        self.0.special(special);
        self.1.special(special);
    }

    fn reply(&mut self, bytes: &[u8]) {
        self.0.reply(bytes);
        self.1.reply(bytes);
    }

    fn warn(&mut self, message: &str) {
        self.0.warn(message);
        self.1.warn(message);
    }
}

/// One recorded notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    Change { row: usize, min: usize, max: usize },
    Cursor { x: usize, y: usize },
    Special(Special),
    Reply(Vec<u8>),
    Warn(String),
}

/// Observer that keeps every notification in order
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub notifications: Vec<Notification>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn changes(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Change { row, min, max } => Some((*row, *min, *max)),
            _ => None,
        })
    }

    pub fn specials(&self) -> impl Iterator<Item = &Special> + '_ {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Special(s) => Some(s),
            _ => None,
        })
    }

    /// Concatenated reply bytes
    pub fn replies(&self) -> Vec<u8> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Reply(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> + '_ {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Warn(m) => Some(m.as_str()),
            _ => None,
        })
    }

    pub fn last_cursor(&self) -> Option<(usize, usize)> {
        self.notifications.iter().rev().find_map(|n| match n {
            Notification::Cursor { x, y } => Some((*x, *y)),
            _ => None,
        })
    }
}

impl Observer for Recorder {
    fn change(&mut self, row: usize, min: usize, max: usize) {
        self.notifications.push(Notification::Change { row, min, max });
    }

    fn cursor(&mut self, x: usize, y: usize) {
        self.notifications.push(Notification::Cursor { x, y });
    }

    fn special(&mut self, special: &Special) {
        self.notifications.push(Notification::Special(special.clone()));
    }

    fn reply(&mut self, bytes: &[u8]) {
        self.notifications.push(Notification::Reply(bytes.to_vec()));
    }

    fn warn(&mut self, message: &str) {
        self.notifications.push(Notification::Warn(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let mut rec = Recorder::new();
        rec.change(0, 1, 2);
        rec.cursor(3, 0);
        rec.special(&Special::Bell);
        rec.reply(b"\x1b[0n");
        rec.warn("nope");

        assert_eq!(rec.changes().collect::<Vec<_>>(), vec![(0, 1, 2)]);
        assert_eq!(rec.last_cursor(), Some((3, 0)));
        assert_eq!(rec.specials().collect::<Vec<_>>(), vec![&Special::Bell]);
        assert_eq!(rec.replies(), b"\x1b[0n".to_vec());
        assert_eq!(rec.warnings().collect::<Vec<_>>(), vec!["nope"]);
        assert_eq!(rec.take().len(), 5);
        assert!(rec.notifications.is_empty());
    }

    #[test]
    fn test_pair_forwards_to_both() {
        let mut pair = (Recorder::new(), Recorder::new());
        pair.change(1, 0, 4);
        pair.special(&Special::Thaw);
        assert_eq!(pair.0.notifications, pair.1.notifications);
        assert_eq!(pair.0.notifications.len(), 2);
    }
}
