//! Scrollback capture
//!
//! Lines that scroll off the top of the region arrive as
//! [`Special::ScrollLine`] notifications. This observer keeps the upward
//! ones in a ring buffer with a fixed capacity.

use super::grid::ScrolledLine;
use super::observer::{Observer, Special};

/// Ring buffer of scrolled-off lines
#[derive(Debug, Clone)]
pub struct Scrollback {
    lines: Vec<ScrolledLine>,
    /// Index of the oldest line
    head: usize,
    len: usize,
    capacity: usize,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity.min(1000)),
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a line, overwriting the oldest once full
    pub fn push(&mut self, line: ScrolledLine) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() < self.capacity {
            self.lines.push(line);
            self.len += 1;
        } else {
            self.lines[self.head] = line;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Line by age (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&ScrolledLine> {
        if index >= self.len {
            return None;
        }
        self.lines.get((self.head + index) % self.lines.len())
    }

    /// Line by recency (0 = most recent)
    pub fn get_from_end(&self, index: usize) -> Option<&ScrolledLine> {
        if index >= self.len {
            return None;
        }
        self.get(self.len - 1 - index)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.head = 0;
        self.len = 0;
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ScrolledLine> + '_ {
        (0..self.len).map(move |i| &self.lines[(self.head + i) % self.lines.len()])
    }

    /// Text of every line, trailing blanks trimmed
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in self.iter() {
            out.push_str(line.text.trim_end());
            out.push('\n');
        }
        out
    }
}

impl Observer for Scrollback {
    fn special(&mut self, special: &Special) {
        if let Special::ScrollLine { line, direction: 1 } = special {
            self.push(line.clone());
        }
    }
}
