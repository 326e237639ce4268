//! Dirty-span accumulation
//!
//! A renderer-side [`Observer`] that unions change notifications into one
//! inclusive column span per row. Starts fully dirty so the first frame is
//! a full paint.

use super::observer::{Observer, Special};

/// Per-row inclusive dirty span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtySpan {
    pub row: usize,
    pub min: usize,
    pub max: usize,
}

/// Accumulates dirty spans between repaints
#[derive(Debug, Clone)]
pub struct DirtySpans {
    width: usize,
    spans: Vec<Option<(usize, usize)>>,
    /// Last reported cursor, clamped into the grid
    cursor: (usize, usize),
    /// Cursor position at the previous `take`
    drawn: (usize, usize),
}

impl DirtySpans {
    pub fn new(width: usize, height: usize) -> Self {
        let mut spans = Self {
            width,
            spans: vec![None; height],
            cursor: (0, 0),
            drawn: (0, 0),
        };
        spans.mark_all();
        spans
    }

    fn mark(&mut self, row: usize, min: usize, max: usize) {
        let Some(span) = self.spans.get_mut(row) else {
            return;
        };
        let max = max.min(self.width.saturating_sub(1));
        *span = Some(match *span {
            Some((lo, hi)) => (lo.min(min), hi.max(max)),
            None => (min, max),
        });
    }

    /// Mark every row as fully dirty
    pub fn mark_all(&mut self) {
        let last = self.width.saturating_sub(1);
        for span in &mut self.spans {
            *span = Some((0, last));
        }
    }

    pub fn is_clean(&self) -> bool {
        self.spans.iter().all(Option::is_none) && self.cursor == self.drawn
    }

    /// Return the spans to repaint and reset.
    ///
    /// If the cursor moved since the last call, both its old and new cells
    /// are included.
    pub fn take(&mut self) -> Vec<DirtySpan> {
        if self.cursor != self.drawn {
            let (cx, cy) = self.cursor;
            let (dx, dy) = self.drawn;
            self.mark(cy, cx, cx);
            self.mark(dy, dx, dx);
            self.drawn = self.cursor;
        }
        self.spans
            .iter_mut()
            .enumerate()
            .filter_map(|(row, span)| span.take().map(|(min, max)| DirtySpan { row, min, max }))
            .collect()
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        self.cursor
    }
}

impl Observer for DirtySpans {
    fn change(&mut self, row: usize, min: usize, max: usize) {
        self.mark(row, min, max);
    }

    fn cursor(&mut self, x: usize, y: usize) {
        self.cursor = (x.min(self.width.saturating_sub(1)), y);
    }

    fn special(&mut self, special: &Special) {
        if let Special::Thaw = special {
            self.mark_all();
        }
    }
}
