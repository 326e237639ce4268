//! Cursor state management
//!
//! The cursor tracks position and the pen used for new characters. It also
//! supports nested save/restore (DECSC/DECRC) through a bounded stack.

use serde::{Deserialize, Serialize};

use super::grid::Pen;

/// Cursor position plus drawing attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Column; equals the grid width while a wrap is pending
    pub x: usize,
    /// Row, always inside the grid
    pub y: usize,
    pub bold: bool,
    pub underline: bool,
    pub lowintensity: bool,
    pub blink: bool,
    /// Reverse video; fcolor/bcolor are already swapped while set
    pub reversed: bool,
    /// Stored only, not applied to cells
    pub invisible: bool,
    pub fcolor: u8,
    pub bcolor: u8,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            bold: false,
            underline: false,
            lowintensity: true,
            blink: false,
            reversed: false,
            invisible: false,
            fcolor: 7,
            bcolor: 0,
        }
    }
}

impl Cursor {
    /// Create a new cursor at the home position
    pub fn new() -> Self {
        Self::default()
    }

    /// The attributes written into cells placed at this cursor
    pub fn pen(&self) -> Pen {
        Pen {
            bold: self.bold,
            underline: self.underline,
            lowintensity: self.lowintensity,
            blink: self.blink,
            fcolor: self.fcolor,
            bcolor: self.bcolor,
        }
    }

    /// Reset only the text attributes (SGR 0), keeping the position
    pub fn reset_attributes(&mut self) {
        *self = Self {
            x: self.x,
            y: self.y,
            ..Self::default()
        };
    }

    /// Apply one SGR parameter. Returns `false` for codes that are not handled.
    pub fn set_attribute(&mut self, attr: u16) -> bool {
        match attr {
            0 => self.reset_attributes(),
            1 | 21 => self.bold = attr == 1,
            2 | 22 => self.lowintensity = attr == 2,
            4 | 24 => self.underline = attr == 4,
            5 | 25 => self.blink = attr == 5,
            7 | 27 => {
                // Swap only on a net state change so repeated 7s don't flip back
                if (self.reversed && attr == 7) || (!self.reversed && attr == 27) {
                    return true;
                }
                std::mem::swap(&mut self.fcolor, &mut self.bcolor);
                self.reversed = attr == 7;
            }
            8 | 28 => self.invisible = attr == 8,
            30..=39 => self.fcolor = (attr - 30) as u8,
            40..=49 => self.bcolor = (attr - 40) as u8,
            _ => return false,
        }
        true
    }
}

/// Bounded LIFO of saved cursors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorStack {
    saved: Vec<Cursor>,
    depth: usize,
}

impl CursorStack {
    /// Create an empty stack holding at most `depth` cursors
    pub fn new(depth: usize) -> Self {
        Self {
            saved: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Save a cursor; the oldest entry is dropped once the stack is full
    pub fn push(&mut self, cursor: Cursor) {
        if self.depth == 0 {
            return;
        }
        if self.saved.len() >= self.depth {
            tracing::debug!(depth = self.depth, "cursor stack full, dropping oldest entry");
            let excess = self.saved.len() + 1 - self.depth;
            self.saved.drain(..excess);
        }
        self.saved.push(cursor);
    }

    pub fn pop(&mut self) -> Option<Cursor> {
        self.saved.pop()
    }

    pub fn len(&self) -> usize {
        self.saved.len()
    }

    /// Maximum number of saved cursors
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub fn clear(&mut self) {
        self.saved.clear();
    }

    /// Every saved cursor must fit a `width` x `height` grid
    pub(crate) fn check_consistent(&self, width: usize, height: usize) -> Result<(), String> {
        if self.depth < 1 || self.saved.len() > self.depth {
            return Err(format!(
                "cursor stack holds {} entries with depth {}",
                self.saved.len(),
                self.depth
            ));
        }
        match self.saved.iter().find(|c| c.x > width || c.y >= height) {
            Some(c) => Err(format!("saved cursor ({}, {}) out of range", c.x, c.y)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_default() {
        let cursor = Cursor::default();
        assert_eq!((cursor.x, cursor.y), (0, 0));
        assert!(cursor.lowintensity);
        assert_eq!(cursor.pen(), Pen::default());
    }

    #[test]
    fn test_sgr_reset_keeps_position() {
        let mut cursor = Cursor::new();
        cursor.x = 5;
        cursor.y = 3;
        cursor.set_attribute(1);
        cursor.set_attribute(31);
        cursor.set_attribute(0);
        assert_eq!((cursor.x, cursor.y), (5, 3));
        assert!(!cursor.bold);
        assert_eq!(cursor.fcolor, 7);
    }

    #[test]
    fn test_sgr_on_off_pairs() {
        let mut cursor = Cursor::new();
        for (on, off) in [(1, 21), (4, 24), (5, 25), (8, 28)] {
            cursor.set_attribute(on);
            cursor.set_attribute(off);
        }
        assert_eq!(cursor, Cursor::default());

        cursor.set_attribute(22);
        assert!(!cursor.lowintensity);
        cursor.set_attribute(2);
        assert!(cursor.lowintensity);
    }

    #[test]
    fn test_sgr_colors() {
        let mut cursor = Cursor::new();
        cursor.set_attribute(32);
        cursor.set_attribute(44);
        assert_eq!(cursor.fcolor, 2);
        assert_eq!(cursor.bcolor, 4);
        cursor.set_attribute(39);
        cursor.set_attribute(49);
        assert_eq!(cursor.fcolor, 9);
        assert_eq!(cursor.bcolor, 9);
    }

    #[test]
    fn test_sgr_reverse_swaps_once() {
        let mut cursor = Cursor::new();
        cursor.set_attribute(31);
        cursor.set_attribute(42);

        cursor.set_attribute(7);
        assert_eq!((cursor.fcolor, cursor.bcolor), (2, 1));
        cursor.set_attribute(7);
        assert_eq!((cursor.fcolor, cursor.bcolor), (2, 1));

        cursor.set_attribute(27);
        assert_eq!((cursor.fcolor, cursor.bcolor), (1, 2));
        cursor.set_attribute(27);
        assert_eq!((cursor.fcolor, cursor.bcolor), (1, 2));
        assert!(!cursor.reversed);
    }

    #[test]
    fn test_sgr_unknown_is_rejected() {
        let mut cursor = Cursor::new();
        assert!(!cursor.set_attribute(3));
        assert!(!cursor.set_attribute(90));
        assert!(!cursor.set_attribute(100));
        assert_eq!(cursor, Cursor::default());
    }

    #[test]
    fn test_cursor_stack_is_bounded() {
        let mut stack = CursorStack::new(2);
        for x in 0..3 {
            let mut c = Cursor::new();
            c.x = x;
            stack.push(c);
        }
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().map(|c| c.x), Some(2));
        assert_eq!(stack.pop().map(|c| c.x), Some(1));
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_cursor_stack_zero_depth_drops_pushes() {
        let mut stack: CursorStack =
            serde_json::from_str(r#"{"saved": [], "depth": 0}"#).unwrap();
        stack.push(Cursor::new());
        assert!(stack.is_empty());
        assert!(stack.check_consistent(10, 5).is_err());
    }

    #[test]
    fn test_cursor_stack_consistency() {
        let mut stack = CursorStack::new(2);
        let mut c = Cursor::new();
        c.x = 10;
        c.y = 4;
        stack.push(c);
        assert!(stack.check_consistent(10, 5).is_ok());
        assert!(stack.check_consistent(10, 4).is_err());
        assert!(stack.check_consistent(9, 5).is_err());
    }
}
