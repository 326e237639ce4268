//! Character set handling
//!
//! Two designator slots (G0/G1), each bound to a named mapping table, and a
//! selector choosing which slot translates incoming characters.

use serde::{Deserialize, Serialize};

/// Designator slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    G0,
    G1,
}

/// Named mapping tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetName {
    /// ASCII, identity mapping
    Us,
    /// UK national set: `#` is the pound sign
    Uk,
    /// DEC special graphics (line drawing)
    Line,
    /// Alternate character ROM, mapped as identity
    Rom,
    /// Alternate character ROM special graphics, mapped as identity
    RomSpecial,
}

impl CharsetName {
    /// Translate a single character through this table
    pub fn translate(self, c: char) -> char {
        match self {
            CharsetName::Uk => match c {
                '#' => '\u{A3}',
                _ => c,
            },
            CharsetName::Line => translate_line_drawing(c),
            CharsetName::Us | CharsetName::Rom | CharsetName::RomSpecial => c,
        }
    }
}

/// DEC special graphics for 0x5F-0x7E; scan lines 1, 3, 7 and 9 have no
/// mapping and pass through.
fn translate_line_drawing(c: char) -> char {
    match c {
        '_' => ' ',
        '`' => '\u{2666}', // diamond
        'a' => '\u{2591}', // checkerboard
        'b' => '\u{2409}', // HT
        'c' => '\u{240C}', // FF
        'd' => '\u{240D}', // CR
        'e' => '\u{240A}', // LF
        'f' => '\u{B0}',   // degree
        'g' => '\u{B1}',   // plus/minus
        'h' => '\u{2424}', // NL
        'i' => '\u{240B}', // VT
        'j' => '\u{2518}', // lower right corner
        'k' => '\u{2510}', // upper right corner
        'l' => '\u{250C}', // upper left corner
        'm' => '\u{2514}', // lower left corner
        'n' => '\u{253C}', // crossing
        'q' => '\u{2500}', // horizontal line (scan 5)
        't' => '\u{2524}', // left tee
        'u' => '\u{251C}', // right tee
        'v' => '\u{2534}', // bottom tee
        'w' => '\u{252C}', // top tee
        'x' => '\u{2502}', // vertical bar
        'y' => '\u{2264}', // less than or equal
        'z' => '\u{2265}', // greater than or equal
        '{' => '\u{3C0}',  // pi
        '|' => '\u{2260}', // not equal
        '}' => '\u{A3}',   // pound
        '~' => '\u{B7}',   // centered dot
        _ => c,
    }
}

/// Charset designations plus the active slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charsets {
    pub g0: CharsetName,
    pub g1: CharsetName,
    pub active: Slot,
}

impl Default for Charsets {
    fn default() -> Self {
        Self {
            g0: CharsetName::Us,
            g1: CharsetName::Line,
            active: Slot::G0,
        }
    }
}

impl Charsets {
    /// Table bound to a slot
    pub fn get(&self, slot: Slot) -> CharsetName {
        match slot {
            Slot::G0 => self.g0,
            Slot::G1 => self.g1,
        }
    }

    /// Rebind a slot (SCS)
    pub fn set(&mut self, slot: Slot, name: CharsetName) {
        match slot {
            Slot::G0 => self.g0 = name,
            Slot::G1 => self.g1 = name,
        }
    }

    /// Select the active slot (SI/SO)
    pub fn switch(&mut self, slot: Slot) {
        self.active = slot;
    }

    /// Translate through whichever slot is active right now
    pub fn translate(&self, c: char) -> char {
        self.get(self.active).translate(c)
    }
}
