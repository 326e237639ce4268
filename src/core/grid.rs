//! Terminal Grid
//!
//! One screen's worth of character cells, stored as parallel arrays (one
//! per attribute) indexed by `x + y * width`, plus a per-row line attribute.
//! Every structural edit goes through a helper that touches all arrays, so
//! their lengths never drift apart.

use serde::{Deserialize, Serialize};

/// Drawing attributes carried by a cell (and by the cursor pen)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pen {
    pub bold: bool,
    pub underline: bool,
    /// Normal (low) intensity palette; cleared by SGR 22 for the bright palette
    pub lowintensity: bool,
    pub blink: bool,
    /// Foreground color index (0-9)
    pub fcolor: u8,
    /// Background color index (0-9)
    pub bcolor: u8,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            bold: false,
            underline: false,
            lowintensity: true,
            blink: false,
            fcolor: 7,
            bcolor: 0,
        }
    }
}

/// A single cell read out of the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub ch: char,
    pub pen: Pen,
}

impl Cell {
    /// Space with default attributes, used for every erase
    pub const BLANK: Cell = Cell {
        ch: ' ',
        pen: Pen {
            bold: false,
            underline: false,
            lowintensity: true,
            blink: false,
            fcolor: 7,
            bcolor: 0,
        },
    };

    pub fn new(ch: char, pen: Pen) -> Self {
        Self { ch, pen }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::BLANK
    }
}

/// Horizontal line size (DECDWL/DECSWL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineWidth {
    #[default]
    Normal,
    Double,
}

/// Vertical line size (DECDHL halves)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineHeight {
    #[default]
    Normal,
    Top,
    Bottom,
}

/// Per-row double-width/double-height marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineAttr {
    pub width: LineWidth,
    pub height: LineHeight,
}

impl LineAttr {
    pub const NORMAL: LineAttr = LineAttr {
        width: LineWidth::Normal,
        height: LineHeight::Normal,
    };
}

/// A row as reported when it leaves the scroll region.
///
/// Attributes are flattened to one string per attribute: booleans as `T`/`F`,
/// colors as decimal digits, one character per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrolledLine {
    pub text: String,
    pub bold: String,
    pub underline: String,
    pub lowintensity: String,
    pub blink: String,
    pub fcolor: String,
    pub bcolor: String,
    pub line_attr: LineAttr,
}

impl ScrolledLine {
    /// Whether every cell is a blank with default attributes
    pub fn is_blank(&self) -> bool {
        self.text.chars().all(|c| c == ' ')
            && self.bold.chars().all(|c| c == 'F')
            && self.underline.chars().all(|c| c == 'F')
            && self.lowintensity.chars().all(|c| c == 'T')
            && self.blink.chars().all(|c| c == 'F')
            && self.fcolor.chars().all(|c| c == '7')
            && self.bcolor.chars().all(|c| c == '0')
    }
}

fn flag(b: bool) -> char {
    if b {
        'T'
    } else {
        'F'
    }
}

fn digit(v: u8) -> char {
    char::from_digit(u32::from(v), 10).unwrap_or('?')
}

/// Remove `width` elements starting at row `remove`, then insert `width`
/// copies of `fill` at row `insert` (indices after the removal).
fn cycle_row<T: Copy>(v: &mut Vec<T>, width: usize, remove: usize, insert: usize, fill: T) -> Vec<T> {
    let removed: Vec<T> = v.drain(remove * width..(remove + 1) * width).collect();
    let at = insert * width;
    v.splice(at..at, std::iter::repeat(fill).take(width));
    removed
}

fn shift_right<T: Copy>(v: &mut [T], start: usize, end: usize, value: T) {
    v[start..end].rotate_right(1);
    v[start] = value;
}

fn shift_left<T: Copy>(v: &mut [T], start: usize, end: usize, fill: T) {
    v[start..end].rotate_left(1);
    v[end - 1] = fill;
}

/// Character grid with parallel attribute arrays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    text: Vec<char>,
    bold: Vec<bool>,
    underline: Vec<bool>,
    lowintensity: Vec<bool>,
    blink: Vec<bool>,
    fcolor: Vec<u8>,
    bcolor: Vec<u8>,
    line_attr: Vec<LineAttr>,
}

impl Grid {
    /// Create a blank grid
    pub fn new(width: usize, height: usize) -> Self {
        let n = width * height;
        let blank = Cell::BLANK.pen;
        Self {
            width,
            height,
            text: vec![' '; n],
            bold: vec![blank.bold; n],
            underline: vec![blank.underline; n],
            lowintensity: vec![blank.lowintensity; n],
            blink: vec![blank.blink; n],
            fcolor: vec![blank.fcolor; n],
            bcolor: vec![blank.bcolor; n],
            line_attr: vec![LineAttr::NORMAL; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Linear index of a cell
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    // Direct array access for renderers doing a full repaint

    pub fn text(&self) -> &[char] {
        &self.text
    }

    pub fn bold(&self) -> &[bool] {
        &self.bold
    }

    pub fn underline(&self) -> &[bool] {
        &self.underline
    }

    pub fn lowintensity(&self) -> &[bool] {
        &self.lowintensity
    }

    pub fn blink(&self) -> &[bool] {
        &self.blink
    }

    pub fn fcolor(&self) -> &[u8] {
        &self.fcolor
    }

    pub fn bcolor(&self) -> &[u8] {
        &self.bcolor
    }

    pub fn line_attrs(&self) -> &[LineAttr] {
        &self.line_attr
    }

    /// Read one cell
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        let i = self.index(x, y);
        Cell {
            ch: self.text[i],
            pen: Pen {
                bold: self.bold[i],
                underline: self.underline[i],
                lowintensity: self.lowintensity[i],
                blink: self.blink[i],
                fcolor: self.fcolor[i],
                bcolor: self.bcolor[i],
            },
        }
    }

    /// Overwrite one cell
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        let i = self.index(x, y);
        self.text[i] = cell.ch;
        self.bold[i] = cell.pen.bold;
        self.underline[i] = cell.pen.underline;
        self.lowintensity[i] = cell.pen.lowintensity;
        self.blink[i] = cell.pen.blink;
        self.fcolor[i] = cell.pen.fcolor;
        self.bcolor[i] = cell.pen.bcolor;
    }

    pub fn line_attr(&self, y: usize) -> LineAttr {
        self.line_attr[y]
    }

    pub fn set_line_attr(&mut self, y: usize, attr: LineAttr) {
        self.line_attr[y] = attr;
    }

    /// Blank the inclusive column span `[x0, x1]` of a row
    pub fn blank_span(&mut self, y: usize, x0: usize, x1: usize) {
        for x in x0..=x1 {
            self.set(x, y, Cell::BLANK);
        }
    }

    /// Blank a whole row and reset its line attribute
    pub fn blank_row(&mut self, y: usize) {
        self.blank_span(y, 0, self.width - 1);
        self.line_attr[y] = LineAttr::NORMAL;
    }

    /// Fill every cell with `ch` in default attributes
    pub fn fill(&mut self, ch: char) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.set(x, y, Cell::new(ch, Pen::default()));
            }
            self.line_attr[y] = LineAttr::NORMAL;
        }
    }

    /// Snapshot a row in scrollback form
    pub fn row_line(&self, y: usize) -> ScrolledLine {
        let row = y * self.width..(y + 1) * self.width;
        ScrolledLine {
            text: self.text[row.clone()].iter().collect(),
            bold: self.bold[row.clone()].iter().map(|&b| flag(b)).collect(),
            underline: self.underline[row.clone()].iter().map(|&b| flag(b)).collect(),
            lowintensity: self.lowintensity[row.clone()].iter().map(|&b| flag(b)).collect(),
            blink: self.blink[row.clone()].iter().map(|&b| flag(b)).collect(),
            fcolor: self.fcolor[row.clone()].iter().map(|&c| digit(c)).collect(),
            bcolor: self.bcolor[row].iter().map(|&c| digit(c)).collect(),
            line_attr: self.line_attr[y],
        }
    }

    /// Text of a row, untrimmed
    pub fn row_text(&self, y: usize) -> String {
        self.text[y * self.width..(y + 1) * self.width].iter().collect()
    }

    /// Remove row `remove` and insert a blank row at `insert`.
    ///
    /// `insert` is interpreted after the removal, so `(top, bottom)` scrolls a
    /// region up and `(bottom, top)` scrolls it down. Returns the removed row.
    pub fn cycle_rows(&mut self, remove: usize, insert: usize) -> ScrolledLine {
        let line = self.row_line(remove);
        let w = self.width;
        let blank = Cell::BLANK.pen;
        cycle_row(&mut self.text, w, remove, insert, ' ');
        cycle_row(&mut self.bold, w, remove, insert, blank.bold);
        cycle_row(&mut self.underline, w, remove, insert, blank.underline);
        cycle_row(&mut self.lowintensity, w, remove, insert, blank.lowintensity);
        cycle_row(&mut self.blink, w, remove, insert, blank.blink);
        cycle_row(&mut self.fcolor, w, remove, insert, blank.fcolor);
        cycle_row(&mut self.bcolor, w, remove, insert, blank.bcolor);
        cycle_row(&mut self.line_attr, 1, remove, insert, LineAttr::NORMAL);
        line
    }

    /// Insert `cell` at `x`, shifting the rest of the row right; the last
    /// cell of the row falls off.
    pub fn insert_cell(&mut self, x: usize, y: usize, cell: Cell) {
        let start = self.index(x, y);
        let end = self.index(0, y + 1);
        shift_right(&mut self.text, start, end, cell.ch);
        shift_right(&mut self.bold, start, end, cell.pen.bold);
        shift_right(&mut self.underline, start, end, cell.pen.underline);
        shift_right(&mut self.lowintensity, start, end, cell.pen.lowintensity);
        shift_right(&mut self.blink, start, end, cell.pen.blink);
        shift_right(&mut self.fcolor, start, end, cell.pen.fcolor);
        shift_right(&mut self.bcolor, start, end, cell.pen.bcolor);
    }

    /// Delete the cell at `x`, shifting the rest of the row left and
    /// backfilling a blank at the right edge.
    pub fn delete_cell(&mut self, x: usize, y: usize) {
        let start = self.index(x, y);
        let end = self.index(0, y + 1);
        let blank = Cell::BLANK.pen;
        shift_left(&mut self.text, start, end, ' ');
        shift_left(&mut self.bold, start, end, blank.bold);
        shift_left(&mut self.underline, start, end, blank.underline);
        shift_left(&mut self.lowintensity, start, end, blank.lowintensity);
        shift_left(&mut self.blink, start, end, blank.blink);
        shift_left(&mut self.fcolor, start, end, blank.fcolor);
        shift_left(&mut self.bcolor, start, end, blank.bcolor);
    }

    /// Check that every array has the length its dimensions require
    pub fn check_consistent(&self) -> Result<(), String> {
        let n = self.width * self.height;
        let lens = [
            ("text", self.text.len()),
            ("bold", self.bold.len()),
            ("underline", self.underline.len()),
            ("lowintensity", self.lowintensity.len()),
            ("blink", self.blink.len()),
            ("fcolor", self.fcolor.len()),
            ("bcolor", self.bcolor.len()),
        ];
        for (name, len) in lens {
            if len != n {
                return Err(format!("{name} has {len} cells, expected {n}"));
            }
        }
        if self.line_attr.len() != self.height {
            return Err(format!(
                "line_attr has {} rows, expected {}",
                self.line_attr.len(),
                self.height
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_row(grid: &mut Grid, y: usize, s: &str) {
        for (x, ch) in s.chars().enumerate() {
            grid.set(x, y, Cell::new(ch, Pen::default()));
        }
    }

    #[test]
    fn test_grid_new_is_blank() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.text().len(), 12);
        assert_eq!(grid.line_attrs().len(), 3);
        assert_eq!(grid.cell(3, 2), Cell::BLANK);
        assert!(grid.check_consistent().is_ok());
    }

    #[test]
    fn test_cycle_rows_up_and_down() {
        let mut grid = Grid::new(3, 3);
        write_row(&mut grid, 0, "aaa");
        write_row(&mut grid, 1, "bbb");
        write_row(&mut grid, 2, "ccc");

        let gone = grid.cycle_rows(0, 2);
        assert_eq!(gone.text, "aaa");
        assert_eq!(grid.row_text(0), "bbb");
        assert_eq!(grid.row_text(1), "ccc");
        assert_eq!(grid.row_text(2), "   ");

        let gone = grid.cycle_rows(2, 0);
        assert!(gone.is_blank());
        assert_eq!(grid.row_text(0), "   ");
        assert_eq!(grid.row_text(1), "bbb");
        assert!(grid.check_consistent().is_ok());
    }

    #[test]
    fn test_cycle_rows_moves_line_attr() {
        let mut grid = Grid::new(2, 3);
        let double = LineAttr {
            width: LineWidth::Double,
            height: LineHeight::Normal,
        };
        grid.set_line_attr(1, double);
        let gone = grid.cycle_rows(0, 2);
        assert_eq!(gone.line_attr, LineAttr::NORMAL);
        assert_eq!(grid.line_attr(0), double);
        assert_eq!(grid.line_attr(2), LineAttr::NORMAL);
    }

    #[test]
    fn test_insert_and_delete_cell() {
        let mut grid = Grid::new(4, 2);
        write_row(&mut grid, 0, "abcd");
        write_row(&mut grid, 1, "wxyz");

        let mut pen = Pen::default();
        pen.bold = true;
        grid.insert_cell(1, 0, Cell::new('Q', pen));
        assert_eq!(grid.row_text(0), "aQbc");
        assert!(grid.cell(1, 0).pen.bold);
        assert_eq!(grid.row_text(1), "wxyz");

        grid.delete_cell(0, 0);
        assert_eq!(grid.row_text(0), "Qbc ");
        assert_eq!(grid.cell(3, 0), Cell::BLANK);
        assert_eq!(grid.row_text(1), "wxyz");
    }

    #[test]
    fn test_row_line_flattens_attributes() {
        let mut grid = Grid::new(2, 1);
        let pen = Pen {
            bold: true,
            underline: false,
            lowintensity: false,
            blink: true,
            fcolor: 1,
            bcolor: 4,
        };
        grid.set(0, 0, Cell::new('x', pen));
        let line = grid.row_line(0);
        assert_eq!(line.text, "x ");
        assert_eq!(line.bold, "TF");
        assert_eq!(line.lowintensity, "FT");
        assert_eq!(line.blink, "TF");
        assert_eq!(line.fcolor, "17");
        assert_eq!(line.bcolor, "40");
        assert!(!line.is_blank());
    }

    #[test]
    fn test_blank_row_resets_line_attr() {
        let mut grid = Grid::new(3, 2);
        write_row(&mut grid, 1, "abc");
        grid.set_line_attr(
            1,
            LineAttr {
                width: LineWidth::Double,
                height: LineHeight::Top,
            },
        );
        grid.blank_row(1);
        assert_eq!(grid.row_text(1), "   ");
        assert_eq!(grid.line_attr(1), LineAttr::NORMAL);
    }
}
