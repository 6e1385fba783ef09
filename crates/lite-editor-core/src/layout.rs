//! Cell metrics for character-grid renderers.
//!
//! Columns in the core are counted in characters. Renderers that draw onto a cell grid need the
//! display width of each character (UAX #11 via `unicode-width`) and tab stops; these helpers
//! convert between the two.

use unicode_width::UnicodeWidthChar;

/// Tab width used when a caller does not configure one.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Display width of `ch` in cells (control characters count as 1).
pub fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Width of `ch` when drawn at cell `x`; tabs advance to the next tab stop.
pub fn cell_width_at(ch: char, x: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - x % tab_width
    } else {
        char_width(ch)
    }
}

/// Width of a whole line in cells.
pub fn line_width(line: &str, tab_width: usize) -> usize {
    visual_x_for_column(line, usize::MAX, tab_width)
}

/// Cell offset of character `column` within `line`.
pub fn visual_x_for_column(line: &str, column: usize, tab_width: usize) -> usize {
    line.chars()
        .take(column)
        .fold(0, |x, ch| x + cell_width_at(ch, x, tab_width))
}

/// Character column drawn at cell `x` (clamped to the end of the line).
///
/// A cell inside a wide character or a tab maps to that character's column.
pub fn column_for_visual_x(line: &str, x: usize, tab_width: usize) -> usize {
    let mut cell = 0;
    for (column, ch) in line.chars().enumerate() {
        let width = cell_width_at(ch, cell, tab_width);
        if x < cell + width {
            return column;
        }
        cell += width;
    }
    line.chars().count()
}

/// `line` with tabs replaced by spaces up to each tab stop.
pub fn expand_tabs(line: &str, tab_width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut x = 0;
    for ch in line.chars() {
        let width = cell_width_at(ch, x, tab_width);
        if ch == '\t' {
            out.extend(std::iter::repeat_n(' ', width));
        } else {
            out.push(ch);
        }
        x += width;
    }
    out
}
