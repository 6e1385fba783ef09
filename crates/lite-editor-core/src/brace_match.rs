//! Brace matching over the delimiter index.

use crate::buffer::Buffer;
use crate::commands::Position;
use crate::delimiters::{Delimiter, DelimiterRole};

/// Outcome of a match attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A same-type partner was found.
    Matched,
    /// A delimiter of another type closes the anchor's nesting level before any same-type
    /// partner turns up (`{ x )`).
    Mismatched,
}

/// Result of [`match_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceMatch {
    /// Matched or mismatched.
    pub kind: MatchKind,
    /// The delimiter adjacent to the cursor.
    pub anchor: Position,
    /// The anchor's character.
    pub delimiter: char,
    /// Position of the partner when matched.
    pub partner: Option<Position>,
}

impl BraceMatch {
    /// Returns `true` if a partner was found.
    pub fn is_matched(&self) -> bool {
        self.kind == MatchKind::Matched
    }
}

/// Match the delimiter at or just before `cursor`.
///
/// The delimiter whose column is `cursor.column` or `cursor.column - 1` is chosen, preferring the
/// one after the cursor. Returns `None` when neither side of the cursor is a delimiter, and also
/// when the scan runs off the buffer without a partner and without meeting a stray delimiter
/// (an unclosed `{` still being typed is not an error).
pub fn match_at(buffer: &Buffer, cursor: Position) -> Option<BraceMatch> {
    let metadata = buffer.metadata(cursor.line)?;
    let (index, anchor) = metadata
        .delimiters
        .iter()
        .enumerate()
        .rev()
        .find(|(_, d)| d.column == cursor.column || d.column + 1 == cursor.column)
        .map(|(index, d)| (index, *d))?;

    let mut scan = Scan::new(anchor);
    match anchor.role {
        DelimiterRole::Open => scan.forward(buffer, cursor.line, index),
        DelimiterRole::Close => scan.backward(buffer, cursor.line, index),
    }

    let kind = match (scan.partner, scan.stray) {
        (Some(_), _) => MatchKind::Matched,
        (None, true) => MatchKind::Mismatched,
        (None, false) => return None,
    };

    Some(BraceMatch {
        kind,
        anchor: Position::new(cursor.line, anchor.column),
        delimiter: anchor.ch,
        partner: scan.partner,
    })
}

/// Walk state while looking for the partner of `anchor`.
///
/// `depth` counts same-type delimiters only and decides the partner. `nesting` counts every
/// bracket; when it returns to zero on a bracket of another type, that bracket is a stray.
struct Scan {
    anchor: Delimiter,
    depth: isize,
    nesting: isize,
    stray: bool,
    partner: Option<Position>,
}

impl Scan {
    fn new(anchor: Delimiter) -> Self {
        Self {
            anchor,
            depth: 1,
            nesting: 1,
            stray: false,
            partner: None,
        }
    }

    /// Feed one delimiter; returns `true` once the partner is found.
    fn feed(&mut self, line: usize, delimiter: &Delimiter) -> bool {
        let step = if delimiter.role == self.anchor.role {
            1
        } else {
            -1
        };

        if self.anchor.is_bracket() && delimiter.is_bracket() {
            self.nesting += step;
            if self.nesting == 0 && !self.anchor.same_kind(delimiter) {
                self.stray = true;
            }
        }

        if self.anchor.same_kind(delimiter) {
            self.depth += step;
            if self.depth == 0 {
                self.partner = Some(Position::new(line, delimiter.column));
                return true;
            }
        }
        false
    }

    fn forward(&mut self, buffer: &Buffer, line: usize, index: usize) {
        for current in line..buffer.line_count() {
            let Some(metadata) = buffer.metadata(current) else {
                return;
            };
            let skip = if current == line { index + 1 } else { 0 };
            for delimiter in metadata.delimiters.iter().skip(skip) {
                if self.feed(current, delimiter) {
                    return;
                }
            }
        }
    }

    fn backward(&mut self, buffer: &Buffer, line: usize, index: usize) {
        for current in (0..=line).rev() {
            let Some(metadata) = buffer.metadata(current) else {
                return;
            };
            let take = if current == line {
                index
            } else {
                metadata.delimiters.len()
            };
            for delimiter in metadata.delimiters[..take].iter().rev() {
                if self.feed(current, delimiter) {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_nested_brackets_forward_and_backward() {
        let buffer = Buffer::new("if (a) { b(c[d]) }");
        let m = match_at(&buffer, Position::new(0, 7)).unwrap();
        assert_eq!(m.kind, MatchKind::Matched);
        assert_eq!(m.anchor, Position::new(0, 7));
        assert_eq!(m.partner, Some(Position::new(0, 17)));

        let m = match_at(&buffer, Position::new(0, 18)).unwrap();
        assert_eq!(m.delimiter, '}');
        assert_eq!(m.partner, Some(Position::new(0, 7)));
    }

    #[test]
    fn test_prefers_delimiter_after_cursor() {
        // Cursor between `)` and `{`.
        let buffer = Buffer::new("f(){}");
        let m = match_at(&buffer, Position::new(0, 3)).unwrap();
        assert_eq!(m.delimiter, '{');
        assert_eq!(m.partner, Some(Position::new(0, 4)));
    }

    #[test]
    fn test_stray_close_is_mismatched() {
        let buffer = Buffer::new("if (a) { b(c[d]) )");
        let m = match_at(&buffer, Position::new(0, 7)).unwrap();
        assert_eq!(m.kind, MatchKind::Mismatched);
        assert_eq!(m.partner, None);

        // Every `(` before the stray `)` is already closed.
        let m = match_at(&buffer, Position::new(0, 18)).unwrap();
        assert_eq!(m.delimiter, ')');
        assert_eq!(m.anchor, Position::new(0, 17));
        assert_eq!(m.kind, MatchKind::Mismatched);
    }

    #[test]
    fn test_unclosed_open_at_end_of_buffer_has_no_match() {
        let buffer = Buffer::new("func f() {\n\tx()");
        assert!(match_at(&buffer, Position::new(0, 9)).is_none());

        // A stray closer of another type before the end is still reported.
        let buffer = Buffer::new("func f() {\n\tx)");
        let m = match_at(&buffer, Position::new(0, 9)).unwrap();
        assert_eq!(m.kind, MatchKind::Mismatched);
        assert_eq!(m.partner, None);
    }

    #[test]
    fn test_unopened_close_at_start_of_buffer_has_no_match() {
        let buffer = Buffer::new("x()\n}");
        assert!(match_at(&buffer, Position::new(1, 1)).is_none());
    }

    #[test]
    fn test_matches_across_lines() {
        let buffer = Buffer::new("func f() {\n\tx := []int{1}\n}");
        let m = match_at(&buffer, Position::new(2, 0)).unwrap();
        assert_eq!(m.partner, Some(Position::new(0, 9)));
    }

    #[test]
    fn test_no_delimiter_near_cursor() {
        let buffer = Buffer::new("abc (d)");
        assert!(match_at(&buffer, Position::new(0, 1)).is_none());
        assert!(match_at(&buffer, Position::new(5, 0)).is_none());
    }

    #[test]
    fn test_quotes_pair_on_same_line() {
        let buffer = Buffer::new("s := \"x\"");
        let m = match_at(&buffer, Position::new(0, 5)).unwrap();
        assert_eq!(m.partner, Some(Position::new(0, 7)));
    }
}
