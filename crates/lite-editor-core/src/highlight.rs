//! Cursor-derived highlight state handed to renderers.
//!
//! The editor owns one [`HighlightState`] and refreshes it after every command; renderers only
//! read it. It holds the current line and the brace match around the cursor.

use crate::brace_match::{self, BraceMatch, MatchKind};
use crate::buffer::Buffer;
use crate::commands::Position;

/// How a highlighted character should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// One side of a matched delimiter pair (underlined).
    BraceMatch,
    /// A delimiter without a partner (drawn in the error color).
    BraceMismatch,
}

/// A single highlighted character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterHighlight {
    /// Position of the character.
    pub position: Position,
    /// Highlight kind.
    pub kind: HighlightKind,
}

/// Current-line and brace-match state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightState {
    current_line: usize,
    brace: Option<BraceMatch>,
}

impl HighlightState {
    /// Recompute from `cursor`. Returns `true` if anything changed.
    pub fn refresh(&mut self, buffer: &Buffer, cursor: Position) -> bool {
        let next = HighlightState {
            current_line: cursor.line,
            brace: brace_match::match_at(buffer, cursor),
        };
        let changed = *self != next;
        *self = next;
        changed
    }

    /// Line holding the cursor.
    pub fn current_line(&self) -> usize {
        self.current_line
    }

    /// Brace match around the cursor, if any.
    pub fn brace_match(&self) -> Option<&BraceMatch> {
        self.brace.as_ref()
    }

    /// Characters to decorate.
    pub fn delimiter_highlights(&self) -> Vec<DelimiterHighlight> {
        let Some(brace) = &self.brace else {
            return Vec::new();
        };
        match (brace.kind, brace.partner) {
            (MatchKind::Matched, Some(partner)) => vec![
                DelimiterHighlight {
                    position: brace.anchor,
                    kind: HighlightKind::BraceMatch,
                },
                DelimiterHighlight {
                    position: partner,
                    kind: HighlightKind::BraceMatch,
                },
            ],
            _ => vec![DelimiterHighlight {
                position: brace.anchor,
                kind: HighlightKind::BraceMismatch,
            }],
        }
    }

    /// Highlights that fall on `line`.
    pub fn highlights_on_line(&self, line: usize) -> Vec<DelimiterHighlight> {
        self.delimiter_highlights()
            .into_iter()
            .filter(|h| h.position.line == line)
            .collect()
    }
}
