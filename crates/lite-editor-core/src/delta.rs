//! Edit notifications.
//!
//! Every mutation of the buffer reports which lines it touched as an [`EditNotification`]
//! `(start_line, lines_removed, lines_added)`, the same triple a text widget's
//! `contentsChange` signal carries. Incremental consumers (the structural index, gutter caches,
//! state subscribers) use it to limit their work to the affected lines.

use std::ops::Range;

/// Line range touched by a single buffer mutation.
///
/// Semantics:
/// - Lines `start_line ..= start_line + lines_removed` of the document before the edit were
///   replaced by lines `start_line ..= start_line + lines_added` of the document after it.
/// - `start_line` itself always counts as changed, so a single-line edit is `(line, 0, 0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditNotification {
    /// First changed line.
    pub start_line: usize,
    /// Number of line breaks removed by the edit.
    pub lines_removed: usize,
    /// Number of line breaks inserted by the edit.
    pub lines_added: usize,
}

impl EditNotification {
    /// Create a notification.
    pub fn new(start_line: usize, lines_removed: usize, lines_added: usize) -> Self {
        Self {
            start_line,
            lines_removed,
            lines_added,
        }
    }

    /// Changed lines in post-edit coordinates.
    pub fn changed_lines(&self) -> Range<usize> {
        self.start_line..self.start_line + self.lines_added + 1
    }

    /// Net change in line count.
    pub fn line_delta(&self) -> isize {
        self.lines_added as isize - self.lines_removed as isize
    }

    /// Combine `self` with a notification `next` produced by a later edit.
    ///
    /// The result covers both edits, expressed against the document before `self` and the
    /// document after `next`.
    pub fn merge(&self, next: &EditNotification) -> EditNotification {
        let start = self.start_line.min(next.start_line);
        let first_end_after = self.start_line + self.lines_added;
        let end_between = first_end_after.max(next.start_line + next.lines_removed);
        let end_before = end_between - self.lines_added + self.lines_removed;
        let end_after = end_between - next.lines_removed + next.lines_added;

        EditNotification {
            start_line: start,
            lines_removed: end_before - start,
            lines_added: end_after - start,
        }
    }
}

/// A single text change in character offsets together with its line notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// Start character offset (pre-edit document).
    pub start: usize,
    /// Number of characters removed.
    pub removed_len: usize,
    /// Inserted text.
    pub inserted_text: String,
    /// Affected lines.
    pub notification: EditNotification,
}

impl TextChange {
    /// Length of `inserted_text` in characters.
    pub fn inserted_len(&self) -> usize {
        self.inserted_text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_lines_single_line() {
        let n = EditNotification::new(4, 0, 0);
        assert_eq!(n.changed_lines(), 4..5);
        assert_eq!(n.line_delta(), 0);
    }

    #[test]
    fn test_merge_disjoint_edits() {
        // Insert two lines after line 1, then edit line 10 (post-edit coordinates).
        let a = EditNotification::new(1, 0, 2);
        let b = EditNotification::new(10, 0, 0);
        let merged = a.merge(&b);
        assert_eq!(merged.start_line, 1);
        assert_eq!(merged.lines_removed, 7);
        assert_eq!(merged.lines_added, 9);
        assert_eq!(merged.line_delta(), 2);
    }

    #[test]
    fn test_merge_overlapping_edits() {
        let a = EditNotification::new(3, 1, 0);
        let b = EditNotification::new(2, 0, 1);
        let merged = a.merge(&b);
        assert_eq!(merged, EditNotification::new(2, 2, 2));
    }
}
