//! Line buffer: rope-backed text plus a per-line side table.
//!
//! The text lives in a [`ropey::Rope`] (line breaks are `'\n'` only; `"\r\n"` is normalized on
//! the way in). Next to it, every line owns a [`Line`] record: its revision stamp, visibility,
//! fold-header flag and the structural [`LineMetadata`] maintained by [`crate::folding`].
//!
//! Each mutation returns a [`TextChange`] whose [`EditNotification`] names the touched lines.

use crate::commands::Position;
use crate::delimiters::Delimiter;
use crate::delta::{EditNotification, TextChange};
use crate::folding;
use crate::marks::{self, MarkHandle, TextMark};
use ropey::Rope;
use std::sync::{Arc, Weak};

/// Structural metadata of one line.
#[derive(Debug, Clone, Default)]
pub struct LineMetadata {
    /// Delimiters on the line, in column order.
    pub delimiters: Vec<Delimiter>,
    /// Bracket depth at the start of the line.
    pub folding_indent: usize,
    /// Bracket depth at the end of the line.
    pub brace_depth_after: usize,
    /// External annotations; weak so the owner controls their lifetime.
    pub marks: Vec<MarkHandle>,
}

impl LineMetadata {
    /// Returns `true` if the structural fields (everything except marks) are equal.
    pub fn same_structure(&self, other: &LineMetadata) -> bool {
        self.folding_indent == other.folding_indent
            && self.brace_depth_after == other.brace_depth_after
            && self.delimiters == other.delimiters
    }
}

impl PartialEq for LineMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.same_structure(other)
            && self.marks.len() == other.marks.len()
            && self
                .marks
                .iter()
                .zip(&other.marks)
                .all(|(a, b)| Weak::ptr_eq(a, b))
    }
}

/// Per-line record kept alongside the rope.
#[derive(Debug, Clone)]
pub struct Line {
    pub(crate) revision: i64,
    pub(crate) visible: bool,
    pub(crate) folded: bool,
    pub(crate) metadata: LineMetadata,
}

impl Line {
    fn new(revision: i64) -> Self {
        Self {
            revision,
            visible: true,
            folded: false,
            metadata: LineMetadata::default(),
        }
    }

    /// Revision stamp of the last edit that touched this line.
    ///
    /// Negative values mark lines that were modified before the last save.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Returns `true` unless the line is inside a collapsed fold region.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns `true` if this line is the header of a collapsed region.
    pub fn is_folded(&self) -> bool {
        self.folded
    }

    /// Structural metadata.
    pub fn metadata(&self) -> &LineMetadata {
        &self.metadata
    }
}

/// Text buffer with structural side table.
#[derive(Debug, Clone)]
pub struct Buffer {
    rope: Rope,
    pub(crate) lines: Vec<Line>,
    revision: i64,
    last_save_revision: i64,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl Buffer {
    /// Create a buffer from `text` and index every line.
    pub fn new(text: &str) -> Self {
        let rope = Rope::from_str(&normalize_line_endings(text));
        let line_count = rope.len_lines();
        let mut buffer = Self {
            rope,
            lines: (0..line_count).map(|_| Line::new(0)).collect(),
            revision: 0,
            last_save_revision: 0,
        };
        buffer.rebuild_index();
        buffer
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Number of lines (a trailing `'\n'` starts an empty last line).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of characters.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Text of `line` without its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        (line < self.lines.len()).then(|| rope_line_text(&self.rope, line))
    }

    /// Length of `line` in characters, excluding the line break.
    pub fn line_len(&self, line: usize) -> usize {
        if line >= self.lines.len() {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }

    /// Side-table record of `line`.
    pub fn line(&self, line: usize) -> Option<&Line> {
        self.lines.get(line)
    }

    /// Iterate over all side-table records.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    /// Structural metadata of `line`.
    pub fn metadata(&self, line: usize) -> Option<&LineMetadata> {
        self.lines.get(line).map(|l| &l.metadata)
    }

    /// Bracket depth at the start of `line` (0 when out of range).
    pub fn folding_indent(&self, line: usize) -> usize {
        self.lines
            .get(line)
            .map(|l| l.metadata.folding_indent)
            .unwrap_or(0)
    }

    /// Returns `true` if `line` exists and is visible.
    pub fn is_visible(&self, line: usize) -> bool {
        self.lines.get(line).is_some_and(|l| l.visible)
    }

    /// Character at `position`, if any (the line break is not reported).
    pub fn char_at(&self, position: Position) -> Option<char> {
        if position.column >= self.line_len(position.line) {
            return None;
        }
        Some(self.rope.line(position.line).char(position.column))
    }

    /// Clamp `position` into the buffer.
    pub fn clamp_position(&self, position: Position) -> Position {
        let line = position.line.min(self.lines.len().saturating_sub(1));
        Position::new(line, position.column.min(self.line_len(line)))
    }

    /// Character offset of `position` (clamped).
    pub fn position_to_offset(&self, position: Position) -> usize {
        let position = self.clamp_position(position);
        self.rope.line_to_char(position.line) + position.column
    }

    /// Position of a character offset (clamped to the end of the buffer).
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        Position::new(line, offset - self.rope.line_to_char(line))
    }

    /// Document revision, bumped by every mutation.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    /// Document revision at the last [`Buffer::mark_saved`].
    pub fn last_save_revision(&self) -> i64 {
        self.last_save_revision
    }

    /// Returns `true` if the buffer changed since the last save.
    pub fn is_modified(&self) -> bool {
        self.revision != self.last_save_revision
    }

    /// Replace `len` characters at `start` with `text`.
    ///
    /// The range is clamped to the buffer. The touched lines get the new revision and the
    /// structural index is brought up to date before returning.
    pub fn replace(&mut self, start: usize, len: usize, text: &str) -> TextChange {
        let total = self.rope.len_chars();
        let start = start.min(total);
        let end = start.saturating_add(len).min(total);
        let text = normalize_line_endings(text);

        let start_line = self.rope.char_to_line(start);
        let old_end_line = self.rope.char_to_line(end);
        // When the first line loses all of its text, the merged line is the tail of the last
        // removed line and carries that line's fold state.
        let head_consumed = start == self.rope.line_to_char(start_line);

        if end > start {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, &text);
        }
        let inserted_len = text.chars().count();
        let new_end_line = self.rope.char_to_line(start + inserted_len);

        self.revision += 1;

        let mut removed = self.lines.drain(start_line..=old_end_line);
        let mut head = removed.next().unwrap_or_else(|| Line::new(0));
        for line in removed {
            if head_consumed {
                head.folded = line.folded;
                head.visible = line.visible;
            }
            head.metadata.marks.extend(line.metadata.marks);
        }
        head.metadata.marks.retain(|m| m.strong_count() > 0);
        head.revision = self.revision;

        let visible = head.visible;
        let revision = self.revision;
        let added = (start_line..new_end_line).map(|_| Line {
            visible,
            ..Line::new(revision)
        });
        let replacement: Vec<Line> = std::iter::once(head).chain(added).collect();
        self.lines.splice(start_line..start_line, replacement);

        let notification = EditNotification::new(
            start_line,
            old_end_line - start_line,
            new_end_line - start_line,
        );
        let reindexed = folding::reindex(&self.rope, &mut self.lines, start_line, new_end_line);
        tracing::trace!(
            start_line,
            lines_removed = notification.lines_removed,
            lines_added = notification.lines_added,
            reindexed_from = reindexed.start,
            reindexed_to = reindexed.end,
            "buffer edit"
        );

        TextChange {
            start,
            removed_len: end - start,
            inserted_text: text,
            notification,
        }
    }

    /// Insert `text` at `offset`.
    pub fn insert(&mut self, offset: usize, text: &str) -> TextChange {
        self.replace(offset, 0, text)
    }

    /// Remove `len` characters at `start`.
    pub fn remove(&mut self, start: usize, len: usize) -> TextChange {
        self.replace(start, len, "")
    }

    /// Recompute the structural metadata of every line from scratch.
    pub fn rebuild_index(&mut self) {
        let last = self.lines.len().saturating_sub(1);
        for line in &mut self.lines {
            line.metadata.delimiters.clear();
            line.metadata.folding_indent = 0;
            line.metadata.brace_depth_after = 0;
        }
        folding::reindex(&self.rope, &mut self.lines, 0, last);
    }

    /// Snapshot the save point.
    ///
    /// Lines edited since the previous save keep a negative revision (rendered as
    /// "saved-modified"); all other lines become clean.
    pub fn mark_saved(&mut self) {
        let old_last_save = self.last_save_revision;
        self.last_save_revision = self.revision;
        if old_last_save == self.last_save_revision {
            return;
        }
        let saved = self.last_save_revision;
        for line in &mut self.lines {
            line.revision = if line.revision < 0 || line.revision != old_last_save {
                -saved - 1
            } else {
                saved
            };
        }
    }

    /// Attach a weak reference to `mark` to `line`. Returns `false` if `line` is out of range.
    pub fn attach_mark(&mut self, line: usize, mark: &Arc<dyn TextMark>) -> bool {
        let Some(target) = self.lines.get_mut(line) else {
            return false;
        };
        if target
            .metadata
            .marks
            .iter()
            .any(|handle| marks::refers_to(handle, mark))
        {
            return true;
        }
        target.metadata.marks.push(Arc::downgrade(mark));
        true
    }

    /// Remove every reference to `mark`. Returns the lines it was removed from.
    pub fn detach_mark(&mut self, mark: &Arc<dyn TextMark>) -> Vec<usize> {
        let mut touched = Vec::new();
        for (index, line) in self.lines.iter_mut().enumerate() {
            let before = line.metadata.marks.len();
            line.metadata
                .marks
                .retain(|handle| !marks::refers_to(handle, mark));
            if line.metadata.marks.len() != before {
                touched.push(index);
            }
        }
        touched
    }

    /// Lines that currently carry `mark`.
    pub fn lines_with_mark(&self, mark: &Arc<dyn TextMark>) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                line.metadata
                    .marks
                    .iter()
                    .any(|handle| marks::refers_to(handle, mark))
            })
            .map(|(index, _)| index)
            .collect()
    }
}

pub(crate) fn rope_line_text(rope: &Rope, line: usize) -> String {
    let mut text = rope.line(line).to_string();
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

fn normalize_line_endings(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{MarkKind, SimpleMark};

    #[test]
    fn test_line_count_and_text() {
        let buffer = Buffer::new("a\nbc\n");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line_text(1).as_deref(), Some("bc"));
        assert_eq!(buffer.line_text(2).as_deref(), Some(""));
        assert_eq!(buffer.line_text(3), None);
        assert_eq!(buffer.line_len(1), 2);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let buffer = Buffer::new("a\r\nb");
        assert_eq!(buffer.text(), "a\nb");
        assert_eq!(buffer.line_count(), 2);
    }

    #[test]
    fn test_lone_cr_is_normalized() {
        let mut buffer = Buffer::new("a\rb");
        assert_eq!(buffer.text(), "a\nb");
        assert_eq!(buffer.line_count(), 2);

        let change = buffer.insert(1, "x\ry\r\nz");
        assert_eq!(change.inserted_text, "x\ny\nz");
        assert_eq!(buffer.text(), "ax\ny\nz\nb");
        assert_eq!(buffer.line_count(), 4);
    }

    #[test]
    fn test_merged_line_takes_fold_state_of_surviving_text() {
        let mut buffer = Buffer::new("a\nb\nc");
        buffer.lines[0].folded = true;

        // Deleting from column 0 leaves only the text of line 1.
        buffer.remove(0, 2);
        assert_eq!(buffer.text(), "b\nc");
        assert!(!buffer.line(0).unwrap().is_folded());

        buffer.lines[0].folded = true;
        // Joining at the end of line 0 keeps its own state.
        buffer.remove(1, 1);
        assert_eq!(buffer.text(), "bc");
        assert!(buffer.line(0).unwrap().is_folded());
    }

    #[test]
    fn test_offsets_and_positions() {
        let buffer = Buffer::new("ab\ncde");
        assert_eq!(buffer.position_to_offset(Position::new(1, 2)), 5);
        assert_eq!(buffer.offset_to_position(5), Position::new(1, 2));
        assert_eq!(buffer.position_to_offset(Position::new(0, 99)), 2);
        assert_eq!(buffer.char_at(Position::new(1, 0)), Some('c'));
        assert_eq!(buffer.char_at(Position::new(0, 2)), None);
    }

    #[test]
    fn test_notification_counts_line_breaks() {
        let mut buffer = Buffer::new("one\ntwo\nthree");
        let change = buffer.insert(3, "\nx\ny");
        assert_eq!(change.notification, EditNotification::new(0, 0, 2));

        let start = buffer.position_to_offset(Position::new(1, 0));
        let end = buffer.position_to_offset(Position::new(3, 0));
        let change = buffer.remove(start, end - start);
        assert_eq!(change.notification, EditNotification::new(1, 2, 0));
        assert_eq!(buffer.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_revisions_follow_edits_and_saves() {
        let mut buffer = Buffer::new("a\nb\nc");
        assert!(!buffer.is_modified());

        buffer.insert(2, "x");
        assert!(buffer.is_modified());
        assert_eq!(buffer.line(1).unwrap().revision(), 1);
        assert_eq!(buffer.line(0).unwrap().revision(), 0);

        buffer.mark_saved();
        assert!(!buffer.is_modified());
        assert_eq!(buffer.line(1).unwrap().revision(), -2);
        assert_eq!(buffer.line(0).unwrap().revision(), 1);
    }

    #[test]
    fn test_marks_survive_edits_and_merge_on_join() {
        let mut buffer = Buffer::new("a\nb\nc");
        let mark = SimpleMark::new(MarkKind::Breakpoint);
        assert!(buffer.attach_mark(1, &mark));
        assert!(!buffer.attach_mark(9, &mark));

        buffer.insert(0, "x");
        assert_eq!(buffer.lines_with_mark(&mark), vec![1]);

        // Join lines 0 and 1: the mark follows the surviving line.
        buffer.remove(2, 1);
        assert_eq!(buffer.lines_with_mark(&mark), vec![0]);

        assert_eq!(buffer.detach_mark(&mark), vec![0]);
        assert!(buffer.lines_with_mark(&mark).is_empty());
    }

    #[test]
    fn test_metadata_equality_ignores_dropped_marks_only_by_identity() {
        let a = LineMetadata::default();
        let mut b = LineMetadata::default();
        assert_eq!(a, b);
        let mark = SimpleMark::new(MarkKind::Bookmark);
        b.marks.push(Arc::downgrade(&mark));
        assert_ne!(a, b);
        assert!(a.same_structure(&b));
    }
}
