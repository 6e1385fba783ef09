//! Visibility controller: collapses and expands fold regions by flipping line visibility.
//!
//! A collapsed header carries the `folded` flag and every line strictly inside its region is
//! hidden. Expanding a region shows its lines again except for the inner lines of nested regions
//! that are still collapsed, so fold/unfold round-trips restore the previous layout.
//!
//! All operations return whether visibility changed; callers use that as the "layout changed"
//! signal for renderers.

use crate::buffer::Buffer;
use crate::commands::Position;
use crate::folding::{can_fold, is_collapsed, region_end};

/// Collapse (`collapse == true`) or expand the region headed by `header`.
///
/// No-op (returns `false`) when `header` cannot fold, is hidden, or is already in the requested
/// state.
pub fn set_collapsed(buffer: &mut Buffer, header: usize, collapse: bool) -> bool {
    if !can_fold(buffer, header)
        || !buffer.is_visible(header)
        || is_collapsed(buffer, header) == collapse
    {
        return false;
    }

    let end = region_end(buffer, header);
    buffer.lines[header].folded = collapse;

    if collapse {
        for line in &mut buffer.lines[header + 1..end] {
            line.visible = false;
        }
    } else {
        show_range(buffer, header + 1, end);
    }

    tracing::debug!(header, end, collapse, "fold state changed");
    true
}

fn show_range(buffer: &mut Buffer, start: usize, end: usize) {
    let mut line = start;
    while line < end {
        buffer.lines[line].visible = true;
        if buffer.lines[line].folded && can_fold(buffer, line) {
            line = region_end(buffer, line).max(line + 1);
        } else {
            line += 1;
        }
    }
}

/// Collapse `line`'s region if it is expanded, expand it otherwise.
pub fn toggle(buffer: &mut Buffer, line: usize) -> bool {
    let collapse = !is_collapsed(buffer, line);
    set_collapsed(buffer, line, collapse)
}

/// Expand enclosing regions until `line` is visible.
pub fn reveal_line(buffer: &mut Buffer, line: usize) -> bool {
    if line >= buffer.line_count() {
        return false;
    }

    let mut changed = false;
    while !buffer.is_visible(line) {
        let header = (0..line).rev().find(|&l| buffer.is_visible(l));
        let expanded = match header {
            Some(header) if region_end(buffer, header) > line => {
                set_collapsed(buffer, header, false)
            }
            _ => false,
        };
        if !expanded {
            // Stale visibility: nothing above claims the line.
            buffer.lines[line].visible = true;
        }
        changed = true;
    }
    changed
}

/// Collapse every foldable region.
pub fn collapse_all(buffer: &mut Buffer) -> bool {
    let mut changed = false;
    for line in 0..buffer.line_count() {
        if can_fold(buffer, line) && !buffer.lines[line].folded {
            buffer.lines[line].folded = true;
            changed = true;
        }
    }
    if changed {
        rebuild(buffer);
    }
    changed
}

/// Expand every region.
pub fn expand_all(buffer: &mut Buffer) -> bool {
    let mut changed = false;
    for line in &mut buffer.lines {
        changed |= line.folded || !line.visible;
        line.folded = false;
        line.visible = true;
    }
    changed
}

/// Recompute visibility from the `folded` flags.
///
/// Flags on lines that are no longer fold headers are dropped. Used after edits, which may create
/// or destroy regions.
pub fn rebuild(buffer: &mut Buffer) -> bool {
    let count = buffer.line_count();
    let before: Vec<bool> = buffer.lines.iter().map(|l| l.visible).collect();

    for line in 0..count {
        if buffer.lines[line].folded && !can_fold(buffer, line) {
            buffer.lines[line].folded = false;
        }
        buffer.lines[line].visible = true;
    }

    let mut line = 0;
    while line < count {
        if buffer.lines[line].folded {
            let end = region_end(buffer, line);
            for hidden in &mut buffer.lines[line + 1..end] {
                hidden.visible = false;
            }
            line = end;
        } else {
            line += 1;
        }
    }

    buffer
        .lines
        .iter()
        .zip(before)
        .any(|(line, was)| line.visible != was)
}

/// The nearest visible line at or above `line` (line 0 is always visible).
pub fn visible_at_or_above(buffer: &Buffer, line: usize) -> usize {
    let line = line.min(buffer.line_count().saturating_sub(1));
    (0..=line)
        .rev()
        .find(|&l| buffer.is_visible(l))
        .unwrap_or(0)
}

/// Move `cursor` to the nearest visible line above it if its line is hidden.
pub fn clamp_cursor(buffer: &Buffer, cursor: Position) -> Position {
    if buffer.is_visible(cursor.line) {
        return cursor;
    }
    let line = visible_at_or_above(buffer, cursor.line);
    Position::new(line, cursor.column.min(buffer.line_len(line)))
}

/// Fold the cursor's region.
///
/// When the cursor line cannot fold or is already collapsed, the closest preceding visible line
/// with a smaller folding indent is folded instead. Returns the (possibly relocated) cursor, or
/// `None` when nothing was folded.
pub fn fold_at_cursor(buffer: &mut Buffer, cursor: Position) -> Option<Position> {
    let mut header = cursor.line;
    if !can_fold(buffer, header) || is_collapsed(buffer, header) {
        let indent = buffer.folding_indent(header);
        header = (0..header)
            .rev()
            .find(|&l| buffer.is_visible(l) && buffer.folding_indent(l) < indent)?;
    }

    if !set_collapsed(buffer, header, true) {
        return None;
    }
    Some(clamp_cursor(buffer, cursor))
}

/// Expand the region headed by the cursor line (or the nearest visible line above it).
pub fn unfold_at_cursor(buffer: &mut Buffer, cursor: Position) -> bool {
    let header = visible_at_or_above(buffer, cursor.line);
    set_collapsed(buffer, header, false)
}

/// Number of visible lines.
pub fn visible_line_count(buffer: &Buffer) -> usize {
    buffer.lines().filter(|l| l.is_visible()).count()
}

/// Visual row of a visible line (hidden lines have no row).
pub fn visual_row_of(buffer: &Buffer, line: usize) -> Option<usize> {
    if !buffer.is_visible(line) {
        return None;
    }
    Some(buffer.lines().take(line).filter(|l| l.is_visible()).count())
}

/// Logical line shown at visual `row`.
pub fn line_at_visual_row(buffer: &Buffer, row: usize) -> Option<usize> {
    buffer
        .lines()
        .enumerate()
        .filter(|(_, l)| l.is_visible())
        .nth(row)
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NESTED: &str = "func main() {\n\tif ok {\n\t\tx()\n\t}\n\ty()\n}\nz";

    fn visibility(buffer: &Buffer) -> Vec<bool> {
        buffer.lines().map(|l| l.is_visible()).collect()
    }

    #[test]
    fn test_collapse_hides_inner_lines_only() {
        let mut buffer = Buffer::new(NESTED);
        assert!(set_collapsed(&mut buffer, 0, true));
        assert_eq!(
            visibility(&buffer),
            vec![true, false, false, false, false, false, true]
        );
        assert!(is_collapsed(&buffer, 0));
        assert!(!set_collapsed(&mut buffer, 0, true));
    }

    #[test]
    fn test_nested_collapse_survives_outer_round_trip() {
        let mut buffer = Buffer::new(NESTED);
        set_collapsed(&mut buffer, 1, true);
        let inner_folded = visibility(&buffer);

        set_collapsed(&mut buffer, 0, true);
        set_collapsed(&mut buffer, 0, false);
        assert_eq!(visibility(&buffer), inner_folded);
        assert!(is_collapsed(&buffer, 1));
    }

    #[test]
    fn test_toggle_and_non_foldable_noop() {
        let mut buffer = Buffer::new(NESTED);
        assert!(!toggle(&mut buffer, 2));
        assert!(toggle(&mut buffer, 1));
        assert!(!buffer.is_visible(2));
        assert!(toggle(&mut buffer, 1));
        assert!(buffer.is_visible(2));
        assert!(!toggle(&mut buffer, 99));
    }

    #[test]
    fn test_reveal_line_expands_outer_then_inner() {
        let mut buffer = Buffer::new(NESTED);
        set_collapsed(&mut buffer, 1, true);
        set_collapsed(&mut buffer, 0, true);
        assert!(reveal_line(&mut buffer, 2));
        assert!(visibility(&buffer).iter().all(|&v| v));
    }

    #[test]
    fn test_fold_at_cursor_walks_up_and_relocates_cursor() {
        let mut buffer = Buffer::new(NESTED);
        // Line 2 cannot fold, so the `if` header is folded instead.
        let cursor = fold_at_cursor(&mut buffer, Position::new(2, 5)).unwrap();
        assert_eq!(cursor, Position::new(1, 5));
        assert!(is_collapsed(&buffer, 1));

        // Folding again from the collapsed header folds the function.
        let cursor = fold_at_cursor(&mut buffer, cursor).unwrap();
        assert_eq!(cursor, Position::new(0, 5));
        assert!(is_collapsed(&buffer, 0));

        assert_eq!(fold_at_cursor(&mut buffer, Position::new(0, 0)), None);
    }

    #[test]
    fn test_rebuild_drops_stale_flags() {
        let mut buffer = Buffer::new(NESTED);
        set_collapsed(&mut buffer, 1, true);
        // Remove the `{` that makes line 1 a header.
        let offset = buffer.position_to_offset(Position::new(1, 7));
        buffer.remove(offset, 1);
        rebuild(&mut buffer);
        assert!(!buffer.line(1).unwrap().is_folded());
        assert!(buffer.is_visible(2));
    }

    #[test]
    fn test_visual_rows_skip_hidden_lines() {
        let mut buffer = Buffer::new(NESTED);
        set_collapsed(&mut buffer, 1, true);
        assert_eq!(visible_line_count(&buffer), 5);
        assert_eq!(visual_row_of(&buffer, 4), Some(2));
        assert_eq!(visual_row_of(&buffer, 2), None);
        assert_eq!(line_at_visual_row(&buffer, 2), Some(4));
        assert_eq!(line_at_visual_row(&buffer, 9), None);
    }

    #[test]
    fn test_collapse_all_and_expand_all() {
        let mut buffer = Buffer::new(NESTED);
        assert!(collapse_all(&mut buffer));
        assert_eq!(visible_line_count(&buffer), 2);
        assert!(expand_all(&mut buffer));
        assert_eq!(visible_line_count(&buffer), 7);
        assert!(!expand_all(&mut buffer));
    }
}
