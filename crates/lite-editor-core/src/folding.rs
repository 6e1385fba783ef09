//! Fold index: per-line brace depth and the fold regions derived from it.
//!
//! Each line stores the bracket depth at its start (`folding_indent`) and at its end
//! (`brace_depth_after`), so that `folding_indent(i + 1) == brace_depth_after(i)` holds for the
//! whole buffer. A line is a fold header when the next line starts deeper than it does; its
//! region runs until the first following line that is back at (or above) the header's depth.
//!
//! Regions are never stored. They are derived from the metadata on demand.

use crate::buffer::{Buffer, Line, rope_line_text};
use crate::delimiters::{depth_after, index_line};
use ropey::Rope;
use std::ops::Range;

/// A fold region derived from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRegion {
    /// Header line (stays visible when collapsed).
    pub start_line: usize,
    /// Last line of the region (inclusive).
    pub end_line: usize,
    /// Whether the region is currently collapsed.
    pub is_collapsed: bool,
}

impl FoldRegion {
    /// Number of lines hidden when the region is collapsed.
    pub fn inner_line_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Recompute metadata starting at `first`.
///
/// Lines up to `last_changed` are always recomputed; after that the scan stops at the first line
/// whose recomputed `folding_indent` and delimiters equal the stored ones. Returns the range of
/// recomputed lines.
pub(crate) fn reindex(
    rope: &Rope,
    lines: &mut [Line],
    first: usize,
    last_changed: usize,
) -> Range<usize> {
    if first >= lines.len() {
        return first..first;
    }

    let mut depth = match first.checked_sub(1) {
        Some(prev) => lines[prev].metadata.brace_depth_after,
        None => 0,
    };

    let mut line = first;
    while line < lines.len() {
        let delimiters = index_line(&rope_line_text(rope, line));
        let metadata = &mut lines[line].metadata;

        if line > last_changed
            && metadata.folding_indent == depth
            && metadata.delimiters == delimiters
        {
            break;
        }

        metadata.folding_indent = depth;
        metadata.brace_depth_after = depth_after(depth, &delimiters);
        metadata.delimiters = delimiters;
        depth = metadata.brace_depth_after;
        line += 1;
    }

    if line - first > 1 {
        tracing::debug!(first, end = line, "reindexed lines");
    }
    first..line
}

/// Returns `true` if `line` is a fold header (the next line starts at a greater depth).
pub fn can_fold(buffer: &Buffer, line: usize) -> bool {
    line + 1 < buffer.line_count() && buffer.folding_indent(line + 1) > buffer.folding_indent(line)
}

/// Exclusive end of the region headed by `header`.
///
/// This is the first line after `header` whose `folding_indent` is at most the header's, or the
/// line count when the region runs to the end of the buffer.
pub fn region_end(buffer: &Buffer, header: usize) -> usize {
    let indent = buffer.folding_indent(header);
    (header + 1..buffer.line_count())
        .find(|&line| buffer.folding_indent(line) <= indent)
        .unwrap_or(buffer.line_count())
}

/// Lines strictly inside the region headed by `header`, or `None` if it cannot fold.
pub fn region_lines(buffer: &Buffer, header: usize) -> Option<Range<usize>> {
    can_fold(buffer, header).then(|| header + 1..region_end(buffer, header))
}

/// Returns `true` if `header` can fold and carries the collapsed flag.
///
/// A nested header keeps its flag while an outer region hides it.
pub fn is_collapsed(buffer: &Buffer, header: usize) -> bool {
    can_fold(buffer, header) && buffer.line(header).is_some_and(|line| line.is_folded())
}

/// The nearest line above `line` with a smaller `folding_indent`, i.e. the header of the
/// innermost region containing `line`.
pub fn enclosing_header(buffer: &Buffer, line: usize) -> Option<usize> {
    let indent = buffer.folding_indent(line);
    (0..line.min(buffer.line_count()))
        .rev()
        .find(|&candidate| buffer.folding_indent(candidate) < indent)
}

/// All fold regions, ordered by header line.
pub fn regions(buffer: &Buffer) -> Vec<FoldRegion> {
    (0..buffer.line_count())
        .filter(|&line| can_fold(buffer, line))
        .map(|line| FoldRegion {
            start_line: line,
            end_line: region_end(buffer, line) - 1,
            is_collapsed: is_collapsed(buffer, line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "package main\n\nfunc main() {\n\tif ok {\n\t\tx()\n\t}\n}\n";

    #[test]
    fn test_folding_indent_tracks_depth() {
        let buffer = Buffer::new(SOURCE);
        let indents: Vec<usize> = (0..buffer.line_count())
            .map(|l| buffer.folding_indent(l))
            .collect();
        assert_eq!(indents, vec![0, 0, 0, 1, 2, 2, 1, 0]);
    }

    #[test]
    fn test_headers_and_region_ends() {
        let buffer = Buffer::new(SOURCE);
        assert!(!can_fold(&buffer, 0));
        assert!(can_fold(&buffer, 2));
        assert!(can_fold(&buffer, 3));
        assert!(!can_fold(&buffer, 4));
        assert!(!can_fold(&buffer, 7));

        assert_eq!(region_lines(&buffer, 2), Some(3..7));
        assert_eq!(region_lines(&buffer, 3), Some(4..6));
        assert_eq!(region_lines(&buffer, 4), None);
    }

    #[test]
    fn test_regions_listing() {
        let buffer = Buffer::new(SOURCE);
        let regions = regions(&buffer);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].start_line, 2);
        assert_eq!(regions[0].end_line, 6);
        assert_eq!(regions[1].inner_line_count(), 2);
        assert!(!regions[0].is_collapsed);
    }

    #[test]
    fn test_region_to_end_of_buffer() {
        let buffer = Buffer::new("func f() {\n\tx\n\ty");
        assert_eq!(region_lines(&buffer, 0), Some(1..3));
    }

    #[test]
    fn test_enclosing_header() {
        let buffer = Buffer::new(SOURCE);
        assert_eq!(enclosing_header(&buffer, 4), Some(3));
        assert_eq!(enclosing_header(&buffer, 6), Some(2));
        assert_eq!(enclosing_header(&buffer, 2), None);
    }

    #[test]
    fn test_edit_reaches_fixed_point() {
        let mut buffer = Buffer::new(SOURCE);
        // Removing the brace on the `if` line shifts every following indent.
        let offset = buffer.position_to_offset(crate::Position::new(3, 7));
        buffer.remove(offset, 1);
        let indents: Vec<usize> = (0..buffer.line_count())
            .map(|l| buffer.folding_indent(l))
            .collect();
        assert_eq!(indents, vec![0, 0, 0, 1, 1, 1, 0, 0]);

        let mut fresh = buffer.clone();
        fresh.rebuild_index();
        for line in 0..buffer.line_count() {
            assert!(
                buffer
                    .metadata(line)
                    .unwrap()
                    .same_structure(fresh.metadata(line).unwrap())
            );
        }
    }
}
