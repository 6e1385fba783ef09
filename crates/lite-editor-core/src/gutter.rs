//! Gutter model: line numbers, modification bars, fold boxes and marks.
//!
//! [`paint`] is a read-only pass over the visible lines of a viewport that produces one
//! [`GutterLine`] per row. Renderers turn it into pixels or terminal cells; the geometry helpers
//! ([`line_number_digits`], [`extra_gutter_width`]) use a [`GutterMetrics`] so the same formula
//! serves both.

use crate::buffer::{Buffer, Line};
use crate::folding::{can_fold, is_collapsed};
use crate::marks::{MarkInfo, live_marks};
use lite_editor_lang::GutterConfig;
use std::ops::RangeInclusive;

/// Font-dependent sizes used to compute the gutter width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterMetrics {
    /// Width of the digit `9` in the (bold) line-number font.
    pub digit_width: usize,
    /// Line spacing of the gutter font; the mark column is this wide.
    pub line_spacing: usize,
    /// Padding added after the mark column (or in its place when marks are hidden) and at the end.
    pub padding: usize,
}

impl GutterMetrics {
    /// Metrics for a character-cell terminal.
    pub fn terminal() -> Self {
        Self {
            digit_width: 1,
            line_spacing: 1,
            padding: 0,
        }
    }
}

impl Default for GutterMetrics {
    fn default() -> Self {
        Self {
            digit_width: 8,
            line_spacing: 16,
            padding: 2,
        }
    }
}

/// Digits reserved for line numbers: at least 2, growing with the line count.
pub fn line_number_digits(line_count: usize) -> usize {
    let mut digits = 2;
    let mut max = line_count.max(1);
    while max >= 100 {
        max /= 10;
        digits += 1;
    }
    digits
}

/// Width of the fold box column.
pub fn fold_box_width(line_spacing: usize) -> usize {
    line_spacing / 2 + line_spacing % 2 + 1
}

/// Total gutter width for a buffer of `line_count` lines.
pub fn extra_gutter_width(
    config: &GutterConfig,
    metrics: &GutterMetrics,
    line_count: usize,
) -> usize {
    let mut space = 0;
    if config.line_numbers {
        space += metrics.digit_width * line_number_digits(line_count);
    }
    space += if config.marks {
        metrics.line_spacing
    } else {
        metrics.padding
    };
    if config.folding {
        space += fold_box_width(metrics.line_spacing);
    }
    space + metrics.padding
}

/// Modification bar state of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModificationState {
    /// Unchanged since the last save.
    Clean,
    /// Changed, and that change has been saved (drawn green).
    SavedModified,
    /// Changed since the last save (drawn red).
    Modified,
}

/// Modification state of `line` relative to the buffer's save point.
pub fn modification_state(line: &Line, last_save_revision: i64) -> ModificationState {
    let revision = line.revision();
    if revision == last_save_revision {
        ModificationState::Clean
    } else if revision < 0 {
        ModificationState::SavedModified
    } else {
        ModificationState::Modified
    }
}

/// Fold box drawn next to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoldMarker {
    /// Not a fold header.
    None,
    /// Header of an expanded region (`-`).
    Expanded,
    /// Header of a collapsed region (`+`).
    Collapsed,
}

/// One painted gutter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterLine {
    /// Logical line index.
    pub line: usize,
    /// Right-aligned 1-based line number, when line numbers are shown.
    pub number: Option<String>,
    /// Modification bar.
    pub modification: ModificationState,
    /// Fold box.
    pub fold_marker: FoldMarker,
    /// Live marks, lowest priority first.
    pub marks: Vec<MarkInfo>,
    /// Line holds the cursor or part of the selection (numbers are drawn bold).
    pub is_current: bool,
}

/// Gutter rows for a viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterSnapshot {
    /// Total width as computed by [`extra_gutter_width`].
    pub width: usize,
    /// Digits reserved for line numbers.
    pub digits: usize,
    /// One entry per visible row.
    pub lines: Vec<GutterLine>,
}

/// Build the gutter for `rows` visual rows starting at visual row `first_row`.
pub fn paint(
    buffer: &Buffer,
    config: &GutterConfig,
    metrics: &GutterMetrics,
    current: RangeInclusive<usize>,
    first_row: usize,
    rows: usize,
) -> GutterSnapshot {
    let digits = line_number_digits(buffer.line_count());
    let last_save = buffer.last_save_revision();

    let lines = buffer
        .lines()
        .enumerate()
        .filter(|(_, line)| line.is_visible())
        .skip(first_row)
        .take(rows)
        .map(|(index, line)| GutterLine {
            line: index,
            number: config
                .line_numbers
                .then(|| format!("{:>width$}", index + 1, width = digits)),
            modification: modification_state(line, last_save),
            fold_marker: fold_marker(buffer, config, index),
            marks: if config.marks {
                live_marks(&line.metadata().marks)
            } else {
                Vec::new()
            },
            is_current: current.contains(&index),
        })
        .collect();

    GutterSnapshot {
        width: extra_gutter_width(config, metrics, buffer.line_count()),
        digits,
        lines,
    }
}

fn fold_marker(buffer: &Buffer, config: &GutterConfig, line: usize) -> FoldMarker {
    if !config.folding || !can_fold(buffer, line) {
        FoldMarker::None
    } else if is_collapsed(buffer, line) {
        FoldMarker::Collapsed
    } else {
        FoldMarker::Expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{MarkKind, SimpleMark};
    use crate::visibility;

    #[test]
    fn test_digits_grow_with_line_count() {
        assert_eq!(line_number_digits(0), 2);
        assert_eq!(line_number_digits(99), 2);
        assert_eq!(line_number_digits(150), 3);
        assert_eq!(line_number_digits(999), 3);
        assert_eq!(line_number_digits(1000), 4);
    }

    #[test]
    fn test_width_formula() {
        let config = GutterConfig::default();
        let metrics = GutterMetrics::default();
        // 8*2 + 16 + (8 + 0 + 1) + 2
        assert_eq!(extra_gutter_width(&config, &metrics, 10), 43);

        let bare = GutterConfig {
            line_numbers: false,
            marks: false,
            folding: false,
        };
        assert_eq!(extra_gutter_width(&bare, &metrics, 10), 4);
        assert_eq!(fold_box_width(15), 9);
        assert_eq!(
            extra_gutter_width(&config, &GutterMetrics::terminal(), 150),
            3 + 1 + 2
        );
    }

    #[test]
    fn test_paint_skips_hidden_lines_and_marks_folds() {
        let mut buffer = Buffer::new("func f() {\n\tx\n}\ny");
        visibility::set_collapsed(&mut buffer, 0, true);
        let snapshot = paint(
            &buffer,
            &GutterConfig::default(),
            &GutterMetrics::terminal(),
            3..=3,
            0,
            10,
        );
        let lines: Vec<usize> = snapshot.lines.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![0, 3]);
        assert_eq!(snapshot.lines[0].fold_marker, FoldMarker::Collapsed);
        assert_eq!(snapshot.lines[0].number.as_deref(), Some(" 1"));
        assert!(snapshot.lines[1].is_current);
        assert_eq!(snapshot.lines[1].fold_marker, FoldMarker::None);
    }

    #[test]
    fn test_modification_states_after_edit_and_save() {
        let mut buffer = Buffer::new("a\nb\nc");
        buffer.insert(0, "x");
        let paint_states = |buffer: &Buffer| -> Vec<ModificationState> {
            paint(
                buffer,
                &GutterConfig::default(),
                &GutterMetrics::terminal(),
                0..=0,
                0,
                3,
            )
            .lines
            .iter()
            .map(|l| l.modification)
            .collect()
        };
        assert_eq!(
            paint_states(&buffer),
            vec![
                ModificationState::Modified,
                ModificationState::Clean,
                ModificationState::Clean
            ]
        );

        buffer.mark_saved();
        buffer.insert(buffer.position_to_offset(crate::Position::new(2, 0)), "y");
        assert_eq!(
            paint_states(&buffer),
            vec![
                ModificationState::SavedModified,
                ModificationState::Clean,
                ModificationState::Modified
            ]
        );
    }

    #[test]
    fn test_marks_are_snapshotted_at_paint_time() {
        let mut buffer = Buffer::new("a\nb");
        let mark = SimpleMark::new(MarkKind::Breakpoint);
        buffer.attach_mark(1, &mark);
        let config = GutterConfig::default();
        let metrics = GutterMetrics::terminal();

        let snapshot = paint(&buffer, &config, &metrics, 0..=0, 0, 2);
        assert_eq!(snapshot.lines[1].marks[0].kind, MarkKind::Breakpoint);

        drop(mark);
        let snapshot = paint(&buffer, &config, &metrics, 0..=0, 0, 2);
        assert!(snapshot.lines[1].marks.is_empty());
    }
}
