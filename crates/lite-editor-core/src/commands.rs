//! Command Interface Layer
//!
//! Provides a unified command interface for the editor: text edits, cursor navigation, fold
//! control, key handling and view settings all go through [`CommandExecutor::execute`].
//!
//! After every command the executor brings derived state back in line: hidden lines never hold
//! the cursor, the viewport follows the cursor, and the [`HighlightState`] is refreshed.

use crate::auto_edit::{self, KeyContext, KeyInput, KeyPlan};
use crate::brace_match;
use crate::buffer::{Buffer, LineMetadata};
use crate::delta::EditNotification;
use crate::folding::{self, FoldRegion};
use crate::gutter::{self, GutterMetrics, GutterSnapshot};
use crate::highlight::HighlightState;
use crate::history::{HistoryEntry, NavigationHistory};
use crate::layout;
use crate::marks::TextMark;
use crate::visibility;
use lite_editor_lang::{EditorSettings, IndentStyle};
use std::cmp::Ordering;
use std::ops::{Range, RangeInclusive};
use std::sync::Arc;
use thiserror::Error;

/// Position coordinates (line and column numbers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based logical line index.
    pub line: usize,
    /// Zero-based column in characters within the logical line.
    pub column: usize,
}

impl Position {
    /// Create a new logical position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.column.cmp(&other.column))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Selection range (`start <= end`; `direction` tells which end is active).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Selection start position
    pub start: Position,
    /// Selection end position
    pub end: Position,
    /// Selection direction
    pub direction: SelectionDirection,
}

/// Selection direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    /// Forward selection (from start to end)
    Forward,
    /// Backward selection (from end to start)
    Backward,
}

impl Selection {
    /// Selection from `anchor` to `active`, in either order.
    pub fn new(anchor: Position, active: Position) -> Self {
        if anchor <= active {
            Self {
                start: anchor,
                end: active,
                direction: SelectionDirection::Forward,
            }
        } else {
            Self {
                start: active,
                end: anchor,
                direction: SelectionDirection::Backward,
            }
        }
    }

    /// The fixed end.
    pub fn anchor(&self) -> Position {
        match self.direction {
            SelectionDirection::Forward => self.start,
            SelectionDirection::Backward => self.end,
        }
    }

    /// The moving end (where the cursor is).
    pub fn active(&self) -> Position {
        match self.direction {
            SelectionDirection::Forward => self.end,
            SelectionDirection::Backward => self.start,
        }
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Lines touched by the selection.
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.start.line..=self.end.line
    }
}

/// Text editing commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Insert text at the specified position
    Insert {
        /// Character offset to insert at.
        offset: usize,
        /// Text to insert.
        text: String,
    },
    /// Delete text in specified range
    Delete {
        /// Character offset of the deletion start.
        start: usize,
        /// Length of the deletion in characters.
        length: usize,
    },
    /// Replace text in specified range
    Replace {
        /// Character offset of the replacement start.
        start: usize,
        /// Length of the replaced range in characters.
        length: usize,
        /// Replacement text.
        text: String,
    },
    /// Typing/paste: replace the selection (or insert at the cursor) without auto-pairing.
    InsertText {
        /// Text to insert.
        text: String,
    },
    /// Delete the selection, or the character before the cursor.
    Backspace,
    /// Delete the selection, or the character after the cursor.
    DeleteForward,
    /// Delete the selection, or the cursor line including its line break.
    DeleteLine,
}

/// Cursor & selection commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorCommand {
    /// Move cursor to the specified position (hidden targets are unfolded).
    MoveTo {
        /// Target logical line index.
        line: usize,
        /// Target column in characters (will be clamped to line length).
        column: usize,
    },
    /// Move cursor relatively; lines are counted in visible rows and clamped to the buffer.
    MoveBy {
        /// Delta in visible lines.
        delta_line: isize,
        /// Delta in columns (characters).
        delta_column: isize,
    },
    /// Set selection range
    SetSelection {
        /// Selection anchor.
        start: Position,
        /// Selection active end (the cursor).
        end: Position,
    },
    /// Extend selection range
    ExtendSelection {
        /// New active end position.
        to: Position,
    },
    /// Clear selection
    ClearSelection,
    /// Select the cursor line (including its line break) unless something is selected.
    SelectLine,
    /// Jump to a line, recording the jump in the navigation history.
    GotoLine {
        /// Target logical line (clamped).
        line: usize,
        /// Target column; `0` places the cursor after the leading whitespace.
        column: usize,
        /// Center the target row in the viewport instead of scrolling minimally.
        center: bool,
    },
    /// Jump to the partner of the delimiter at the cursor.
    GotoMatchingDelimiter,
    /// Select the top-level block around the cursor.
    SelectEnclosingBlock,
    /// Jump to the previous top-level line.
    GotoPrevBlock,
    /// Jump to the next top-level line.
    GotoNextBlock,
    /// Go back in the navigation history.
    NavigateBack,
    /// Go forward in the navigation history.
    NavigateForward,
}

/// View commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Set viewport height in rows.
    SetViewportHeight {
        /// Height in rows (must be greater than 0).
        height: usize,
    },
    /// Scroll so that `line` (or the visible line above it) is the first row.
    ScrollTo {
        /// Logical line index to scroll to.
        line: usize,
    },
    /// Set the horizontal scroll offset.
    SetScrollLeft {
        /// Offset in cells.
        cells: usize,
    },
    /// Set tab width (in character cells) used for measuring `'\t'` and indent units.
    SetTabWidth {
        /// Tab width in character cells (must be greater than 0).
        width: usize,
    },
    /// Choose tabs or spaces for inserted indentation.
    SetIndentStyle {
        /// Indent style.
        style: IndentStyle,
    },
    /// Replace all editor settings.
    SetSettings {
        /// New settings.
        settings: Box<EditorSettings>,
    },
    /// Paint the gutter for a range of visual rows.
    GetGutter {
        /// Starting visual row.
        start_row: usize,
        /// Number of visual rows requested.
        count: usize,
    },
}

/// Folding commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldCommand {
    /// Fold the cursor's region (or the enclosing one when the cursor line cannot fold).
    FoldCurrent,
    /// Expand the region headed by the cursor line.
    UnfoldCurrent,
    /// Expand enclosing regions until the cursor line is visible.
    UnfoldToCursor,
    /// Toggle the region headed by `line` (gutter click).
    ToggleFold {
        /// Header line.
        line: usize,
    },
    /// Collapse every region.
    FoldAll,
    /// Expand every region.
    UnfoldAll,
}

/// Unified command enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Text editing commands
    Edit(EditCommand),
    /// Cursor command
    Cursor(CursorCommand),
    /// View commands
    View(ViewCommand),
    /// Folding commands
    Fold(FoldCommand),
    /// A keystroke routed through auto-indent / auto-pair.
    Key(KeyInput),
}

/// Command execution result
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Success, no return value
    Success,
    /// Success, returns text
    Text(String),
    /// Success, returns position
    Position(Position),
    /// Success, returns the new selection
    Selection(Selection),
    /// Success, returns gutter rows
    Gutter(GutterSnapshot),
}

/// Command error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Invalid offset
    #[error("Invalid offset: {0}")]
    InvalidOffset(usize),
    /// Invalid position
    #[error("Invalid position: line {line}, column {column}")]
    InvalidPosition {
        /// Logical line index.
        line: usize,
        /// Column in characters.
        column: usize,
    },
    /// Invalid range
    #[error("Invalid range: {start}..{end}")]
    InvalidRange {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },
    /// Empty text
    #[error("Text cannot be empty")]
    EmptyText,
    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Scroll state of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// First visible visual row.
    pub scroll_top: usize,
    /// Horizontal scroll offset in cells.
    pub scroll_left: usize,
    /// Height in rows, once the host has reported it.
    pub height: Option<usize>,
}

/// Editor Core state
///
/// Owns the buffer and everything derived from the cursor. Mutations go through
/// [`CommandExecutor`]; this type exposes the query surface renderers use.
///
/// # Example
///
/// ```rust
/// use lite_editor_core::EditorCore;
///
/// let core = EditorCore::new("func main() {\n\tprintln()\n}\n");
/// assert_eq!(core.line_count(), 4);
/// assert!(core.can_fold(0));
/// assert_eq!(core.line_metadata(1).unwrap().folding_indent, 1);
/// ```
#[derive(Debug, Clone)]
pub struct EditorCore {
    /// Text and structural index.
    pub buffer: Buffer,
    /// Current cursor position
    pub cursor_position: Position,
    /// Current selection range
    pub selection: Option<Selection>,
    /// Editor settings
    pub settings: EditorSettings,
    /// Scroll state
    pub viewport: Viewport,
    /// Gutter font metrics
    pub gutter_metrics: GutterMetrics,
    highlights: HighlightState,
    history: NavigationHistory,
    skip_over: Option<char>,
    layout_generation: u64,
}

impl EditorCore {
    /// Create a new Editor Core with default settings.
    pub fn new(text: &str) -> Self {
        Self::with_settings(text, EditorSettings::default())
    }

    /// Create a new Editor Core.
    pub fn with_settings(text: &str, settings: EditorSettings) -> Self {
        let buffer = Buffer::new(text);
        let mut highlights = HighlightState::default();
        highlights.refresh(&buffer, Position::default());
        Self {
            buffer,
            cursor_position: Position::default(),
            selection: None,
            history: NavigationHistory::new(settings.history_limit),
            settings,
            viewport: Viewport::default(),
            gutter_metrics: GutterMetrics::default(),
            highlights,
            skip_over: None,
            layout_generation: 0,
        }
    }

    /// Create an empty Editor Core
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Get text content
    pub fn get_text(&self) -> String {
        self.buffer.text()
    }

    /// Get total line count
    pub fn line_count(&self) -> usize {
        self.buffer.line_count()
    }

    /// Get total character count
    pub fn char_count(&self) -> usize {
        self.buffer.char_count()
    }

    /// Text of `line`.
    pub fn line_text(&self, line: usize) -> Option<String> {
        self.buffer.line_text(line)
    }

    /// Get cursor position
    pub fn cursor_position(&self) -> Position {
        self.cursor_position
    }

    /// Get selection range
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Editor settings.
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Structural metadata of `line`.
    pub fn line_metadata(&self, line: usize) -> Option<&LineMetadata> {
        self.buffer.metadata(line)
    }

    /// Returns `true` if `line` heads a fold region.
    pub fn can_fold(&self, line: usize) -> bool {
        folding::can_fold(&self.buffer, line)
    }

    /// Returns `true` if `line` exists and is not inside a collapsed region.
    pub fn is_line_visible(&self, line: usize) -> bool {
        self.buffer.is_visible(line)
    }

    /// All fold regions.
    pub fn fold_regions(&self) -> Vec<FoldRegion> {
        folding::regions(&self.buffer)
    }

    /// Number of visible lines.
    pub fn visible_line_count(&self) -> usize {
        visibility::visible_line_count(&self.buffer)
    }

    /// Visual row of `line` (`None` when hidden).
    pub fn visual_row_for_line(&self, line: usize) -> Option<usize> {
        visibility::visual_row_of(&self.buffer, line)
    }

    /// Logical line at visual `row`.
    pub fn line_for_visual_row(&self, row: usize) -> Option<usize> {
        visibility::line_at_visual_row(&self.buffer, row)
    }

    /// Logical lines covered by the viewport (hidden lines inside it included).
    pub fn visible_line_range(&self) -> Range<usize> {
        let last_line = self.buffer.line_count().saturating_sub(1);
        let last_visible = visibility::visible_at_or_above(&self.buffer, last_line);
        let first = self
            .line_for_visual_row(self.viewport.scroll_top)
            .unwrap_or(last_visible);
        let last = match self.viewport.height {
            Some(height) if height > 0 => {
                match self.line_for_visual_row(self.viewport.scroll_top + height - 1) {
                    // A collapsed header on the last row carries its hidden lines along.
                    Some(line) if folding::is_collapsed(&self.buffer, line) => {
                        folding::region_end(&self.buffer, line) - 1
                    }
                    Some(line) => line,
                    None => last_line,
                }
            }
            _ => last_line,
        };
        first..last.max(first) + 1
    }

    /// Gutter width for the current settings, metrics and line count.
    pub fn extra_gutter_width(&self) -> usize {
        gutter::extra_gutter_width(
            &self.settings.gutter,
            &self.gutter_metrics,
            self.buffer.line_count(),
        )
    }

    /// Lines drawn as "current" in the gutter.
    pub fn current_lines(&self) -> RangeInclusive<usize> {
        match &self.selection {
            Some(selection) if !selection.is_empty() => selection.lines(),
            _ => self.cursor_position.line..=self.cursor_position.line,
        }
    }

    /// Paint the gutter for `count` visual rows starting at `start_row`.
    pub fn gutter(&self, start_row: usize, count: usize) -> GutterSnapshot {
        gutter::paint(
            &self.buffer,
            &self.settings.gutter,
            &self.gutter_metrics,
            self.current_lines(),
            start_row,
            count,
        )
    }

    /// Current-line and brace-match highlight state.
    pub fn highlights(&self) -> &HighlightState {
        &self.highlights
    }

    /// Armed skip-over character.
    pub fn skip_over(&self) -> Option<char> {
        self.skip_over
    }

    /// Bumped whenever line visibility changes.
    pub fn layout_generation(&self) -> u64 {
        self.layout_generation
    }

    /// Cell offset of the cursor within its line.
    pub fn cursor_visual_x(&self) -> usize {
        let text = self
            .buffer
            .line_text(self.cursor_position.line)
            .unwrap_or_default();
        layout::visual_x_for_column(
            &text,
            self.cursor_position.column,
            self.settings.indent.width,
        )
    }

    /// Returns `true` if the buffer changed since the last save.
    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    /// Navigation history.
    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    /// The current location as a history entry.
    pub fn history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            position: self.cursor_position,
            scroll_top: self.viewport.scroll_top,
            scroll_left: self.viewport.scroll_left,
        }
    }

    fn offset_of(&self, position: Position) -> usize {
        self.buffer.position_to_offset(position)
    }

    fn mark_layout_changed(&mut self, changed: bool) {
        if changed {
            self.layout_generation += 1;
        }
    }

    fn reveal(&mut self, line: usize) {
        let changed = visibility::reveal_line(&mut self.buffer, line);
        self.mark_layout_changed(changed);
    }

    fn scroll_to_cursor(&mut self, center: bool) {
        let Some(height) = self.viewport.height.filter(|h| *h > 0) else {
            return;
        };
        let row = self
            .visual_row_for_line(self.cursor_position.line)
            .unwrap_or(0);
        if center {
            self.viewport.scroll_top = row.saturating_sub(height / 2);
        } else if row < self.viewport.scroll_top {
            self.viewport.scroll_top = row;
        } else if row >= self.viewport.scroll_top + height {
            self.viewport.scroll_top = row + 1 - height;
        }
    }

    fn clamp_scroll(&mut self) {
        let max_top = self.visible_line_count().saturating_sub(1);
        self.viewport.scroll_top = self.viewport.scroll_top.min(max_top);
    }

    fn sync_after_command(&mut self, follow_cursor: bool) {
        self.cursor_position = self.buffer.clamp_position(self.cursor_position);
        let cursor = visibility::clamp_cursor(&self.buffer, self.cursor_position);
        if cursor != self.cursor_position {
            self.cursor_position = cursor;
            self.selection = None;
        }
        if let Some(selection) = self.selection {
            let start = self.buffer.clamp_position(selection.start);
            let end = self.buffer.clamp_position(selection.end);
            self.selection = Some(Selection {
                start,
                end,
                direction: selection.direction,
            });
        }

        self.clamp_scroll();
        if follow_cursor {
            self.scroll_to_cursor(false);
        }
        self.highlights.refresh(&self.buffer, self.cursor_position);
    }
}

fn map_offset(offset: usize, start: usize, removed: usize, inserted: usize) -> usize {
    if offset <= start {
        offset
    } else if offset >= start + removed {
        offset - removed + inserted
    } else {
        start + inserted
    }
}

/// Command executor
///
/// The only entry point that mutates the editor. Every command:
///
/// - is validated first (malformed commands return [`CommandError`] without side effects),
/// - records an [`EditNotification`] when it changes text,
/// - leaves the cursor on a visible line with the highlight state refreshed.
///
/// # Command Types
///
/// - [`EditCommand`] - Text insertion, deletion, replacement
/// - [`CursorCommand`] - Cursor movement, selection and jumps
/// - [`ViewCommand`] - Viewport and settings
/// - [`FoldCommand`] - Folding
/// - [`Command::Key`] - Keystrokes with auto-indent and auto-pair
///
/// # Example
///
/// ```rust
/// use lite_editor_core::{Command, CommandExecutor, KeyInput, Position};
///
/// let mut executor = CommandExecutor::new("if (x) {}");
/// executor.editor_mut().cursor_position = Position::new(0, 8);
/// executor.execute(Command::Key(KeyInput::Enter)).unwrap();
///
/// assert_eq!(executor.editor().get_text(), "if (x) {\n\t\n}");
/// assert_eq!(executor.editor().cursor_position(), Position::new(1, 1));
/// ```
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    /// Editor Core
    editor: EditorCore,
    /// Command history
    command_history: Vec<Command>,
    /// Lines touched by the last executed command (cleared on each `execute()` call).
    last_notification: Option<EditNotification>,
}

impl CommandExecutor {
    /// Create a new command executor with default settings.
    pub fn new(text: &str) -> Self {
        Self::with_settings(text, EditorSettings::default())
    }

    /// Create a new command executor.
    pub fn with_settings(text: &str, settings: EditorSettings) -> Self {
        Self {
            editor: EditorCore::with_settings(text, settings),
            command_history: Vec::new(),
            last_notification: None,
        }
    }

    /// Create an empty command executor
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Execute command
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        self.last_notification = None;

        // Save command to history
        self.command_history.push(command.clone());

        let follow_cursor = !matches!(command, Command::View(_));
        if !matches!(command, Command::Key(_) | Command::View(_)) {
            self.editor.skip_over = None;
        }

        let result = match command {
            Command::Edit(edit_cmd) => self.execute_edit(edit_cmd),
            Command::Cursor(cursor_cmd) => self.execute_cursor(cursor_cmd),
            Command::View(view_cmd) => self.execute_view(view_cmd),
            Command::Fold(fold_cmd) => self.execute_fold(fold_cmd),
            Command::Key(input) => self.execute_key(input),
        }?;

        self.editor.sync_after_command(follow_cursor);
        Ok(result)
    }

    /// Batch execute commands
    pub fn execute_batch(
        &mut self,
        commands: Vec<Command>,
    ) -> Result<Vec<CommandResult>, CommandError> {
        let mut results = Vec::new();

        for command in commands {
            let result = self.execute(command)?;
            results.push(result);
        }

        Ok(results)
    }

    /// Lines touched by the last `execute()` call, if it changed text.
    pub fn last_notification(&self) -> Option<EditNotification> {
        self.last_notification
    }

    /// Get command history
    pub fn get_command_history(&self) -> &[Command] {
        &self.command_history
    }

    /// Get Editor Core reference
    pub fn editor(&self) -> &EditorCore {
        &self.editor
    }

    /// Get Editor Core mutable reference
    pub fn editor_mut(&mut self) -> &mut EditorCore {
        &mut self.editor
    }

    /// Record the save point; see [`Buffer::mark_saved`].
    pub fn mark_saved(&mut self) {
        self.editor.buffer.mark_saved();
    }

    /// Attach `mark` to `line`. Returns `false` if the line does not exist.
    pub fn attach_mark(&mut self, line: usize, mark: &Arc<dyn TextMark>) -> bool {
        let attached = self.editor.buffer.attach_mark(line, mark);
        tracing::debug!(line, attached, kind = ?mark.kind(), "attach mark");
        attached
    }

    /// Detach `mark` from every line. Returns the lines it was removed from.
    pub fn detach_mark(&mut self, mark: &Arc<dyn TextMark>) -> Vec<usize> {
        let lines = self.editor.buffer.detach_mark(mark);
        tracing::debug!(?lines, kind = ?mark.kind(), "detach mark");
        lines
    }

    // Apply one text replacement and keep visibility, history and notifications in step.
    fn apply_edit(&mut self, start: usize, length: usize, text: &str) {
        let change = self.editor.buffer.replace(start, length, text);
        let notification = change.notification;

        let layout_changed = visibility::rebuild(&mut self.editor.buffer);
        self.editor.mark_layout_changed(layout_changed);

        let delta = notification.line_delta();
        if delta != 0 {
            let line_count = self.editor.buffer.line_count();
            self.editor
                .history
                .shift_lines(notification.start_line, delta, line_count);
        }

        self.last_notification = Some(match self.last_notification {
            Some(previous) => previous.merge(&notification),
            None => notification,
        });
    }

    // Raw offset edit: cursor and selection follow the text around the edit.
    fn apply_raw_edit(&mut self, start: usize, length: usize, text: &str) {
        let inserted = text.chars().count();
        let cursor = self.editor.offset_of(self.editor.cursor_position);
        let selection = self.editor.selection.map(|s| {
            (
                self.editor.offset_of(s.anchor()),
                self.editor.offset_of(s.active()),
            )
        });

        self.apply_edit(start, length, text);

        let buffer = &self.editor.buffer;
        self.editor.cursor_position =
            buffer.offset_to_position(map_offset(cursor, start, length, inserted));
        self.editor.selection = selection.map(|(anchor, active)| {
            Selection::new(
                buffer.offset_to_position(map_offset(anchor, start, length, inserted)),
                buffer.offset_to_position(map_offset(active, start, length, inserted)),
            )
        });
    }

    // Replace the selection (or the given range) and put the cursor after the new text.
    fn replace_and_place_cursor(&mut self, start: usize, end: usize, text: &str) {
        self.apply_edit(start, end - start, text);
        let offset = start + text.chars().count();
        self.editor.cursor_position = self.editor.buffer.offset_to_position(offset);
        self.editor.selection = None;
    }

    fn selection_offsets(&self) -> Option<(usize, usize)> {
        self.editor
            .selection
            .filter(|s| !s.is_empty())
            .map(|s| (self.editor.offset_of(s.start), self.editor.offset_of(s.end)))
    }

    fn execute_edit(&mut self, command: EditCommand) -> Result<CommandResult, CommandError> {
        let char_count = self.editor.char_count();
        match command {
            EditCommand::Insert { offset, text } => {
                if text.is_empty() {
                    return Err(CommandError::EmptyText);
                }
                if offset > char_count {
                    return Err(CommandError::InvalidOffset(offset));
                }
                self.apply_raw_edit(offset, 0, &text);
                Ok(CommandResult::Success)
            }
            EditCommand::Delete { start, length } => {
                if length == 0 {
                    return Ok(CommandResult::Success);
                }
                Self::check_range(start, length, char_count)?;
                self.apply_raw_edit(start, length, "");
                Ok(CommandResult::Success)
            }
            EditCommand::Replace {
                start,
                length,
                text,
            } => {
                if length == 0 && text.is_empty() {
                    return Ok(CommandResult::Success);
                }
                Self::check_range(start, length, char_count)?;
                self.apply_raw_edit(start, length, &text);
                Ok(CommandResult::Success)
            }
            EditCommand::InsertText { text } => {
                if text.is_empty() {
                    return Err(CommandError::EmptyText);
                }
                let (start, end) = self.selection_offsets().unwrap_or_else(|| {
                    let cursor = self.editor.offset_of(self.editor.cursor_position);
                    (cursor, cursor)
                });
                self.replace_and_place_cursor(start, end, &text);
                Ok(CommandResult::Success)
            }
            EditCommand::Backspace => {
                if let Some((start, end)) = self.selection_offsets() {
                    self.replace_and_place_cursor(start, end, "");
                } else {
                    let cursor = self.editor.offset_of(self.editor.cursor_position);
                    if cursor > 0 {
                        self.replace_and_place_cursor(cursor - 1, cursor, "");
                    }
                }
                Ok(CommandResult::Success)
            }
            EditCommand::DeleteForward => {
                if let Some((start, end)) = self.selection_offsets() {
                    self.replace_and_place_cursor(start, end, "");
                } else {
                    let cursor = self.editor.offset_of(self.editor.cursor_position);
                    if cursor < char_count {
                        self.replace_and_place_cursor(cursor, cursor + 1, "");
                    }
                }
                Ok(CommandResult::Success)
            }
            EditCommand::DeleteLine => {
                self.select_line();
                if let Some((start, end)) = self.selection_offsets() {
                    self.replace_and_place_cursor(start, end, "");
                }
                self.editor.selection = None;
                Ok(CommandResult::Success)
            }
        }
    }

    fn check_range(start: usize, length: usize, char_count: usize) -> Result<(), CommandError> {
        if start > char_count {
            return Err(CommandError::InvalidOffset(start));
        }
        let end = start.saturating_add(length);
        if end > char_count {
            return Err(CommandError::InvalidRange { start, end });
        }
        Ok(())
    }

    // Select the cursor line with its line break (or the preceding one on the last line).
    fn select_line(&mut self) {
        if self.editor.selection.is_some_and(|s| !s.is_empty()) {
            return;
        }
        let buffer = &self.editor.buffer;
        let line = self.editor.cursor_position.line;
        let selection = if line + 1 < buffer.line_count() {
            Selection::new(Position::new(line, 0), Position::new(line + 1, 0))
        } else if line > 0 {
            Selection::new(
                Position::new(line, buffer.line_len(line)),
                Position::new(line - 1, buffer.line_len(line - 1)),
            )
        } else {
            Selection::new(Position::new(line, buffer.line_len(line)), Position::new(0, 0))
        };
        self.editor.cursor_position = selection.active();
        self.editor.selection = Some(selection);
    }

    fn clamp_column(&self, line: usize, column: usize) -> usize {
        column.min(self.editor.buffer.line_len(line))
    }

    fn check_line(&self, position: Position) -> Result<Position, CommandError> {
        if position.line >= self.editor.line_count() {
            return Err(CommandError::InvalidPosition {
                line: position.line,
                column: position.column,
            });
        }
        Ok(Position::new(
            position.line,
            self.clamp_column(position.line, position.column),
        ))
    }

    // Move to `target`, unfolding as needed, and record the jump.
    fn jump_to(&mut self, target: Position, center: bool) {
        let current = self.editor.history_entry();
        let target = self.editor.buffer.clamp_position(target);
        self.editor.reveal(target.line);
        self.editor.cursor_position = target;
        self.editor.selection = None;
        self.editor.scroll_to_cursor(center);
        let entry = self.editor.history_entry();
        // Jumping to the location on top of the history restores the scroll it was left at.
        if let Some(known) = self.editor.history.visit(current, entry) {
            self.editor.viewport.scroll_top = known.scroll_top;
            self.editor.viewport.scroll_left = known.scroll_left;
        }
        tracing::debug!(line = target.line, column = target.column, "jump");
    }

    fn restore_entry(&mut self, entry: HistoryEntry) {
        let position = self.editor.buffer.clamp_position(entry.position);
        self.editor.reveal(position.line);
        self.editor.cursor_position = position;
        self.editor.selection = None;
        self.editor.viewport.scroll_top = entry.scroll_top;
        self.editor.viewport.scroll_left = entry.scroll_left;
    }

    // Next/previous non-empty, non-comment line at folding indent 0.
    fn find_top_level_line(&self, from: usize, forward: bool) -> Option<usize> {
        let buffer = &self.editor.buffer;
        let comments = &self.editor.settings.comments;
        let is_block_start = |line: usize| {
            if buffer.folding_indent(line) != 0 {
                return false;
            }
            let text = buffer.line_text(line).unwrap_or_default();
            let trimmed = text.trim();
            !trimmed.is_empty() && !comments.is_line_comment(trimmed)
        };
        if forward {
            (from + 1..buffer.line_count()).find(|&line| is_block_start(line))
        } else {
            (0..from).rev().find(|&line| is_block_start(line))
        }
    }

    fn execute_cursor(&mut self, command: CursorCommand) -> Result<CommandResult, CommandError> {
        match command {
            CursorCommand::MoveTo { line, column } => {
                let target = self.check_line(Position::new(line, column))?;
                self.editor.reveal(target.line);
                self.editor.cursor_position = target;
                self.editor.selection = None;
                Ok(CommandResult::Success)
            }
            CursorCommand::MoveBy {
                delta_line,
                delta_column,
            } => {
                let cursor = self.editor.cursor_position;
                let line = if delta_line == 0 {
                    cursor.line
                } else {
                    let row = self.editor.visual_row_for_line(cursor.line).unwrap_or(0);
                    let max_row = self.editor.visible_line_count().saturating_sub(1);
                    let row = row.saturating_add_signed(delta_line).min(max_row);
                    self.editor.line_for_visual_row(row).unwrap_or(cursor.line)
                };
                let column = cursor.column.saturating_add_signed(delta_column);
                self.editor.cursor_position = Position::new(line, self.clamp_column(line, column));
                self.editor.selection = None;
                Ok(CommandResult::Success)
            }
            CursorCommand::SetSelection { start, end } => {
                let start = self.check_line(start)?;
                let end = self.check_line(end)?;
                self.editor.reveal(end.line);
                self.editor.selection = Some(Selection::new(start, end));
                self.editor.cursor_position = end;
                Ok(CommandResult::Success)
            }
            CursorCommand::ExtendSelection { to } => {
                let to = self.check_line(to)?;
                let anchor = self
                    .editor
                    .selection
                    .map(|s| s.anchor())
                    .unwrap_or(self.editor.cursor_position);
                self.editor.reveal(to.line);
                self.editor.selection = Some(Selection::new(anchor, to));
                self.editor.cursor_position = to;
                Ok(CommandResult::Success)
            }
            CursorCommand::ClearSelection => {
                self.editor.selection = None;
                Ok(CommandResult::Success)
            }
            CursorCommand::SelectLine => {
                self.select_line();
                match self.editor.selection {
                    Some(selection) => Ok(CommandResult::Selection(selection)),
                    None => Ok(CommandResult::Success),
                }
            }
            CursorCommand::GotoLine {
                line,
                column,
                center,
            } => {
                let line = line.min(self.editor.line_count().saturating_sub(1));
                let column = if column == 0 {
                    let text = self.editor.buffer.line_text(line).unwrap_or_default();
                    text.chars().take_while(|c| *c == ' ' || *c == '\t').count()
                } else {
                    column
                };
                self.jump_to(Position::new(line, column), center);
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
            CursorCommand::GotoMatchingDelimiter => {
                let Some(found) = brace_match::match_at(&self.editor.buffer, self.editor.cursor_position)
                else {
                    return Ok(CommandResult::Success);
                };
                let Some(partner) = found.partner else {
                    return Ok(CommandResult::Success);
                };
                // Land outside the pair so a second jump returns to the anchor.
                let target = if partner > found.anchor {
                    Position::new(partner.line, partner.column + 1)
                } else {
                    partner
                };
                self.jump_to(target, false);
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
            CursorCommand::SelectEnclosingBlock => {
                let buffer = &self.editor.buffer;
                let cursor = self.editor.cursor_position;
                let start = (0..=cursor.line)
                    .rev()
                    .find(|&line| buffer.folding_indent(line) == 0)
                    .unwrap_or(0);
                let end = (cursor.line + 1..buffer.line_count())
                    .find(|&line| buffer.folding_indent(line) == 0)
                    .map(|line| line - 1)
                    .unwrap_or(buffer.line_count().saturating_sub(1));
                let selection = Selection::new(
                    Position::new(start, 0),
                    Position::new(end, buffer.line_len(end)),
                );
                self.editor.selection = Some(selection);
                self.editor.cursor_position = selection.active();
                Ok(CommandResult::Selection(selection))
            }
            CursorCommand::GotoPrevBlock => {
                let target = self
                    .find_top_level_line(self.editor.cursor_position.line, false)
                    .map(|line| Position::new(line, 0))
                    .unwrap_or_default();
                self.jump_to(target, false);
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
            CursorCommand::GotoNextBlock => {
                let target = self
                    .find_top_level_line(self.editor.cursor_position.line, true)
                    .map(|line| Position::new(line, 0))
                    .unwrap_or_else(|| {
                        let last = self.editor.line_count().saturating_sub(1);
                        Position::new(last, self.editor.buffer.line_len(last))
                    });
                self.jump_to(target, false);
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
            CursorCommand::NavigateBack => {
                let current = self.editor.history_entry();
                if let Some(entry) = self.editor.history.back(current) {
                    self.restore_entry(entry);
                }
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
            CursorCommand::NavigateForward => {
                let current = self.editor.history_entry();
                if let Some(entry) = self.editor.history.forward(current) {
                    self.restore_entry(entry);
                }
                Ok(CommandResult::Position(self.editor.cursor_position))
            }
        }
    }

    fn execute_view(&mut self, command: ViewCommand) -> Result<CommandResult, CommandError> {
        match command {
            ViewCommand::SetViewportHeight { height } => {
                if height == 0 {
                    return Err(CommandError::Other(
                        "Viewport height must be greater than 0".to_string(),
                    ));
                }
                self.editor.viewport.height = Some(height);
                self.editor.scroll_to_cursor(false);
                Ok(CommandResult::Success)
            }
            ViewCommand::ScrollTo { line } => {
                if line >= self.editor.line_count() {
                    return Err(CommandError::InvalidPosition { line, column: 0 });
                }
                let line = visibility::visible_at_or_above(&self.editor.buffer, line);
                self.editor.viewport.scroll_top =
                    self.editor.visual_row_for_line(line).unwrap_or(0);
                Ok(CommandResult::Success)
            }
            ViewCommand::SetScrollLeft { cells } => {
                self.editor.viewport.scroll_left = cells;
                Ok(CommandResult::Success)
            }
            ViewCommand::SetTabWidth { width } => {
                if width == 0 {
                    return Err(CommandError::Other(
                        "Tab width must be greater than 0".to_string(),
                    ));
                }
                self.editor.settings.indent.width = width;
                Ok(CommandResult::Success)
            }
            ViewCommand::SetIndentStyle { style } => {
                self.editor.settings.indent.style = style;
                Ok(CommandResult::Success)
            }
            ViewCommand::SetSettings { settings } => {
                if settings.indent.width == 0 {
                    return Err(CommandError::Other(
                        "Tab width must be greater than 0".to_string(),
                    ));
                }
                self.editor.history.set_limit(settings.history_limit);
                self.editor.settings = *settings;
                Ok(CommandResult::Success)
            }
            ViewCommand::GetGutter { start_row, count } => {
                Ok(CommandResult::Gutter(self.editor.gutter(start_row, count)))
            }
        }
    }

    fn execute_fold(&mut self, command: FoldCommand) -> Result<CommandResult, CommandError> {
        let cursor = self.editor.cursor_position;
        let changed = match command {
            FoldCommand::FoldCurrent => {
                match visibility::fold_at_cursor(&mut self.editor.buffer, cursor) {
                    Some(relocated) => {
                        self.editor.cursor_position = relocated;
                        true
                    }
                    None => false,
                }
            }
            FoldCommand::UnfoldCurrent => {
                visibility::unfold_at_cursor(&mut self.editor.buffer, cursor)
            }
            FoldCommand::UnfoldToCursor => {
                visibility::reveal_line(&mut self.editor.buffer, cursor.line)
            }
            FoldCommand::ToggleFold { line } => visibility::toggle(&mut self.editor.buffer, line),
            FoldCommand::FoldAll => visibility::collapse_all(&mut self.editor.buffer),
            FoldCommand::UnfoldAll => visibility::expand_all(&mut self.editor.buffer),
        };
        self.editor.mark_layout_changed(changed);
        Ok(CommandResult::Success)
    }

    fn execute_key(&mut self, input: KeyInput) -> Result<CommandResult, CommandError> {
        let plan = {
            let editor = &self.editor;
            let context = KeyContext {
                buffer: &editor.buffer,
                cursor: editor.cursor_position,
                selection: editor.selection.as_ref(),
                settings: &editor.settings,
                skip_over: editor.skip_over,
            };
            auto_edit::plan_key(&context, &input)
        };
        self.apply_plan(plan);
        Ok(CommandResult::Success)
    }

    fn apply_plan(&mut self, plan: KeyPlan) {
        if plan.reveal_next_line {
            let header = self.editor.cursor_position.line;
            let changed = visibility::set_collapsed(&mut self.editor.buffer, header, false);
            self.editor.mark_layout_changed(changed);
        }

        let edits: Vec<(usize, usize, String)> = plan
            .edits
            .into_iter()
            .map(|edit| {
                let start = self.editor.offset_of(edit.start);
                let end = self.editor.offset_of(edit.end);
                (start, end - start, edit.text)
            })
            .collect();
        for (start, length, text) in edits.into_iter().rev() {
            self.apply_edit(start, length, &text);
        }

        self.editor.cursor_position = self.editor.buffer.clamp_position(plan.cursor);
        self.editor.selection = plan.selection;
        self.editor.skip_over = plan.skip_over;
    }
}
