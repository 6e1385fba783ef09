//! Versioned state snapshots for hosts.
//!
//! [`EditorStateManager`] sits between a frontend and the [`CommandExecutor`]. Every command goes
//! through it; afterwards the manager diffs what a renderer can observe (text, fold layout,
//! cursor, selection, viewport, settings) and publishes one [`StateChange`] per aspect that moved.
//! Document changes carry the [`EditNotification`] of the edit, so a host can repaint only the
//! affected lines.
//!
//! Snapshots (`get_document_state`, `get_cursor_state`, `get_folding_state`, ...) are plain
//! owned values that can be held across later commands.
//!
//! # Example
//!
//! ```rust
//! use lite_editor_core::{Command, EditorStateManager, KeyInput, StateChangeType};
//!
//! let mut manager = EditorStateManager::new("func main() {\n}");
//!
//! manager.subscribe(|change| {
//!     if change.change_type == StateChangeType::DocumentModified {
//!         assert!(change.edit.is_some());
//!     }
//! });
//!
//! manager.execute(Command::Key(KeyInput::Char('x'))).unwrap();
//! let doc_state = manager.get_document_state();
//! assert!(doc_state.is_modified);
//! assert_eq!(doc_state.line_count, 2);
//! ```

use crate::brace_match::BraceMatch;
use crate::buffer::LineMetadata;
use crate::delta::EditNotification;
use crate::folding::FoldRegion;
use crate::gutter::GutterSnapshot;
use crate::marks::TextMark;
use crate::{
    Command, CommandError, CommandExecutor, CommandResult, EditorCore, Position, Selection,
};
use lite_editor_lang::EditorSettings;
use std::ops::Range;
use std::sync::Arc;

/// Document state
#[derive(Debug, Clone)]
pub struct DocumentState {
    /// Total document line count
    pub line_count: usize,
    /// Total document character count
    pub char_count: usize,
    /// Total document byte count
    pub byte_count: usize,
    /// Whether the document changed since the last save
    pub is_modified: bool,
    /// Buffer revision (incremented by every edit)
    pub revision: i64,
    /// Revision recorded by the last save
    pub last_save_revision: i64,
    /// State version number
    pub version: u64,
}

/// Cursor state
#[derive(Debug, Clone)]
pub struct CursorState {
    /// Cursor position (logical coordinates)
    pub position: Position,
    /// Cursor position (char offset)
    pub offset: usize,
    /// Cell offset of the cursor within its line
    pub visual_x: usize,
    /// Selection (None for empty selection)
    pub selection: Option<Selection>,
    /// Brace match around the cursor
    pub brace_match: Option<BraceMatch>,
    /// Armed skip-over character
    pub skip_over: Option<char>,
}

/// Viewport state
#[derive(Debug, Clone)]
pub struct ViewportState {
    /// Viewport height (line count, determined by the frontend)
    pub height: Option<usize>,
    /// Current scroll position (visual row)
    pub scroll_top: usize,
    /// Horizontal scroll offset in cells
    pub scroll_left: usize,
    /// Logical lines covered by the viewport
    pub visible_lines: Range<usize>,
    /// Gutter width
    pub gutter_width: usize,
}

/// Folding state
#[derive(Debug, Clone)]
pub struct FoldingState {
    /// All folding regions
    pub regions: Vec<FoldRegion>,
    /// Count of hidden lines
    pub collapsed_line_count: usize,
    /// Count of visible logical lines
    pub visible_logical_lines: usize,
    /// Bumped whenever line visibility changes
    pub layout_generation: u64,
}

/// Navigation history state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
    /// Back is available
    pub can_go_back: bool,
    /// Forward is available
    pub can_go_forward: bool,
}

/// State change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeType {
    /// Document content modified
    DocumentModified,
    /// Save point recorded
    DocumentSaved,
    /// Cursor moved
    CursorMoved,
    /// Selection changed
    SelectionChanged,
    /// Viewport changed
    ViewportChanged,
    /// Folding state changed
    FoldingChanged,
    /// Marks attached or detached
    MarksChanged,
    /// Settings changed
    SettingsChanged,
}

/// State change record
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Change type
    pub change_type: StateChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
    /// Lines touched by a document change.
    pub edit: Option<EditNotification>,
}

impl StateChange {
    /// Create a new state change record without an edit notification.
    pub fn new(change_type: StateChangeType, old_version: u64, new_version: u64) -> Self {
        Self {
            change_type,
            old_version,
            new_version,
            edit: None,
        }
    }

    /// Attach the edit notification to this change record.
    pub fn with_edit(mut self, edit: EditNotification) -> Self {
        self.edit = Some(edit);
        self
    }
}

/// Complete editor state snapshot
#[derive(Debug, Clone)]
pub struct EditorState {
    /// Document state
    pub document: DocumentState,
    /// Cursor state
    pub cursor: CursorState,
    /// Viewport state
    pub viewport: ViewportState,
    /// Folding state
    pub folding: FoldingState,
    /// Navigation history state
    pub navigation: NavigationState,
}

/// State change callback function type
pub type StateChangeCallback = Box<dyn FnMut(&StateChange) + Send>;

// Observable pieces compared before and after a command.
#[derive(PartialEq)]
struct Observed {
    cursor: Position,
    selection: Option<Selection>,
    scroll_top: usize,
    scroll_left: usize,
    height: Option<usize>,
    layout_generation: u64,
    settings: EditorSettings,
}

impl Observed {
    fn capture(editor: &EditorCore) -> Self {
        Self {
            cursor: editor.cursor_position(),
            selection: editor.selection().copied(),
            scroll_top: editor.viewport.scroll_top,
            scroll_left: editor.viewport.scroll_left,
            height: editor.viewport.height,
            layout_generation: editor.layout_generation(),
            settings: editor.settings().clone(),
        }
    }
}

/// Command front end that versions every observable change.
///
/// Hosts call [`execute()`](EditorStateManager::execute) instead of talking to the executor
/// directly. The observable state is captured before and after the command, and each aspect that
/// differs (document, folding, selection or cursor, viewport, settings) bumps the version once and
/// is reported to subscribers in that order.
///
/// No-op commands (a fold on a non-foldable line, a move clamped at the buffer edge) do not bump
/// the version.
pub struct EditorStateManager {
    /// Command executor
    executor: CommandExecutor,
    /// State version number
    state_version: u64,
    /// State change callback list
    callbacks: Vec<StateChangeCallback>,
}

impl EditorStateManager {
    /// Create a new state manager with default settings.
    pub fn new(text: &str) -> Self {
        Self::with_settings(text, EditorSettings::default())
    }

    /// Create a new state manager.
    pub fn with_settings(text: &str, settings: EditorSettings) -> Self {
        Self {
            executor: CommandExecutor::with_settings(text, settings),
            state_version: 0,
            callbacks: Vec::new(),
        }
    }

    /// Create an empty state manager
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Get a reference to the Editor Core
    pub fn editor(&self) -> &EditorCore {
        self.executor.editor()
    }

    /// Get a mutable reference to the Editor Core
    ///
    /// Changes made this way are not observed; call [`mark_modified`](Self::mark_modified)
    /// afterwards.
    pub fn editor_mut(&mut self) -> &mut EditorCore {
        self.executor.editor_mut()
    }

    /// Get the command executor
    pub fn executor(&self) -> &CommandExecutor {
        &self.executor
    }

    /// Execute a command and trigger state change notifications for what it changed.
    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        let before = Observed::capture(self.executor.editor());
        let result = self.executor.execute(command)?;
        let after = Observed::capture(self.executor.editor());

        if let Some(edit) = self.executor.last_notification() {
            self.bump(StateChangeType::DocumentModified, Some(edit));
        }
        if before.layout_generation != after.layout_generation {
            self.bump(StateChangeType::FoldingChanged, None);
        }
        if before.selection != after.selection {
            self.bump(StateChangeType::SelectionChanged, None);
        } else if before.cursor != after.cursor {
            self.bump(StateChangeType::CursorMoved, None);
        }
        if (before.scroll_top, before.scroll_left, before.height)
            != (after.scroll_top, after.scroll_left, after.height)
        {
            self.bump(StateChangeType::ViewportChanged, None);
        }
        if before.settings != after.settings {
            self.bump(StateChangeType::SettingsChanged, None);
        }

        Ok(result)
    }

    /// Get current version number
    pub fn version(&self) -> u64 {
        self.state_version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.state_version > version
    }

    /// Set scroll position (visual row)
    pub fn set_scroll_top(&mut self, scroll_top: usize) {
        let max_top = self.editor().visible_line_count().saturating_sub(1);
        let scroll_top = scroll_top.min(max_top);
        if self.editor().viewport.scroll_top != scroll_top {
            self.editor_mut().viewport.scroll_top = scroll_top;
            self.bump(StateChangeType::ViewportChanged, None);
        }
    }

    /// Get complete editor state snapshot
    pub fn get_full_state(&self) -> EditorState {
        EditorState {
            document: self.get_document_state(),
            cursor: self.get_cursor_state(),
            viewport: self.get_viewport_state(),
            folding: self.get_folding_state(),
            navigation: self.get_navigation_state(),
        }
    }

    /// Get document state
    pub fn get_document_state(&self) -> DocumentState {
        let editor = self.executor.editor();
        DocumentState {
            line_count: editor.line_count(),
            char_count: editor.char_count(),
            byte_count: editor.buffer.text().len(),
            is_modified: editor.is_modified(),
            revision: editor.buffer.revision(),
            last_save_revision: editor.buffer.last_save_revision(),
            version: self.state_version,
        }
    }

    /// Get cursor state
    pub fn get_cursor_state(&self) -> CursorState {
        let editor = self.executor.editor();
        let position = editor.cursor_position();
        CursorState {
            position,
            offset: editor.buffer.position_to_offset(position),
            visual_x: editor.cursor_visual_x(),
            selection: editor.selection().copied().filter(|s| !s.is_empty()),
            brace_match: editor.highlights().brace_match().copied(),
            skip_over: editor.skip_over(),
        }
    }

    /// Get viewport state
    pub fn get_viewport_state(&self) -> ViewportState {
        let editor = self.executor.editor();
        ViewportState {
            height: editor.viewport.height,
            scroll_top: editor.viewport.scroll_top,
            scroll_left: editor.viewport.scroll_left,
            visible_lines: editor.visible_line_range(),
            gutter_width: editor.extra_gutter_width(),
        }
    }

    /// Get folding state
    pub fn get_folding_state(&self) -> FoldingState {
        let editor = self.executor.editor();
        let visible_logical_lines = editor.visible_line_count();
        FoldingState {
            regions: editor.fold_regions(),
            collapsed_line_count: editor.line_count() - visible_logical_lines,
            visible_logical_lines,
            layout_generation: editor.layout_generation(),
        }
    }

    /// Get navigation history state
    pub fn get_navigation_state(&self) -> NavigationState {
        let history = self.executor.editor().history();
        NavigationState {
            can_go_back: history.can_go_back(),
            can_go_forward: history.can_go_forward(),
        }
    }

    /// Paint the gutter for `count` visual rows starting at `start_row`.
    pub fn get_gutter(&self, start_row: usize, count: usize) -> GutterSnapshot {
        self.executor.editor().gutter(start_row, count)
    }

    /// Structural metadata of `line`.
    pub fn line_metadata(&self, line: usize) -> Option<&LineMetadata> {
        self.executor.editor().line_metadata(line)
    }

    /// Gutter width for the current settings and line count.
    pub fn extra_gutter_width(&self) -> usize {
        self.executor.editor().extra_gutter_width()
    }

    /// Logical lines covered by the viewport.
    pub fn visible_line_range(&self) -> Range<usize> {
        self.executor.editor().visible_line_range()
    }

    /// Attach `mark` to `line`.
    pub fn attach_mark(&mut self, line: usize, mark: &Arc<dyn TextMark>) -> bool {
        let attached = self.executor.attach_mark(line, mark);
        if attached {
            self.bump(StateChangeType::MarksChanged, None);
        }
        attached
    }

    /// Detach `mark` from every line.
    pub fn detach_mark(&mut self, mark: &Arc<dyn TextMark>) -> Vec<usize> {
        let lines = self.executor.detach_mark(mark);
        if !lines.is_empty() {
            self.bump(StateChangeType::MarksChanged, None);
        }
        lines
    }

    /// Record the save point (e.g., after writing the file).
    pub fn mark_saved(&mut self) {
        self.executor.mark_saved();
        self.bump(StateChangeType::DocumentSaved, None);
    }

    /// Subscribe to state change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&StateChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Increment the version number and notify subscribers.
    pub fn mark_modified(&mut self, change_type: StateChangeType) {
        self.bump(change_type, None);
    }

    fn bump(&mut self, change_type: StateChangeType, edit: Option<EditNotification>) {
        let old_version = self.state_version;
        self.state_version += 1;

        let mut change = StateChange::new(change_type, old_version, self.state_version);
        if let Some(edit) = edit {
            change = change.with_edit(edit);
        }
        self.notify_callbacks(&change);
    }

    /// Notify all callbacks
    fn notify_callbacks(&mut self, change: &StateChange) {
        for callback in &mut self.callbacks {
            callback(change);
        }
    }
}
