#![warn(missing_docs)]
//! Lite Editor Core - Headless Structural Editing Kernel
//!
//! # Overview
//!
//! `lite-editor-core` is the structural layer of a code editor: it keeps a per-line index of
//! delimiters and brace depth next to the text, derives fold regions from it, matches brackets
//! around the cursor, plans auto-indent / auto-pair edits for keystrokes and paints a gutter model.
//! It does not draw anything; renderers read the query surface and the gutter snapshot.
//!
//! # Core Features
//!
//! - **Delimiter Index**: per-line `(column, char, open/close)` records, maintained incrementally
//!   with a fixed-point early exit
//! - **Code Folding**: regions derived from brace depth, collapsed by flipping line visibility
//! - **Brace Matching**: same-kind depth counting across lines, with mismatch reporting
//! - **Auto Edit**: Enter indentation, bracket/quote pairing with skip-over, Tab/Backtab, smart Home
//! - **Gutter**: line numbers, modification bars, fold boxes and annotation marks
//! - **State Tracking**: version numbers and change notifications carrying edit line ranges
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Command Interface & State Management       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Auto Edit · Navigation History             │  ← Keystrokes & Jumps
//! ├─────────────────────────────────────────────┤
//! │  Gutter · Highlights                        │  ← Rendering Data
//! ├─────────────────────────────────────────────┤
//! │  Visibility · Brace Matching                │  ← Structure Queries
//! ├─────────────────────────────────────────────┤
//! │  Fold Index · Delimiter Index               │  ← Per-line Metadata
//! ├─────────────────────────────────────────────┤
//! │  Buffer (Rope + line side table)            │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Using Command Interface
//!
//! ```rust
//! use lite_editor_core::{Command, CommandExecutor, CursorCommand, FoldCommand, Position};
//!
//! let mut executor = CommandExecutor::new("func main() {\n\tprintln()\n}\n");
//!
//! // Fold the function
//! executor.execute(Command::Fold(FoldCommand::ToggleFold { line: 0 })).unwrap();
//! assert!(!executor.editor().is_line_visible(1));
//!
//! // Jumping into a folded region unfolds it
//! executor.execute(Command::Cursor(CursorCommand::GotoLine {
//!     line: 1,
//!     column: 0,
//!     center: false,
//! })).unwrap();
//!
//! assert_eq!(executor.editor().cursor_position(), Position::new(1, 1));
//! assert!(executor.editor().is_line_visible(1));
//! ```
//!
//! ## Using State Management
//!
//! ```rust
//! use lite_editor_core::EditorStateManager;
//!
//! let mut manager = EditorStateManager::new("Initial text");
//!
//! // Subscribe to state changes
//! manager.subscribe(|change| {
//!     println!("State changed: {:?} {:?}", change.change_type, change.edit);
//! });
//!
//! // Query state
//! let doc_state = manager.get_document_state();
//! println!("Line count: {}, Characters: {}", doc_state.line_count, doc_state.char_count);
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - Rope-backed text with the per-line metadata side table
//! - [`delimiters`] - Delimiter scanning for a single line
//! - [`folding`] - Fold index and region queries
//! - [`visibility`] - Collapse/expand and visual row mapping
//! - [`brace_match`] - Bracket matching around the cursor
//! - [`auto_edit`] - Keystroke planning
//! - [`gutter`] - Gutter model and width formula
//! - [`marks`] - Annotation marks held by weak reference
//! - [`history`] - Back/forward navigation stacks
//! - [`commands`] - Unified command interface
//! - [`state`] - State management and query interface
//!
//! # Unicode Support
//!
//! - Columns are counted in characters; [`layout`] converts them to terminal cells
//! - Proper handling of CJK double-width characters
//! - Only `\n` separates lines; `\r\n` input is normalized on load

pub mod auto_edit;
pub mod brace_match;
pub mod buffer;
pub mod commands;
pub mod delimiters;
pub mod delta;
pub mod folding;
pub mod gutter;
pub mod highlight;
pub mod history;
pub mod layout;
pub mod marks;
pub mod state;
pub mod visibility;

pub use auto_edit::{KeyContext, KeyInput, KeyPlan, PlannedEdit, plan_key};
pub use brace_match::{BraceMatch, MatchKind};
pub use buffer::{Buffer, Line, LineMetadata};
pub use commands::{
    Command, CommandError, CommandExecutor, CommandResult, CursorCommand, EditCommand, EditorCore,
    FoldCommand, Position, Selection, SelectionDirection, ViewCommand, Viewport,
};
pub use delimiters::{Delimiter, DelimiterRole};
pub use delta::{EditNotification, TextChange};
pub use folding::FoldRegion;
pub use gutter::{
    FoldMarker, GutterLine, GutterMetrics, GutterSnapshot, ModificationState, extra_gutter_width,
};
pub use highlight::{DelimiterHighlight, HighlightKind, HighlightState};
pub use history::{HistoryEntry, NavigationHistory};
pub use lite_editor_lang::{
    AutoPairConfig, CommentConfig, EditorSettings, GutterConfig, IndentConfig, IndentStyle,
};
pub use marks::{MarkHandle, MarkInfo, MarkKind, SimpleMark, TextMark};
pub use state::{
    CursorState, DocumentState, EditorState, EditorStateManager, FoldingState, NavigationState,
    StateChange, StateChangeCallback, StateChangeType, ViewportState,
};
