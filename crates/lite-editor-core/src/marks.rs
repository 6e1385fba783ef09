//! External line annotations (breakpoints, bookmarks, diagnostics).
//!
//! Marks are owned by whoever created them (a debugger, a bookmark list). Lines only keep
//! [`Weak`] references, so dropping the owning [`Arc`] removes the mark from the next gutter
//! paint without any explicit detach.

use std::sync::{Arc, Weak};

/// Kind of a mark, used by renderers to pick a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    /// Debugger breakpoint.
    Breakpoint,
    /// User bookmark.
    Bookmark,
    /// Current execution line while debugging.
    ExecutionPoint,
    /// Error diagnostic.
    Error,
    /// Warning diagnostic.
    Warning,
    /// Host-defined kind.
    Custom(u32),
}

/// An annotation attached to a line.
pub trait TextMark: Send + Sync {
    /// Mark kind.
    fn kind(&self) -> MarkKind;

    /// Optional tooltip text.
    fn tooltip(&self) -> Option<String> {
        None
    }

    /// Paint priority; higher values are drawn on top.
    fn priority(&self) -> i32 {
        0
    }
}

/// Weak handle stored in a line's metadata.
pub type MarkHandle = Weak<dyn TextMark>;

/// Snapshot of a live mark taken at paint time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkInfo {
    /// Mark kind.
    pub kind: MarkKind,
    /// Tooltip text.
    pub tooltip: Option<String>,
    /// Paint priority.
    pub priority: i32,
}

/// Simple mark implementation for hosts that only need a kind and a tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleMark {
    /// Mark kind.
    pub kind: MarkKind,
    /// Tooltip text.
    pub tooltip: Option<String>,
}

impl SimpleMark {
    /// Create a shareable mark of `kind`.
    pub fn new(kind: MarkKind) -> Arc<dyn TextMark> {
        Arc::new(Self {
            kind,
            tooltip: None,
        })
    }

    /// Create a shareable mark of `kind` with a tooltip.
    pub fn with_tooltip(kind: MarkKind, tooltip: impl Into<String>) -> Arc<dyn TextMark> {
        Arc::new(Self {
            kind,
            tooltip: Some(tooltip.into()),
        })
    }
}

impl TextMark for SimpleMark {
    fn kind(&self) -> MarkKind {
        self.kind
    }

    fn tooltip(&self) -> Option<String> {
        self.tooltip.clone()
    }
}

/// Upgrade the live handles in `marks`, ordered by priority (lowest first).
pub fn live_marks(marks: &[MarkHandle]) -> Vec<MarkInfo> {
    let mut infos: Vec<MarkInfo> = marks
        .iter()
        .filter_map(Weak::upgrade)
        .map(|mark| MarkInfo {
            kind: mark.kind(),
            tooltip: mark.tooltip(),
            priority: mark.priority(),
        })
        .collect();
    infos.sort_by_key(|info| info.priority);
    infos
}

/// Returns `true` if `handle` refers to `mark`.
pub fn refers_to(handle: &MarkHandle, mark: &Arc<dyn TextMark>) -> bool {
    std::ptr::addr_eq(handle.as_ptr(), Arc::as_ptr(mark))
}
