//! Back/forward navigation history.
//!
//! Two bounded stacks. The top of the backward stack always describes the location the editor
//! is currently at (refreshed with the live cursor and scroll offsets before leaving it); the
//! forward stack holds locations left with [`NavigationHistory::back`].

use crate::commands::Position;
use std::collections::VecDeque;

/// A visited location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Cursor position.
    pub position: Position,
    /// First visible visual row.
    pub scroll_top: usize,
    /// Horizontal scroll offset in cells.
    pub scroll_left: usize,
}

impl HistoryEntry {
    /// Entry for `position` with zero scroll offsets.
    pub fn at(position: Position) -> Self {
        Self {
            position,
            scroll_top: 0,
            scroll_left: 0,
        }
    }

    fn same_location(&self, other: &HistoryEntry) -> bool {
        self.position.line == other.position.line
    }
}

/// Bounded back/forward stacks.
#[derive(Debug, Clone)]
pub struct NavigationHistory {
    backward: VecDeque<HistoryEntry>,
    forward: Vec<HistoryEntry>,
    limit: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl NavigationHistory {
    /// Create an empty history keeping at most `limit` backward entries.
    pub fn new(limit: usize) -> Self {
        Self {
            backward: VecDeque::new(),
            forward: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Change the bound, dropping the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
    }

    /// Record a jump from `current` to `target`.
    ///
    /// Returns the entry to restore when `target` is the location already on top of the backward
    /// stack (so its scroll offsets can be reapplied).
    pub fn visit(&mut self, current: HistoryEntry, target: HistoryEntry) -> Option<HistoryEntry> {
        if let Some(top) = self.backward.back()
            && top.same_location(&target)
        {
            return Some(*top);
        }

        match self.backward.back_mut() {
            Some(top) => *top = current,
            None => self.backward.push_back(current),
        }
        self.backward.push_back(target);
        self.trim();

        if self
            .forward
            .last()
            .is_some_and(|entry| entry.same_location(&target))
        {
            self.forward.pop();
        } else {
            self.forward.clear();
        }
        None
    }

    /// Step back. `current` is pushed onto the forward stack.
    pub fn back(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        if self.backward.len() <= 1 {
            return None;
        }
        self.forward.push(current);
        self.backward.pop_back();
        self.backward.back().copied()
    }

    /// Step forward. `current` refreshes the backward top first.
    pub fn forward(&mut self, current: HistoryEntry) -> Option<HistoryEntry> {
        let next = self.forward.pop()?;
        match self.backward.back_mut() {
            Some(top) => *top = current,
            None => self.backward.push_back(current),
        }
        self.backward.push_back(next);
        self.trim();
        Some(next)
    }

    /// Returns `true` if [`NavigationHistory::back`] would move.
    pub fn can_go_back(&self) -> bool {
        self.backward.len() > 1
    }

    /// Returns `true` if [`NavigationHistory::forward`] would move.
    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Number of backward entries (including the current location).
    pub fn backward_len(&self) -> usize {
        self.backward.len()
    }

    /// Number of forward entries.
    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.backward.clear();
        self.forward.clear();
    }

    /// Shift recorded lines after an edit that changed the line count at `start_line`.
    pub fn shift_lines(&mut self, start_line: usize, delta: isize, line_count: usize) {
        let last = line_count.saturating_sub(1);
        for entry in self.backward.iter_mut().chain(self.forward.iter_mut()) {
            if entry.position.line > start_line {
                let line = entry.position.line as isize + delta;
                entry.position.line = (line.max(start_line as isize) as usize).min(last);
            }
        }
    }

    fn trim(&mut self) {
        while self.backward.len() > self.limit {
            self.backward.pop_front();
        }
        self.forward.truncate(self.limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> HistoryEntry {
        HistoryEntry::at(Position::new(line, 0))
    }

    #[test]
    fn test_back_and_forward_walk_the_stacks() {
        let mut history = NavigationHistory::new(10);
        assert!(!history.can_go_back());

        history.visit(at(0), at(10));
        history.visit(at(10), at(20));
        assert_eq!(history.backward_len(), 3);

        assert_eq!(history.back(at(20)), Some(at(10)));
        assert_eq!(history.back(at(10)), Some(at(0)));
        assert_eq!(history.back(at(0)), None);
        assert!(history.can_go_forward());

        assert_eq!(history.forward(at(0)), Some(at(10)));
        assert_eq!(history.forward(at(10)), Some(at(20)));
        assert_eq!(history.forward(at(20)), None);
    }

    #[test]
    fn test_back_records_live_location() {
        let mut history = NavigationHistory::new(10);
        history.visit(at(0), at(10));
        let moved = HistoryEntry {
            position: Position::new(12, 3),
            scroll_top: 4,
            scroll_left: 0,
        };
        history.back(moved);
        assert_eq!(history.forward(at(0)), Some(moved));
    }

    #[test]
    fn test_new_visit_clears_forward_unless_it_matches() {
        let mut history = NavigationHistory::new(10);
        history.visit(at(0), at(10));
        history.visit(at(10), at(20));
        history.visit(at(20), at(30));
        history.back(at(30));
        history.back(at(20));
        assert_eq!(history.forward_len(), 2);

        // Revisiting the forward top pops it instead of clearing the stack.
        history.visit(at(10), at(20));
        assert_eq!(history.forward_len(), 1);
        assert_eq!(history.forward(at(20)), Some(at(30)));

        history.back(at(30));
        history.back(at(20));
        assert_eq!(history.forward_len(), 2);
        history.visit(at(10), at(5));
        assert_eq!(history.forward_len(), 0);
    }

    #[test]
    fn test_visit_current_top_restores_it() {
        let mut history = NavigationHistory::new(10);
        history.visit(at(0), at(10));
        assert_eq!(history.visit(at(10), at(10)), Some(at(10)));
        assert_eq!(history.backward_len(), 2);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = NavigationHistory::new(3);
        for line in 1..10 {
            history.visit(at(line - 1), at(line));
        }
        assert_eq!(history.backward_len(), 3);
        assert_eq!(history.back(at(9)), Some(at(8)));
        assert_eq!(history.back(at(8)), Some(at(7)));
        assert_eq!(history.back(at(7)), None);
    }

    #[test]
    fn test_shift_lines_follows_edits() {
        let mut history = NavigationHistory::new(10);
        history.visit(at(2), at(30));
        history.shift_lines(5, 3, 100);
        assert_eq!(history.back(at(33)), Some(at(2)));
        assert_eq!(history.forward(at(2)), Some(at(33)));
    }
}
