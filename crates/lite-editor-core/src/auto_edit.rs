//! Keystroke planning: auto-indent, auto-pair and skip-over, Tab/Backtab and smart Home.
//!
//! [`plan_key`] is pure: it reads the buffer, cursor, selection and settings, and returns a
//! [`KeyPlan`] describing the edits and the resulting cursor. The command executor applies the
//! plan; nothing here mutates editor state.

use crate::buffer::Buffer;
use crate::commands::{Position, Selection};
use crate::delimiters::is_bracket_pair;
use lite_editor_lang::EditorSettings;

/// A key event as seen by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A printable character.
    Char(char),
    /// Enter / Return.
    Enter,
    /// Tab.
    Tab,
    /// Shift+Tab.
    Backtab,
    /// Home; `select` extends the selection.
    Home {
        /// Extend the selection instead of moving.
        select: bool,
    },
}

/// Everything the planner reads.
#[derive(Debug, Clone, Copy)]
pub struct KeyContext<'a> {
    /// The document.
    pub buffer: &'a Buffer,
    /// Cursor position.
    pub cursor: Position,
    /// Current selection.
    pub selection: Option<&'a Selection>,
    /// Editor settings.
    pub settings: &'a EditorSettings,
    /// Armed skip-over character.
    pub skip_over: Option<char>,
}

/// A replacement in pre-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEdit {
    /// Start of the replaced range.
    pub start: Position,
    /// End of the replaced range (exclusive).
    pub end: Position,
    /// Replacement text.
    pub text: String,
}

impl PlannedEdit {
    fn insert(at: Position, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }
}

/// Result of planning a keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPlan {
    /// Edits ordered by position, non-overlapping, in pre-edit coordinates.
    pub edits: Vec<PlannedEdit>,
    /// Cursor after the edits.
    pub cursor: Position,
    /// Selection after the edits (`None` clears it).
    pub selection: Option<Selection>,
    /// Skip-over state after this keystroke.
    pub skip_over: Option<char>,
    /// Expand the cursor line's collapsed region before applying the edits.
    pub reveal_next_line: bool,
}

impl KeyPlan {
    fn move_to(cursor: Position) -> Self {
        Self {
            edits: Vec::new(),
            cursor,
            selection: None,
            skip_over: None,
            reveal_next_line: false,
        }
    }

    fn edit(edit: PlannedEdit, cursor: Position) -> Self {
        Self {
            edits: vec![edit],
            ..Self::move_to(cursor)
        }
    }

    /// Returns `true` if the plan changes the text.
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }
}

/// Plan the effect of `input`.
pub fn plan_key(context: &KeyContext<'_>, input: &KeyInput) -> KeyPlan {
    match *input {
        KeyInput::Char('\n') | KeyInput::Enter => plan_enter(context),
        KeyInput::Char('\t') | KeyInput::Tab => plan_indent(context, true),
        KeyInput::Char(ch) => plan_char(context, ch),
        KeyInput::Backtab => plan_indent(context, false),
        KeyInput::Home { select } => plan_home(context, select),
    }
}

fn replaced_range(context: &KeyContext<'_>) -> (Position, Position) {
    match context.selection {
        Some(selection) if !selection.is_empty() => (selection.start, selection.end),
        _ => (context.cursor, context.cursor),
    }
}

fn leading_whitespace(text: &str) -> String {
    text.chars().take_while(|c| *c == ' ' || *c == '\t').collect()
}

fn plan_char(context: &KeyContext<'_>, ch: char) -> KeyPlan {
    let buffer = context.buffer;
    let has_selection = context.selection.is_some_and(|s| !s.is_empty());

    if context.skip_over == Some(ch)
        && !has_selection
        && buffer.char_at(context.cursor) == Some(ch)
    {
        tracing::trace!(%ch, "skip-over consumed");
        return KeyPlan::move_to(Position::new(
            context.cursor.line,
            context.cursor.column + 1,
        ));
    }

    let (start, end) = replaced_range(context);
    let cursor = Position::new(start.line, start.column + 1);
    let next = buffer.char_at(end);

    if let Some(close) = context.settings.auto_pair.closing_for(ch)
        && next.is_none_or(char::is_whitespace)
    {
        let mut text = String::with_capacity(2);
        text.push(ch);
        text.push(close);
        let mut plan = KeyPlan::edit(PlannedEdit { start, end, text }, cursor);
        plan.skip_over = Some(close);
        return plan;
    }

    KeyPlan::edit(
        PlannedEdit {
            start,
            end,
            text: ch.to_string(),
        },
        cursor,
    )
}

fn plan_enter(context: &KeyContext<'_>) -> KeyPlan {
    let buffer = context.buffer;
    let (start, end) = replaced_range(context);
    let line_text = buffer.line_text(start.line).unwrap_or_default();
    let reveal_next_line = start == end
        && start.line + 1 < buffer.line_count()
        && !buffer.is_visible(start.line + 1);

    if !context.settings.auto_indent {
        let mut plan = KeyPlan::edit(
            PlannedEdit {
                start,
                end,
                text: "\n".to_string(),
            },
            Position::new(start.line + 1, 0),
        );
        plan.reveal_next_line = reveal_next_line;
        return plan;
    }

    let before: String = line_text.chars().take(start.column).collect();
    let indent = leading_whitespace(&before);
    let unit = context.settings.indent.unit();
    let indent_len = indent.chars().count();
    let unit_len = unit.chars().count();

    let last_before = before.trim_end().chars().last();
    let opens_block = last_before.is_some_and(|c| matches!(c, '{' | '(' | '['));
    let adjacent_pair = start == end
        && before.chars().last().zip(buffer.char_at(end)).is_some_and(
            |(open, close)| is_bracket_pair(open, close),
        );

    let (text, cursor) = if adjacent_pair {
        (
            format!("\n{indent}{unit}\n{indent}"),
            Position::new(start.line + 1, indent_len + unit_len),
        )
    } else if opens_block {
        (
            format!("\n{indent}{unit}"),
            Position::new(start.line + 1, indent_len + unit_len),
        )
    } else {
        (
            format!("\n{indent}"),
            Position::new(start.line + 1, indent_len),
        )
    };

    let mut plan = KeyPlan::edit(PlannedEdit { start, end, text }, cursor);
    plan.reveal_next_line = reveal_next_line;
    plan
}

/// Lines covered by a selection; a selection ending at column 0 does not include that line.
fn selected_lines(selection: &Selection) -> (usize, usize) {
    let last = if selection.end.column == 0 && selection.end.line > selection.start.line {
        selection.end.line - 1
    } else {
        selection.end.line
    };
    (selection.start.line, last)
}

fn plan_indent(context: &KeyContext<'_>, indent: bool) -> KeyPlan {
    let buffer = context.buffer;
    let unit = context.settings.indent.unit();
    let unit_len = unit.chars().count();

    let selection = context.selection.filter(|s| !s.is_empty());
    let Some(selection) = selection else {
        let cursor = context.cursor;
        if indent {
            return KeyPlan::edit(
                PlannedEdit::insert(cursor, unit),
                Position::new(cursor.line, cursor.column + unit_len),
            );
        }
        let previous = cursor
            .column
            .checked_sub(1)
            .and_then(|column| buffer.char_at(Position::new(cursor.line, column)));
        return match previous {
            Some(' ' | '\t') => {
                let start = Position::new(cursor.line, cursor.column - 1);
                KeyPlan::edit(
                    PlannedEdit {
                        start,
                        end: cursor,
                        text: String::new(),
                    },
                    start,
                )
            }
            _ => KeyPlan::move_to(cursor),
        };
    };

    let (first, last) = selected_lines(selection);
    let mut edits = Vec::new();
    let mut last_len = buffer.line_len(last);
    for line in first..=last {
        let removed = if indent {
            edits.push(PlannedEdit::insert(Position::new(line, 0), unit.clone()));
            0
        } else {
            let text = buffer.line_text(line).unwrap_or_default();
            let removed = if text.starts_with('\t') {
                1
            } else {
                text.chars()
                    .take(context.settings.indent.width.max(1))
                    .take_while(|c| *c == ' ')
                    .count()
            };
            if removed > 0 {
                edits.push(PlannedEdit {
                    start: Position::new(line, 0),
                    end: Position::new(line, removed),
                    text: String::new(),
                });
            }
            removed
        };
        if line == last {
            last_len = if indent {
                last_len + unit_len
            } else {
                last_len - removed
            };
        }
    }

    let cursor = Position::new(last, last_len);
    KeyPlan {
        edits,
        cursor,
        selection: Some(Selection::new(Position::new(first, 0), cursor)),
        skip_over: None,
        reveal_next_line: false,
    }
}

fn plan_home(context: &KeyContext<'_>, select: bool) -> KeyPlan {
    let cursor = context.cursor;
    let text = context.buffer.line_text(cursor.line).unwrap_or_default();
    let first_text = leading_whitespace(&text).chars().count();
    let target = Position::new(
        cursor.line,
        if cursor.column == first_text {
            0
        } else {
            first_text
        },
    );

    let mut plan = KeyPlan::move_to(target);
    if select {
        let anchor = context
            .selection
            .filter(|s| !s.is_empty())
            .map(Selection::anchor)
            .unwrap_or(cursor);
        plan.selection = Some(Selection::new(anchor, target));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(text: &str, cursor: Position, input: KeyInput) -> KeyPlan {
        let buffer = Buffer::new(text);
        let settings = EditorSettings::default();
        let context = KeyContext {
            buffer: &buffer,
            cursor,
            selection: None,
            settings: &settings,
            skip_over: None,
        };
        plan_key(&context, &input)
    }

    #[test]
    fn test_open_paren_at_end_of_line_pairs() {
        let plan = plan("f", Position::new(0, 1), KeyInput::Char('('));
        assert_eq!(plan.edits[0].text, "()");
        assert_eq!(plan.cursor, Position::new(0, 2));
        assert_eq!(plan.skip_over, Some(')'));
    }

    #[test]
    fn test_no_pair_before_word() {
        let plan = plan("x", Position::new(0, 0), KeyInput::Char('('));
        assert_eq!(plan.edits[0].text, "(");
        assert_eq!(plan.skip_over, None);
    }

    #[test]
    fn test_skip_over_requires_matching_char_at_cursor() {
        let buffer = Buffer::new("f()");
        let settings = EditorSettings::default();
        let mut context = KeyContext {
            buffer: &buffer,
            cursor: Position::new(0, 2),
            selection: None,
            settings: &settings,
            skip_over: Some(')'),
        };
        let skipped = plan_key(&context, &KeyInput::Char(')'));
        assert!(!skipped.has_edits());
        assert_eq!(skipped.cursor, Position::new(0, 3));

        context.cursor = Position::new(0, 1);
        let typed = plan_key(&context, &KeyInput::Char(')'));
        assert_eq!(typed.edits[0].text, ")");
        assert_eq!(typed.skip_over, None);
    }

    #[test]
    fn test_enter_between_braces_splits() {
        let plan = plan("if (x) {}", Position::new(0, 8), KeyInput::Enter);
        assert_eq!(plan.edits[0].text, "\n\t\n");
        assert_eq!(plan.cursor, Position::new(1, 1));
    }

    #[test]
    fn test_enter_copies_mixed_indent_and_indents_after_open() {
        let plan = plan(" \tx := f(", Position::new(0, 9), KeyInput::Enter);
        assert_eq!(plan.edits[0].text, "\n \t\t");
        assert_eq!(plan.cursor, Position::new(1, 3));

        let plan = self::plan("\tx()", Position::new(0, 4), KeyInput::Enter);
        assert_eq!(plan.edits[0].text, "\n\t");
    }

    #[test]
    fn test_enter_ignores_trailing_whitespace_after_open() {
        let plan = plan("func f() {  ", Position::new(0, 12), KeyInput::Enter);
        assert_eq!(plan.edits[0].text, "\n\t");
    }

    #[test]
    fn test_backtab_removes_previous_whitespace() {
        let plan = plan("\t\tx", Position::new(0, 2), KeyInput::Backtab);
        assert_eq!(plan.edits[0].start, Position::new(0, 1));
        assert_eq!(plan.cursor, Position::new(0, 1));

        let plan = self::plan("ab", Position::new(0, 2), KeyInput::Backtab);
        assert!(!plan.has_edits());
    }

    #[test]
    fn test_tab_indents_selected_lines() {
        let buffer = Buffer::new("a\nb\nc");
        let settings = EditorSettings::default();
        let selection = Selection::new(Position::new(0, 1), Position::new(2, 0));
        let context = KeyContext {
            buffer: &buffer,
            cursor: Position::new(2, 0),
            selection: Some(&selection),
            settings: &settings,
            skip_over: None,
        };
        let plan = plan_key(&context, &KeyInput::Tab);
        assert_eq!(plan.edits.len(), 2);
        assert_eq!(plan.cursor, Position::new(1, 2));
        assert_eq!(
            plan.selection,
            Some(Selection::new(Position::new(0, 0), Position::new(1, 2)))
        );
    }

    #[test]
    fn test_smart_home_toggles() {
        let plan = plan("\t\tx", Position::new(0, 3), KeyInput::Home { select: false });
        assert_eq!(plan.cursor, Position::new(0, 2));
        let plan = self::plan("\t\tx", Position::new(0, 2), KeyInput::Home { select: false });
        assert_eq!(plan.cursor, Position::new(0, 0));
        let plan = self::plan("\t\tx", Position::new(0, 3), KeyInput::Home { select: true });
        assert_eq!(
            plan.selection,
            Some(Selection::new(Position::new(0, 3), Position::new(0, 2)))
        );
    }
}
