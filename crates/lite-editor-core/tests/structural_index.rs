//! Delimiter index, fold index and brace matching under edits.
//!
//! The randomized test drives arbitrary insert/delete sequences through the command API and
//! compares the incrementally maintained metadata with a from-scratch rebuild after every step.

use lite_editor_core::brace_match::match_at;
use lite_editor_core::{
    Buffer, Command, CommandExecutor, CursorCommand, EditCommand, FoldCommand, MatchKind, Position,
    folding, visibility,
};
use pretty_assertions::assert_eq;
use rand::Rng;

const NESTED: &str = "package main\n\nfunc main() {\n\tif ok {\n\t\tx := []int{1, 2}\n\t}\n\ty()\n}\n\nfunc other() {\n\tz()\n}\n";

fn assert_index_matches_rebuild(buffer: &Buffer) {
    let fresh = Buffer::new(&buffer.text());
    assert_eq!(buffer.line_count(), fresh.line_count());
    for line in 0..buffer.line_count() {
        let incremental = buffer.metadata(line).unwrap();
        let rebuilt = fresh.metadata(line).unwrap();
        assert!(
            incremental.same_structure(rebuilt),
            "line {line} diverged: {incremental:?} vs {rebuilt:?}\ntext: {:?}",
            buffer.text()
        );
    }
    for line in 1..buffer.line_count() {
        assert_eq!(
            buffer.folding_indent(line),
            buffer.metadata(line - 1).unwrap().brace_depth_after
        );
    }
}

#[test]
fn test_matching_balanced_example() {
    let buffer = Buffer::new("if (a) { b(c[d]) }");
    for (open, close) in [(3, 5), (7, 17), (10, 15), (12, 14)] {
        let found = match_at(&buffer, Position::new(0, open)).unwrap();
        assert_eq!(found.kind, MatchKind::Matched, "open at {open}");
        assert_eq!(found.partner, Some(Position::new(0, close)));
    }

    let found = match_at(&buffer, Position::new(0, 18)).unwrap();
    assert_eq!(found.anchor, Position::new(0, 17));
    assert_eq!(found.partner, Some(Position::new(0, 7)));
}

#[test]
fn test_matching_corrupted_example() {
    let buffer = Buffer::new("if (a) { b(c[d]) )");

    let stray = match_at(&buffer, Position::new(0, 17)).unwrap();
    assert_eq!(stray.delimiter, ')');
    assert_eq!(stray.kind, MatchKind::Mismatched);

    let brace = match_at(&buffer, Position::new(0, 7)).unwrap();
    assert_eq!(brace.kind, MatchKind::Mismatched);

    // Inner pairs are untouched by the corruption.
    let bracket = match_at(&buffer, Position::new(0, 12)).unwrap();
    assert_eq!(bracket.partner, Some(Position::new(0, 14)));
}

#[test]
fn test_unclosed_brace_while_typing_is_not_a_mismatch() {
    let mut executor = CommandExecutor::new("func f() {\n\tx()");
    assert!(match_at(&executor.editor().buffer, Position::new(0, 9)).is_none());

    // Closing the body turns the same brace into a match.
    let end = executor.editor().char_count();
    executor
        .execute(Command::Edit(EditCommand::Insert {
            offset: end,
            text: "\n}".to_string(),
        }))
        .unwrap();
    let found = match_at(&executor.editor().buffer, Position::new(0, 9)).unwrap();
    assert_eq!(found.kind, MatchKind::Matched);
    assert_eq!(found.partner, Some(Position::new(2, 0)));
}

#[test]
fn test_quotes_do_not_change_depth() {
    let buffer = Buffer::new("s := \"x\" + 'y'\nt");
    assert_eq!(buffer.metadata(0).unwrap().delimiters.len(), 4);
    assert_eq!(buffer.folding_indent(1), 0);
    assert!(!folding::can_fold(&buffer, 0));
}

#[test]
fn test_recompute_is_idempotent() {
    let mut buffer = Buffer::new(NESTED);
    let first: Vec<_> = buffer.lines().map(|l| l.metadata().clone()).collect();
    buffer.rebuild_index();
    let second: Vec<_> = buffer.lines().map(|l| l.metadata().clone()).collect();
    assert_eq!(first, second);
}

#[test]
fn test_fold_regions_of_nested_source() {
    let buffer = Buffer::new(NESTED);
    let regions: Vec<(usize, usize)> = folding::regions(&buffer)
        .iter()
        .map(|r| (r.start_line, r.end_line))
        .collect();
    assert_eq!(regions, vec![(2, 7), (3, 5), (9, 11)]);
}

#[test]
fn test_fold_round_trip_restores_visible_lines() {
    let mut executor = CommandExecutor::new(NESTED);
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 3 }))
        .unwrap();
    let before: Vec<bool> = (0..executor.editor().line_count())
        .map(|l| executor.editor().is_line_visible(l))
        .collect();

    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 2 }))
        .unwrap();
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 2 }))
        .unwrap();

    let after: Vec<bool> = (0..executor.editor().line_count())
        .map(|l| executor.editor().is_line_visible(l))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_fold_safety_relocates_cursor() {
    let mut executor = CommandExecutor::new(NESTED);
    executor.editor_mut().cursor_position = Position::new(6, 2);
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 2 }))
        .unwrap();

    let cursor = executor.editor().cursor_position();
    assert_eq!(cursor.line, 2);
    assert!(executor.editor().is_line_visible(cursor.line));

    executor.execute(Command::Fold(FoldCommand::FoldAll)).unwrap();
    executor
        .execute(Command::Fold(FoldCommand::UnfoldAll))
        .unwrap();
    assert_eq!(
        executor.editor().visible_line_count(),
        executor.editor().line_count()
    );
}

#[test]
fn test_edit_above_collapsed_region_keeps_it_collapsed() {
    let mut executor = CommandExecutor::new(NESTED);
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 9 }))
        .unwrap();

    // Insert a line above the folded function; the fold follows its header.
    executor
        .execute(Command::Edit(EditCommand::Insert {
            offset: 0,
            text: "// header\n".to_string(),
        }))
        .unwrap();
    assert!(!executor.editor().is_line_visible(11));
    assert!(folding::is_collapsed(&executor.editor().buffer, 10));
}

#[test]
fn test_deleting_header_brace_drops_stale_fold() {
    let mut executor = CommandExecutor::new("func f() {\n\tx\n}\ny");
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 0 }))
        .unwrap();
    assert!(!executor.editor().is_line_visible(1));

    executor
        .execute(Command::Edit(EditCommand::Delete {
            start: 9,
            length: 1,
        }))
        .unwrap();
    assert_eq!(executor.editor().line_text(0).as_deref(), Some("func f() "));
    assert!(executor.editor().is_line_visible(1));
    assert!(executor.editor().fold_regions().is_empty());
}

#[test]
fn test_deleting_collapsed_block_does_not_fold_next_block() {
    let mut executor = CommandExecutor::new("func a() {\n\tx\n}\nfunc b() {\n\ty\n}");
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 0 }))
        .unwrap();
    executor
        .execute(Command::Cursor(CursorCommand::SetSelection {
            start: Position::new(0, 0),
            end: Position::new(3, 0),
        }))
        .unwrap();
    executor
        .execute(Command::Edit(EditCommand::Backspace))
        .unwrap();

    let editor = executor.editor();
    assert_eq!(editor.get_text(), "func b() {\n\ty\n}");
    assert!(!editor.buffer.line(0).unwrap().is_folded());
    assert!(!folding::is_collapsed(&editor.buffer, 0));
    assert_eq!(editor.visible_line_count(), 3);
    assert!((0..3).all(|line| editor.is_line_visible(line)));
}

#[test]
fn test_random_edits_keep_index_consistent() {
    const FRAGMENTS: [&str; 10] = ["{", "}", "(", ")", "[", "]", "\n", "x", "\"", "\t{\n}\n"];

    let mut executor = CommandExecutor::new(NESTED);
    let mut rng = rand::thread_rng();

    for step in 0..400 {
        let char_count = executor.editor().char_count();
        if char_count > 0 && rng.gen_bool(0.4) {
            let start = rng.gen_range(0..char_count);
            let length = rng.gen_range(1..=(char_count - start).min(6));
            executor
                .execute(Command::Edit(EditCommand::Delete { start, length }))
                .unwrap();
        } else {
            let offset = rng.gen_range(0..=char_count);
            let text = FRAGMENTS[rng.gen_range(0..FRAGMENTS.len())];
            executor
                .execute(Command::Edit(EditCommand::Insert {
                    offset,
                    text: text.to_string(),
                }))
                .unwrap();
        }

        if step % 7 == 0 {
            let line = rng.gen_range(0..executor.editor().line_count());
            executor
                .execute(Command::Fold(FoldCommand::ToggleFold { line }))
                .unwrap();
        }

        let buffer = &executor.editor().buffer;
        assert_index_matches_rebuild(buffer);

        // Visibility is always what the fold flags say it is.
        let mut rebuilt = buffer.clone();
        assert!(!visibility::rebuild(&mut rebuilt));

        let cursor = executor.editor().cursor_position();
        assert!(executor.editor().is_line_visible(cursor.line));
    }
}
