use lite_editor_core::{
    Command, CommandExecutor, CommandResult, EditCommand, EditNotification, EditorStateManager,
    FoldCommand, FoldMarker, GutterMetrics, KeyInput, MarkKind, ModificationState, Position,
    SimpleMark, StateChangeType, TextMark, ViewCommand,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn numbered(count: usize) -> String {
    (1..=count)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_150_lines_use_three_digits() {
    let executor = CommandExecutor::new(&numbered(150));
    let gutter = executor.editor().gutter(0, 150);
    assert_eq!(gutter.digits, 3);
    assert_eq!(gutter.lines[0].number.as_deref(), Some("  1"));
    assert_eq!(gutter.lines[149].number.as_deref(), Some("150"));
    assert_eq!(executor.editor().extra_gutter_width(), 8 * 3 + 16 + 9 + 2);

    let small = CommandExecutor::new(&numbered(99));
    assert_eq!(small.editor().gutter(0, 1).digits, 2);
}

#[test]
fn test_get_gutter_command_paints_visible_rows() {
    let mut executor = CommandExecutor::new("func f() {\n\tx\n}\ny");
    executor
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 0 }))
        .unwrap();
    let result = executor
        .execute(Command::View(ViewCommand::GetGutter {
            start_row: 0,
            count: 10,
        }))
        .unwrap();
    let CommandResult::Gutter(gutter) = result else {
        panic!("expected gutter rows");
    };
    let lines: Vec<usize> = gutter.lines.iter().map(|l| l.line).collect();
    assert_eq!(lines, vec![0, 3]);
    assert_eq!(gutter.lines[0].fold_marker, FoldMarker::Collapsed);
    assert!(gutter.lines[0].is_current);
}

#[test]
fn test_terminal_metrics_width() {
    let mut executor = CommandExecutor::new(&numbered(1200));
    executor.editor_mut().gutter_metrics = GutterMetrics::terminal();
    // 4 digits + mark column + fold box
    assert_eq!(executor.editor().extra_gutter_width(), 4 + 1 + 2);
}

#[test]
fn test_marks_follow_their_line() {
    let mut executor = CommandExecutor::new("a\nb\nc");
    let breakpoint: Arc<dyn TextMark> = SimpleMark::with_tooltip(MarkKind::Breakpoint, "stop");
    assert!(executor.attach_mark(2, &breakpoint));

    executor
        .execute(Command::Edit(EditCommand::Insert {
            offset: 0,
            text: "\n".to_string(),
        }))
        .unwrap();
    assert_eq!(executor.editor().buffer.lines_with_mark(&breakpoint), vec![3]);

    let gutter = executor.editor().gutter(0, 4);
    assert_eq!(gutter.lines[3].marks[0].tooltip.as_deref(), Some("stop"));

    // Joining the line into its predecessor carries the mark along.
    let offset = executor
        .editor()
        .buffer
        .position_to_offset(Position::new(2, 1));
    executor
        .execute(Command::Edit(EditCommand::Delete {
            start: offset,
            length: 1,
        }))
        .unwrap();
    assert_eq!(executor.editor().buffer.lines_with_mark(&breakpoint), vec![2]);

    drop(breakpoint);
    assert!(executor.editor().gutter(0, 3).lines[2].marks.is_empty());
}

#[test]
fn test_modification_bars_around_save() {
    let mut manager = EditorStateManager::new("a\nb\nc");
    manager.execute(Command::Key(KeyInput::Char('x'))).unwrap();
    let states = |manager: &EditorStateManager| -> Vec<ModificationState> {
        manager
            .get_gutter(0, 3)
            .lines
            .iter()
            .map(|l| l.modification)
            .collect()
    };
    assert_eq!(
        states(&manager),
        vec![
            ModificationState::Modified,
            ModificationState::Clean,
            ModificationState::Clean
        ]
    );

    manager.mark_saved();
    assert_eq!(
        states(&manager),
        vec![
            ModificationState::SavedModified,
            ModificationState::Clean,
            ModificationState::Clean
        ]
    );
    assert!(!manager.get_document_state().is_modified);
}

#[test]
fn test_subscribers_see_edit_notifications() {
    let mut manager = EditorStateManager::new("func f() {}");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    manager.subscribe(move |change| {
        sink.lock()
            .unwrap()
            .push((change.change_type, change.edit));
    });

    manager
        .execute(Command::Cursor(
            lite_editor_core::CursorCommand::MoveTo {
                line: 0,
                column: 10,
            },
        ))
        .unwrap();
    manager.execute(Command::Key(KeyInput::Enter)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], (StateChangeType::CursorMoved, None));
    assert_eq!(
        seen[1],
        (
            StateChangeType::DocumentModified,
            Some(EditNotification::new(0, 0, 2))
        )
    );
    assert_eq!(seen[2], (StateChangeType::CursorMoved, None));
    assert_eq!(manager.version(), 3);
}

#[test]
fn test_full_state_snapshot() {
    let mut manager = EditorStateManager::new("func f() {\n\tx\n}\n");
    manager
        .execute(Command::Fold(FoldCommand::FoldCurrent))
        .unwrap();
    let state = manager.get_full_state();
    assert_eq!(state.document.line_count, 4);
    assert_eq!(state.folding.regions.len(), 1);
    assert_eq!(state.folding.visible_logical_lines, 2);
    assert_eq!(state.cursor.position, Position::new(0, 0));
    assert!(!state.navigation.can_go_back);
    assert_eq!(state.viewport.visible_lines, 0..4);
}
