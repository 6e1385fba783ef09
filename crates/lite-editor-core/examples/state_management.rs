//! State management example
//!
//! Demonstrates how to drive `EditorStateManager` and read back folding, brace and gutter state.

use lite_editor_core::{
    Command, CursorCommand, EditorStateManager, FoldCommand, KeyInput, StateChangeType,
    ViewCommand,
};
use std::sync::{Arc, Mutex};

const SOURCE: &str = "package main\n\nfunc main() {\n\tif ok {\n\t\tprintln(\"hi\")\n\t}\n}\n";

fn main() {
    println!("=== 编辑器状态管理示例 ===\n");

    let mut manager = EditorStateManager::new(SOURCE);
    manager
        .execute(Command::View(ViewCommand::SetViewportHeight { height: 20 }))
        .unwrap();

    // 状态变更监听
    let change_count = Arc::new(Mutex::new(0));
    let change_count_clone = change_count.clone();
    manager.subscribe(move |change| {
        let mut count = change_count_clone.lock().unwrap();
        *count += 1;
        println!(
            "  状态变更 #{}: {:?} (版本: {} -> {})",
            count, change.change_type, change.old_version, change.new_version
        );
    });

    println!("1. 折叠区域：");
    for region in manager.get_folding_state().regions {
        println!(
            "  {}..={} {}",
            region.start_line + 1,
            region.end_line + 1,
            if region.is_collapsed { "(已折叠)" } else { "" }
        );
    }

    println!("\n2. 括号匹配：");
    manager
        .execute(Command::Cursor(CursorCommand::MoveTo { line: 2, column: 12 }))
        .unwrap();
    if let Some(brace) = manager.get_cursor_state().brace_match {
        println!("  {:?} -> {:?} ({:?})", brace.anchor, brace.partner, brace.kind);
    }

    println!("\n3. 在花括号后回车：");
    manager
        .execute(Command::Cursor(CursorCommand::MoveTo { line: 3, column: 8 }))
        .unwrap();
    manager.execute(Command::Key(KeyInput::Enter)).unwrap();
    println!("{}", manager.editor().get_text());

    println!("4. 折叠 main：");
    manager
        .execute(Command::Fold(FoldCommand::ToggleFold { line: 2 }))
        .unwrap();
    let folding = manager.get_folding_state();
    println!(
        "  可见行: {}，隐藏行: {}",
        folding.visible_logical_lines, folding.collapsed_line_count
    );

    println!("\n5. Gutter：");
    let gutter = manager.get_gutter(0, 20);
    for line in &gutter.lines {
        println!(
            "  {} {:?} {:?}",
            line.number.as_deref().unwrap_or(""),
            line.modification,
            line.fold_marker
        );
    }

    manager.mark_modified(StateChangeType::ViewportChanged);
    println!("\n共 {} 次状态变更", change_count.lock().unwrap());
}
