//! TUI 编辑器演示
//!
//! 使用 crossterm 和 ratatui 构建的终端编辑器，展示 `lite-editor-core` 的结构化编辑能力：
//! 行号槽（gutter）、修改标记、折叠、括号匹配、自动缩进与自动配对、跳转历史。
//!
//! # 用法
//!
//! ```bash
//! cargo run -p lite-tui -- <file_path> [--settings <settings.json>]
//! ```
//!
//! `--settings` 指向一个 JSON 文件（字段见 `EditorSettings`），缺省字段使用默认值。
//! 日志写入 `$LITE_TUI_LOG_DIR`（默认是临时目录下的 `lite-tui/logs`），级别由 `RUST_LOG` 控制。
//!
//! # 快捷键
//!
//! - 方向键: 移动光标（按可见行移动，跳过折叠区域）
//! - Shift+方向键 / Shift+Home / Shift+End: 选择文本
//! - Home: 智能行首（在缩进末尾与行首之间切换）
//! - End: 行尾
//! - PageUp/PageDown: 翻页
//! - Tab / Shift+Tab: 缩进 / 反缩进（有选区时作用于所有选中行）
//! - Enter: 换行并自动缩进
//! - Ctrl+S: 保存文件
//! - Ctrl+Q / Ctrl+X: 退出
//! - Ctrl+L: 折叠/展开当前行
//! - Ctrl+K: 全部折叠
//! - Ctrl+U: 展开所有折叠
//! - Ctrl+B: 跳到匹配的括号
//! - Ctrl+E: 选择当前块
//! - Ctrl+D: 删除当前行
//! - Ctrl+G: 跳转到行
//! - Ctrl+Up / Ctrl+Down: 上一个 / 下一个顶层块
//! - Alt+Left / Alt+Right: 后退 / 前进
//! - F2: 切换书签
//! - Backspace/Delete: 删除字符

mod logging;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use lite_editor_core::{
    Command, CommandError, CommandResult, CursorCommand, EditCommand, EditorSettings,
    EditorStateManager, FoldCommand, FoldMarker, GutterLine, GutterMetrics, HighlightKind,
    KeyInput, MarkKind, ModificationState, Position, Selection, SimpleMark, TextMark, ViewCommand,
    layout::cell_width_at,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    fs,
    io::{self, stdout},
    path::PathBuf,
    process,
    sync::Arc,
    time::Duration,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    GotoLine,
}

/// 命令行参数
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 要编辑的文件（不存在时新建）
    file_path: PathBuf,
    /// 编辑器设置 JSON 文件
    #[arg(long = "settings", value_name = "SETTINGS_JSON")]
    settings_path: Option<PathBuf>,
}

/// 应用状态
struct App {
    /// 状态管理器
    state_manager: EditorStateManager,
    /// 文件路径
    file_path: PathBuf,
    /// 是否需要退出
    should_quit: bool,
    /// 确认退出模式（如果有未保存修改）
    confirm_quit: bool,
    /// 状态消息
    status_message: String,
    /// 当前输入模式
    input_mode: InputMode,
    /// 输入缓冲区（跳转行号 prompt）
    input_buffer: String,
    /// 书签；行上只保存弱引用，这里持有所有权
    bookmarks: Vec<Arc<dyn TextMark>>,
    /// 文本区宽度（单元格，不含 gutter），渲染时更新
    text_width: usize,
}

impl App {
    /// 创建新的应用实例
    fn new(file_path: PathBuf, settings: EditorSettings) -> io::Result<Self> {
        // 读取文件内容（如果存在）
        let content = if file_path.exists() {
            fs::read_to_string(&file_path)?
        } else {
            String::new()
        };

        let mut state_manager = EditorStateManager::with_settings(&content, settings);
        state_manager.editor_mut().gutter_metrics = GutterMetrics::terminal();

        state_manager.subscribe(|change| {
            tracing::trace!(
                change = ?change.change_type,
                version = change.new_version,
                edit = ?change.edit,
                "state changed"
            );
        });

        tracing::info!(
            path = %file_path.display(),
            lines = state_manager.editor().line_count(),
            "file opened"
        );

        Ok(Self {
            state_manager,
            file_path,
            should_quit: false,
            confirm_quit: false,
            status_message: String::new(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            bookmarks: Vec::new(),
            text_width: 0,
        })
    }

    /// 执行命令；失败时显示在状态行
    fn execute(&mut self, command: Command) -> Option<CommandResult> {
        match self.state_manager.execute(command) {
            Ok(result) => Some(result),
            Err(err) => self.report(err),
        }
    }

    fn report(&mut self, err: CommandError) -> Option<CommandResult> {
        tracing::warn!(error = %err, "command failed");
        self.status_message = format!("错误: {}", err);
        None
    }

    fn cursor(&self) -> Position {
        self.state_manager.editor().cursor_position()
    }

    fn line_len(&self, line: usize) -> usize {
        self.state_manager
            .editor()
            .line_text(line)
            .map(|text| text.chars().count())
            .unwrap_or(0)
    }

    /// 处理键盘事件
    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // 确认退出模式
        if self.confirm_quit {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    if let Err(e) = self.save_file() {
                        self.status_message = format!("保存失败: {}", e);
                        self.confirm_quit = false;
                    } else {
                        self.should_quit = true;
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.should_quit = true;
                }
                KeyCode::Esc => {
                    self.confirm_quit = false;
                    self.status_message.clear();
                }
                _ => {}
            }
            return;
        }

        if self.input_mode != InputMode::Normal {
            self.handle_prompt_key(key);
            return;
        }

        self.status_message.clear();
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match (key.modifiers, key.code) {
            // Ctrl+S: 保存
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                if let Err(e) = self.save_file() {
                    self.status_message = format!("保存失败: {}", e);
                } else {
                    self.status_message = "已保存".to_string();
                }
            }
            // Ctrl+Q / Ctrl+X: 退出
            (KeyModifiers::CONTROL, KeyCode::Char('q') | KeyCode::Char('x')) => {
                if self.state_manager.get_document_state().is_modified {
                    self.confirm_quit = true;
                    self.status_message = "文件已修改，是否保存？".to_string();
                } else {
                    self.should_quit = true;
                }
            }
            // Ctrl+L: 折叠/展开当前行
            (KeyModifiers::CONTROL, KeyCode::Char('l')) => {
                let line = self.cursor().line;
                if self.state_manager.editor().can_fold(line) {
                    self.execute(Command::Fold(FoldCommand::ToggleFold { line }));
                } else {
                    self.status_message = "当前行不可折叠".to_string();
                }
            }
            (KeyModifiers::CONTROL, KeyCode::Char('k')) => {
                self.execute(Command::Fold(FoldCommand::FoldAll));
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                self.execute(Command::Fold(FoldCommand::UnfoldAll));
            }
            // Ctrl+B: 括号跳转
            (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
                if self.state_manager.get_cursor_state().brace_match.is_none() {
                    self.status_message = "光标旁没有括号".to_string();
                } else {
                    self.execute(Command::Cursor(CursorCommand::GotoMatchingDelimiter));
                }
            }
            (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
                self.execute(Command::Cursor(CursorCommand::SelectEnclosingBlock));
            }
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
                self.execute(Command::Edit(EditCommand::DeleteLine));
            }
            (KeyModifiers::CONTROL, KeyCode::Char('g')) => {
                self.input_mode = InputMode::GotoLine;
                self.input_buffer.clear();
            }
            (KeyModifiers::CONTROL, KeyCode::Up) => {
                self.execute(Command::Cursor(CursorCommand::GotoPrevBlock));
            }
            (KeyModifiers::CONTROL, KeyCode::Down) => {
                self.execute(Command::Cursor(CursorCommand::GotoNextBlock));
            }
            (KeyModifiers::ALT, KeyCode::Left) => {
                if self.state_manager.get_navigation_state().can_go_back {
                    self.execute(Command::Cursor(CursorCommand::NavigateBack));
                }
            }
            (KeyModifiers::ALT, KeyCode::Right) => {
                if self.state_manager.get_navigation_state().can_go_forward {
                    self.execute(Command::Cursor(CursorCommand::NavigateForward));
                }
            }
            (_, KeyCode::F(2)) => self.toggle_bookmark(),

            // 光标移动
            (_, KeyCode::Left) => self.move_cursor(0, -1, shift),
            (_, KeyCode::Right) => self.move_cursor(0, 1, shift),
            (_, KeyCode::Up) => self.move_cursor(-1, 0, shift),
            (_, KeyCode::Down) => self.move_cursor(1, 0, shift),
            (_, KeyCode::PageUp) => {
                let page = self.page_size() as isize;
                self.move_cursor(-page, 0, shift);
            }
            (_, KeyCode::PageDown) => {
                let page = self.page_size() as isize;
                self.move_cursor(page, 0, shift);
            }
            (_, KeyCode::Home) => {
                self.execute(Command::Key(KeyInput::Home { select: shift }));
            }
            (_, KeyCode::End) => {
                let line = self.cursor().line;
                let target = Position::new(line, self.line_len(line));
                self.move_to(target, shift);
            }

            // 编辑
            (_, KeyCode::Enter) => {
                self.execute(Command::Key(KeyInput::Enter));
            }
            (_, KeyCode::Tab) => {
                self.execute(Command::Key(KeyInput::Tab));
            }
            (_, KeyCode::BackTab) => {
                self.execute(Command::Key(KeyInput::Backtab));
            }
            (_, KeyCode::Backspace) => {
                self.execute(Command::Edit(EditCommand::Backspace));
            }
            (_, KeyCode::Delete) => {
                self.execute(Command::Edit(EditCommand::DeleteForward));
            }
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.execute(Command::Key(KeyInput::Char(c)));
            }
            (_, KeyCode::Esc) => {
                self.execute(Command::Cursor(CursorCommand::ClearSelection));
            }
            _ => {}
        }

        self.adjust_horizontal_scroll();
    }

    /// 跳转行号 prompt
    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let input = std::mem::take(&mut self.input_buffer);
                match input.trim().parse::<usize>() {
                    Ok(number) if number > 0 => {
                        self.execute(Command::Cursor(CursorCommand::GotoLine {
                            line: number - 1,
                            column: 0,
                            center: true,
                        }));
                        self.adjust_horizontal_scroll();
                    }
                    _ => self.status_message = format!("无效行号: {}", input),
                }
            }
            KeyCode::Backspace => {
                self.input_buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => self.input_buffer.push(c),
            _ => {}
        }
    }

    /// 处理粘贴
    fn handle_paste(&mut self, text: String) {
        if text.is_empty() {
            return;
        }
        self.execute(Command::Edit(EditCommand::InsertText { text }));
        self.adjust_horizontal_scroll();
    }

    /// 移动光标；`select` 时扩展选区
    fn move_cursor(&mut self, delta_line: isize, delta_column: isize, select: bool) {
        if !select {
            self.execute(Command::Cursor(CursorCommand::MoveBy {
                delta_line,
                delta_column,
            }));
            return;
        }

        // 扩展选区时自己算目标位置（同样按可见行移动）
        let editor = self.state_manager.editor();
        let cursor = editor.cursor_position();
        let target = if delta_line != 0 {
            let row = editor.visual_row_for_line(cursor.line).unwrap_or(0) as isize;
            let last_row = editor.visible_line_count().saturating_sub(1) as isize;
            let row = (row + delta_line).clamp(0, last_row) as usize;
            let line = editor.line_for_visual_row(row).unwrap_or(cursor.line);
            Position::new(line, cursor.column.min(self.line_len(line)))
        } else if delta_column < 0 && cursor.column == 0 {
            match cursor.line.checked_sub(1) {
                Some(line) => Position::new(line, self.line_len(line)),
                None => cursor,
            }
        } else if delta_column > 0 && cursor.column >= self.line_len(cursor.line) {
            if cursor.line + 1 < editor.line_count() {
                Position::new(cursor.line + 1, 0)
            } else {
                cursor
            }
        } else {
            let column = (cursor.column as isize + delta_column).max(0) as usize;
            Position::new(cursor.line, column)
        };
        self.move_to(target, true);
    }

    fn move_to(&mut self, target: Position, select: bool) {
        let command = if select {
            CursorCommand::ExtendSelection { to: target }
        } else {
            CursorCommand::MoveTo {
                line: target.line,
                column: target.column,
            }
        };
        self.execute(Command::Cursor(command));
    }

    fn page_size(&self) -> usize {
        self.state_manager
            .get_viewport_state()
            .height
            .unwrap_or(1)
            .saturating_sub(1)
            .max(1)
    }

    /// 在当前行切换书签
    fn toggle_bookmark(&mut self) {
        let line = self.cursor().line;
        let existing = self.bookmarks.iter().position(|mark| {
            self.state_manager
                .editor()
                .buffer
                .lines_with_mark(mark)
                .contains(&line)
        });

        match existing {
            Some(index) => {
                let mark = self.bookmarks.remove(index);
                self.state_manager.detach_mark(&mark);
                self.status_message = format!("已移除第 {} 行的书签", line + 1);
            }
            None => {
                let mark = SimpleMark::with_tooltip(MarkKind::Bookmark, format!("书签 {}", line + 1));
                if self.state_manager.attach_mark(line, &mark) {
                    self.bookmarks.push(mark);
                    self.status_message = format!("已在第 {} 行添加书签", line + 1);
                }
            }
        }
    }

    /// 保持光标在水平方向可见
    fn adjust_horizontal_scroll(&mut self) {
        if self.text_width == 0 {
            return;
        }
        let visual_x = self.state_manager.editor().cursor_visual_x();
        let scroll_left = self.state_manager.get_viewport_state().scroll_left;

        let mut target = scroll_left;
        if visual_x < scroll_left {
            target = visual_x;
        } else if visual_x >= scroll_left + self.text_width {
            target = visual_x + 1 - self.text_width;
        }
        if target != scroll_left {
            self.execute(Command::View(ViewCommand::SetScrollLeft { cells: target }));
        }
    }

    fn save_file(&mut self) -> io::Result<()> {
        let content = self.state_manager.editor().get_text();
        fs::write(&self.file_path, content)?;
        self.state_manager.mark_saved();
        tracing::info!(path = %self.file_path.display(), "file saved");
        Ok(())
    }

    /// 渲染 UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 创建布局
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // 编辑器区域
                Constraint::Length(1), // 状态行
                Constraint::Length(1), // 快捷键提示
            ])
            .split(size);

        // 视口信息（编辑区内侧，不包含边框）
        let editor_area = chunks[0];
        let viewport_height = editor_area.height.saturating_sub(2) as usize;
        let viewport_width = editor_area.width.saturating_sub(2) as usize;

        if viewport_height > 0
            && self.state_manager.get_viewport_state().height != Some(viewport_height)
        {
            self.execute(Command::View(ViewCommand::SetViewportHeight {
                height: viewport_height,
            }));
        }

        let gutter_width = self.state_manager.extra_gutter_width();
        let text_width = viewport_width.saturating_sub(gutter_width);
        if text_width != self.text_width {
            self.text_width = text_width;
            self.adjust_horizontal_scroll();
        }

        // 渲染编辑器内容
        self.render_editor(frame, editor_area);

        // 渲染状态行
        self.render_status_line(frame, chunks[1]);

        // 渲染快捷键提示
        self.render_shortcuts(frame, chunks[2]);
    }

    /// 渲染编辑器内容
    fn render_editor(&self, frame: &mut Frame, area: Rect) {
        let editor = self.state_manager.editor();
        let viewport = self.state_manager.get_viewport_state();
        let inner_height = area.height.saturating_sub(2) as usize;
        let tab_width = editor.settings().indent.width.max(1);
        let selection = editor.selection().copied();

        let gutter = self
            .state_manager
            .get_gutter(viewport.scroll_top, inner_height);

        let mut display_lines = Vec::with_capacity(inner_height);
        for gutter_line in &gutter.lines {
            let mut spans = gutter_spans(gutter_line, gutter.digits);

            let text = editor.line_text(gutter_line.line).unwrap_or_default();
            let highlights = editor.highlights().highlights_on_line(gutter_line.line);
            let style_at = |column: usize| {
                let mut style = Style::default().fg(Color::White);
                if let Some(selection) = &selection
                    && is_selected(selection, Position::new(gutter_line.line, column))
                {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                match highlights
                    .iter()
                    .find(|h| h.position.column == column)
                    .map(|h| h.kind)
                {
                    Some(HighlightKind::BraceMatch) => style
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                    Some(HighlightKind::BraceMismatch) => style.fg(Color::White).bg(Color::Red),
                    None => style,
                }
            };
            spans.extend(text_spans(
                &text,
                viewport.scroll_left,
                self.text_width,
                tab_width,
                style_at,
            ));

            if gutter_line.fold_marker == FoldMarker::Collapsed {
                spans.push(Span::styled(
                    " ...",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ));
            }
            display_lines.push(Line::from(spans));
        }

        let doc_state = self.state_manager.get_document_state();
        let title = format!(
            " {}{} ",
            self.file_path.display(),
            if doc_state.is_modified { " [+]" } else { "" }
        );
        let paragraph =
            Paragraph::new(display_lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);

        // 光标
        if self.input_mode == InputMode::Normal && !self.confirm_quit {
            let cursor = editor.cursor_position();
            if let Some(row) = editor.visual_row_for_line(cursor.line)
                && row >= viewport.scroll_top
                && row < viewport.scroll_top + inner_height
            {
                let visual_x = editor.cursor_visual_x();
                if visual_x >= viewport.scroll_left
                    && visual_x < viewport.scroll_left + self.text_width
                {
                    let x = area.x + 1 + (gutter.width + visual_x - viewport.scroll_left) as u16;
                    let y = area.y + 1 + (row - viewport.scroll_top) as u16;
                    frame.set_cursor_position((x, y));
                }
            }
        }
    }

    /// 渲染状态行
    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let status_text = if self.input_mode == InputMode::GotoLine {
            format!("跳转到行 > {}  (Enter=确定, Esc=取消)", self.input_buffer)
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let doc_state = self.state_manager.get_document_state();
            let cursor_state = self.state_manager.get_cursor_state();
            let folding = self.state_manager.get_folding_state();
            let brace = match cursor_state.brace_match {
                Some(m) if m.is_matched() => " | 括号:匹配",
                Some(_) => " | 括号:不匹配",
                None => "",
            };
            format!(
                "行:{} 列:{} | 总行数:{} 字符数:{} | 折叠:{}区 隐藏{}行{} | 版本:{}",
                cursor_state.position.line + 1,
                cursor_state.position.column + 1,
                doc_state.line_count,
                doc_state.char_count,
                folding.regions.iter().filter(|r| r.is_collapsed).count(),
                folding.collapsed_line_count,
                brace,
                doc_state.version
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

        frame.render_widget(status_line, area);
    }

    /// 渲染快捷键提示
    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let shortcuts = if self.confirm_quit {
            "Y:保存并退出  N:不保存退出  Esc:取消"
        } else {
            "Ctrl-S:保存  Ctrl-Q:退出  Ctrl-L/K/U:折叠/全折叠/全展开  Ctrl-B:括号  Ctrl-E:选块  Ctrl-G:跳转  Alt-←/→:后退/前进  F2:书签"
        };

        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));

        frame.render_widget(shortcuts_line, area);
    }
}

fn is_selected(selection: &Selection, position: Position) -> bool {
    selection.start <= position && position < selection.end
}

/// gutter 单元格：书签列 + 行号 + 修改标记 + 折叠框
fn gutter_spans(line: &GutterLine, digits: usize) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(4);

    let mark = match line.marks.last().map(|m| m.kind) {
        Some(MarkKind::Breakpoint) => Span::styled("●", Style::default().fg(Color::Red)),
        Some(MarkKind::Bookmark) => Span::styled("◆", Style::default().fg(Color::Cyan)),
        Some(MarkKind::ExecutionPoint) => Span::styled("▶", Style::default().fg(Color::Yellow)),
        Some(MarkKind::Error) => Span::styled("E", Style::default().fg(Color::LightRed)),
        Some(MarkKind::Warning) => Span::styled("W", Style::default().fg(Color::Yellow)),
        Some(MarkKind::Custom(_)) => Span::raw("*"),
        None => Span::raw(" "),
    };
    spans.push(mark);

    let mut number_style = Style::default().fg(Color::DarkGray);
    if line.is_current {
        number_style = number_style.fg(Color::White).add_modifier(Modifier::BOLD);
    }
    let number = line
        .number
        .clone()
        .unwrap_or_else(|| " ".repeat(digits));
    spans.push(Span::styled(number, number_style));

    let bar = match line.modification {
        ModificationState::Clean => Span::raw(" "),
        ModificationState::SavedModified => Span::styled("▎", Style::default().fg(Color::Green)),
        ModificationState::Modified => Span::styled("▎", Style::default().fg(Color::Red)),
    };
    spans.push(bar);

    let fold = match line.fold_marker {
        FoldMarker::None => " ",
        FoldMarker::Expanded => "-",
        FoldMarker::Collapsed => "+",
    };
    spans.push(Span::styled(fold, Style::default().fg(Color::DarkGray)));
    spans
}

/// 把一行文本切成 `[scroll_left, scroll_left + width)` 单元格范围内的 span
///
/// 制表符展开成空格；相邻且样式相同的字符合并到同一个 span。
fn text_spans(
    text: &str,
    scroll_left: usize,
    width: usize,
    tab_width: usize,
    style_at: impl Fn(usize) -> Style,
) -> Vec<Span<'static>> {
    let end = scroll_left + width;
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    let mut x = 0;

    for (column, ch) in text.chars().enumerate() {
        if x >= end {
            break;
        }
        let w = cell_width_at(ch, x, tab_width);
        let cell_start = x;
        x += w;
        if x <= scroll_left {
            continue;
        }

        let visible = x.min(end) - cell_start.max(scroll_left);
        let cell = if ch == '\t' || cell_start < scroll_left || x > end {
            " ".repeat(visible)
        } else {
            ch.to_string()
        };

        let style = style_at(column);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push_str(&cell);
    }

    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    spans
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let logging_guard = logging::init();

    let settings = match &args.settings_path {
        Some(path) => match EditorSettings::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                eprintln!("无法加载设置 {}: {}", path.display(), err);
                process::exit(1);
            }
        },
        None => EditorSettings::default(),
    };

    // 创建应用
    let mut app = App::new(args.file_path, settings)?;
    if let Some(guard) = &logging_guard {
        app.status_message = format!("日志目录: {}", guard.log_dir().display());
    }

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // 主循环
    let result = run_app(&mut terminal, &mut app);

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "event loop failed");
        eprintln!("错误: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        // 处理事件
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => {
                    app.handle_key_event(key);
                }
                Event::Paste(text) => {
                    app.handle_paste(text);
                }
                Event::Resize(_, _) => {
                    // 下一次 render 会重新设置视口高度
                }
                _ => {}
            }
        }
    }

    Ok(())
}
