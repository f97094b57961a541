//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which holds the task list state,
//! handles key input, renders the interface, and persists every change
//! through its `TaskStore`.

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::cmd::dispatch;
use crate::config::Config;
use crate::fields::{Filter, Priority, SortMode};
use crate::list::{Command, TaskList};
use crate::storage::{KeyValueStore, TaskStore};
use crate::tui::{
    colors::{priority_color, DARK_GREEN, DARK_PURPLE, DARK_RED},
    enums::{AppState, ConfirmAction},
    task_form::TaskForm,
    utils::centered_rect,
};
use crate::validation::ValidationError;
use crate::view::{format_age, project, EmptyState, Stats};

/// Main application state for the terminal user interface.
///
/// `list` is only ever replaced by the result of dispatching a `Command`, and
/// every replacement is written through `store`.
pub struct App<S: KeyValueStore> {
    state: AppState,
    list: TaskList,
    store: TaskStore<S>,
    filter: Filter,
    sort: SortMode,
    table_state: TableState,
    /// Ids of the projected tasks, in display order.
    visible: Vec<String>,
    form: TaskForm,
    confirm_action: Option<ConfirmAction>,
    status_message: String,
    poll_timeout: Duration,
}

impl<S: KeyValueStore> App<S> {
    /// Create an App, loading the task list from `store`.
    pub fn new(store: TaskStore<S>, config: &Config) -> Self {
        let list = TaskList::new(store.load());
        let mut app = App {
            state: AppState::TaskList,
            list,
            store,
            filter: config.default_filter,
            sort: config.default_sort,
            table_state: TableState::default(),
            visible: Vec::new(),
            form: TaskForm::new(config.default_priority),
            confirm_action: None,
            status_message: String::new(),
            poll_timeout: config.poll_timeout,
        };
        app.update_visible();
        app
    }

    fn selected_id(&self) -> Option<&str> {
        self.table_state
            .selected()
            .and_then(|idx| self.visible.get(idx))
            .map(String::as_str)
    }

    /// Recompute the display list, keeping the selection on the same task when possible.
    fn update_visible(&mut self) {
        let old_idx = self.table_state.selected();
        let old_id = self.selected_id().map(str::to_string);

        self.visible = project(self.list.tasks(), self.filter, self.sort)
            .into_iter()
            .map(|t| t.id.clone())
            .collect();

        let new_idx = if self.visible.is_empty() {
            None
        } else if let Some(pos) = old_id.and_then(|id| self.visible.iter().position(|v| *v == id)) {
            Some(pos)
        } else {
            Some(old_idx.unwrap_or(0).min(self.visible.len() - 1))
        };
        self.table_state.select(new_idx);
    }

    fn select_id(&mut self, id: &str) {
        if let Some(pos) = self.visible.iter().position(|v| v == id) {
            self.table_state.select(Some(pos));
        }
    }

    /// Dispatch a command against the current list and persist the result.
    fn apply(&mut self, command: Command) -> Result<(), ValidationError> {
        self.list = dispatch(&mut self.store, &self.list, &command)?;
        self.update_visible();
        Ok(())
    }

    /// Apply a command whose only failure mode is validation of new text.
    fn apply_logged(&mut self, command: Command) {
        if let Err(e) = self.apply(command) {
            tracing::warn!(error = %e, "command rejected");
        }
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Handle one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.status_message.clear();
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.state {
            AppState::TaskList => self.handle_task_list_input(key),
            AppState::AddTask => {
                self.handle_form_input(key);
                false
            }
            AppState::Help => {
                if matches!(key, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
                    self.state = AppState::TaskList;
                }
                false
            }
            AppState::Confirm => {
                self.handle_confirm_input(key);
                false
            }
        }
    }

    fn handle_task_list_input(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.table_state.selected() {
                    self.table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.table_state.selected() {
                    if selected + 1 < self.visible.len() {
                        self.table_state.select(Some(selected + 1));
                    }
                }
            }
            KeyCode::Char('a') => {
                self.form.reset();
                self.state = AppState::AddTask;
            }
            KeyCode::Char(' ') | KeyCode::Char('c') => {
                if let Some(id) = self.selected_id().map(str::to_string) {
                    self.apply_logged(Command::Toggle(id.clone()));
                    let done = self.list.get(&id).is_some_and(|t| t.completed);
                    self.set_status_message(if done { "Task completed" } else { "Task reopened" });
                }
            }
            KeyCode::Char('d') => {
                let action = self
                    .selected_id()
                    .and_then(|id| self.list.get(id))
                    .map(|task| ConfirmAction::Delete {
                        id: task.id.clone(),
                        text: task.text.clone(),
                    });
                if action.is_some() {
                    self.confirm_action = action;
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('x') => {
                if self.list.has_completed() {
                    self.confirm_action = Some(ConfirmAction::ClearCompleted {
                        count: self.list.completed_count(),
                    });
                    self.state = AppState::Confirm;
                } else {
                    self.set_status_message("No completed tasks to clear");
                }
            }
            KeyCode::Char('f') => {
                self.filter = self.filter.next();
                self.update_visible();
                self.set_status_message(format!("Filter: {} ({} tasks)", self.filter, self.visible.len()));
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.next();
                self.update_visible();
                self.set_status_message(format!("Sort: {}", self.sort));
            }
            KeyCode::Char('r') => {
                self.list = TaskList::new(self.store.load());
                self.update_visible();
                self.set_status_message("Tasks reloaded");
            }
            KeyCode::Char('h') | KeyCode::Char('?') => {
                self.state = AppState::Help;
            }
            _ => {}
        }
        false
    }

    fn handle_form_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.state = AppState::TaskList;
            }
            KeyCode::Enter => match self.apply(self.form.command()) {
                Ok(()) => {
                    self.form.reset();
                    self.state = AppState::TaskList;
                    if let Some(id) = self.list.tasks().first().map(|t| t.id.clone()) {
                        self.select_id(&id);
                    }
                    self.set_status_message("Task added");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "rejected new task");
                    self.form.error = Some(e);
                }
            },
            KeyCode::Tab | KeyCode::Down => self.form.cycle_priority(true),
            KeyCode::BackTab | KeyCode::Up => self.form.cycle_priority(false),
            KeyCode::Left => self.form.text.move_cursor_left(),
            KeyCode::Right => self.form.text.move_cursor_right(),
            KeyCode::Home => self.form.text.move_cursor_home(),
            KeyCode::End => self.form.text.move_cursor_end(),
            KeyCode::Backspace => self.form.handle_backspace(),
            KeyCode::Delete => self.form.handle_delete(),
            KeyCode::Char(c) => self.form.handle_char(c),
            _ => {}
        }
    }

    fn handle_confirm_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                match self.confirm_action.take() {
                    Some(ConfirmAction::Delete { id, .. }) => {
                        self.apply_logged(Command::Remove(id));
                        self.set_status_message("Task deleted");
                    }
                    Some(ConfirmAction::ClearCompleted { count }) => {
                        self.apply_logged(Command::ClearCompleted);
                        self.set_status_message(format!("Cleared {count} completed task(s)"));
                    }
                    None => {}
                }
                self.state = AppState::TaskList;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_action = None;
                self.state = AppState::TaskList;
            }
            _ => {}
        }
    }

    /// Poll for and handle one keyboard event. Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(self.poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header_text = Line::from(vec![
            Span::styled("TASK LIST", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("Filter: {}  Sort: {}", self.filter, self.sort),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let header = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_task_list(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title(format!(
            "Tasks ({}/{}) - Press 'h' for help",
            self.visible.len(),
            self.list.len()
        ));

        if let Some(empty) = EmptyState::for_view(self.list.len(), self.visible.len(), self.filter) {
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(empty.title(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(empty.message()),
            ];
            let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
            f.render_widget(paragraph, area);
            return;
        }

        let header_cells = ["", "Priority", "Task", "Added"]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells)
            .style(Style::default().bg(DARK_PURPLE).fg(Color::White))
            .height(1);

        let now = Utc::now();
        let rows: Vec<Row> = self
            .visible
            .iter()
            .filter_map(|id| self.list.get(id))
            .map(|task| {
                let text_style = if task.completed {
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(if task.completed { "[x]" } else { "[ ]" }),
                    Cell::from(task.priority.to_string())
                        .style(Style::default().fg(priority_color(task.priority))),
                    Cell::from(task.text.clone()).style(text_style),
                    Cell::from(format_age(task.created_at, now)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(20),
            Constraint::Length(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_progress(&self, f: &mut Frame, area: Rect) {
        let stats = Stats::of(self.list.tasks());
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(stats.summary()))
            .gauge_style(Style::default().fg(DARK_GREEN))
            .percent(stats.completion_percent());
        f.render_widget(gauge, area);
    }

    fn render_form(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(70, 50, area);
        f.render_widget(Clear, area);
        let block = Block::default().borders(Borders::ALL).title("Add Task");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let text_width = chunks[0].width.saturating_sub(2) as usize;
        let scroll = self.form.text.scroll_offset(text_width);
        let input = Paragraph::new(self.form.text.value.as_str())
            .block(Block::default().borders(Borders::ALL).title("Task"))
            .scroll((0, scroll as u16));
        f.render_widget(input, chunks[0]);
        f.set_cursor_position((
            chunks[0].x + self.form.text.cursor.saturating_sub(scroll) as u16 + 1,
            chunks[0].y + 1,
        ));

        let mut feedback = vec![Span::raw(self.form.counter())];
        if let Some(err) = self.form.error {
            feedback.push(Span::raw("  "));
            feedback.push(Span::styled(err.to_string(), Style::default().fg(DARK_RED)));
        }
        f.render_widget(Paragraph::new(Line::from(feedback)), chunks[1]);

        let mut priorities = vec![Span::raw("Priority: ")];
        for p in Priority::ALL {
            let style = if p == self.form.priority {
                Style::default()
                    .fg(priority_color(p))
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(Color::Gray)
            };
            priorities.push(Span::styled(format!(" {p} "), style));
            priorities.push(Span::raw(" "));
        }
        f.render_widget(Paragraph::new(Line::from(priorities)), chunks[2]);

        f.render_widget(
            Paragraph::new("Enter add  Tab/↑↓ priority  Esc cancel")
                .style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = vec![
            Line::from(vec![Span::styled(
                "Task List Help",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from("  ↑/↓, k/j     Move selection"),
            Line::from("  a            Add new task"),
            Line::from("  Space/c      Toggle completed"),
            Line::from("  d            Delete selected task"),
            Line::from("  f            Cycle filter (All → Active → Completed)"),
            Line::from("  s            Cycle sort (Date → A-Z → Priority)"),
            Line::from("  x            Clear completed tasks"),
            Line::from("  r            Reload from storage"),
            Line::from("  h/?          Show this help"),
            Line::from("  q/Esc/Ctrl+C Quit"),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Add Task Form:",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from("  Enter        Add task (3-100 characters)"),
            Line::from("  Tab/↑/↓      Change priority"),
            Line::from("  Esc          Cancel"),
        ];

        let area = centered_rect(60, 70, area);
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press Esc to return"),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let description = self
            .confirm_action
            .as_ref()
            .map(ConfirmAction::describe)
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(description),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::TaskList => format!("Tasks: {} | Press 'h' for help", self.visible.len()),
                AppState::AddTask => "Add New Task".to_string(),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Action".to_string(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(DARK_PURPLE).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that lays out the screen and draws any overlay.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_task_list(f, chunks[1]);
        self.render_progress(f, chunks[2]);
        self.render_status_bar(f, chunks[3]);

        match self.state {
            AppState::TaskList => {}
            AppState::AddTask => self.render_form(f, chunks[1]),
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::Confirm => self.render_confirm(f, chunks[1]),
        }
    }

    /// Main event loop. Renders and handles input until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        tracing::info!(tasks = self.list.len(), "task list UI started");
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list::tests::task;
    use crate::storage::{MemoryStore, STORAGE_KEY};
    use ratatui::backend::TestBackend;

    fn app_with(tasks: Vec<crate::task::Task>) -> App<MemoryStore> {
        let mut store = TaskStore::new(MemoryStore::new());
        if !tasks.is_empty() {
            store.save(&tasks);
        }
        App::new(store, &Config::with_data_dir(std::path::Path::new("/unused")))
    }

    fn press(app: &mut App<MemoryStore>, keys: &str) {
        for c in keys.chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    fn key(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(code, KeyModifiers::NONE)
    }

    fn two_tasks() -> Vec<crate::task::Task> {
        vec![
            task("new", "Newer task", false, 2, Priority::Low),
            task("old", "Older task", true, 1, Priority::High),
        ]
    }

    #[test]
    fn test_add_task_through_form() {
        let mut app = app_with(Vec::new());
        press(&mut app, "a");
        assert_eq!(app.state, AppState::AddTask);
        press(&mut app, "Feed the cat");
        key(&mut app, KeyCode::Tab);
        key(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.list.len(), 1);
        let added = &app.list.tasks()[0];
        assert_eq!(added.text, "Feed the cat");
        assert_eq!(added.priority, Priority::High);
        assert_eq!(app.store.load(), app.list.tasks());
        assert_eq!(app.selected_id(), Some(added.id.as_str()));
    }

    #[test]
    fn test_invalid_text_keeps_form_open() {
        let mut app = app_with(Vec::new());
        press(&mut app, "aok");
        key(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert_eq!(app.form.error, Some(ValidationError::TooShort));
        assert!(app.list.is_empty());
        assert!(app.store.backend().get(STORAGE_KEY).unwrap().is_none());

        press(&mut app, "!");
        assert!(app.form.error.is_none());
    }

    #[test]
    fn test_toggle_selected() {
        let mut app = app_with(two_tasks());
        assert_eq!(app.selected_id(), Some("new"));
        press(&mut app, " ");
        assert!(app.list.get("new").unwrap().completed);
        assert_eq!(app.status_message, "Task completed");
        assert!(app.store.load()[0].completed);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_with(two_tasks());
        press(&mut app, "d");
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, "n");
        assert_eq!(app.list.len(), 2);

        press(&mut app, "dy");
        assert_eq!(app.state, AppState::TaskList);
        assert!(app.list.get("new").is_none());
        assert_eq!(app.selected_id(), Some("old"));
        assert_eq!(app.store.load().len(), 1);
    }

    #[test]
    fn test_clear_completed_gated_on_completed_tasks() {
        let mut app = app_with(vec![task("a", "Open task", false, 1, Priority::Low)]);
        press(&mut app, "x");
        assert_eq!(app.state, AppState::TaskList);
        assert_eq!(app.status_message, "No completed tasks to clear");

        let mut app = app_with(two_tasks());
        press(&mut app, "x");
        assert_eq!(
            app.confirm_action,
            Some(ConfirmAction::ClearCompleted { count: 1 })
        );
        press(&mut app, "y");
        assert_eq!(app.list.len(), 1);
        assert!(!app.list.has_completed());
    }

    #[test]
    fn test_filter_and_sort_cycling() {
        let mut app = app_with(two_tasks());
        press(&mut app, "f");
        assert_eq!(app.filter, Filter::Active);
        assert_eq!(app.visible, ["new"]);
        press(&mut app, "f");
        assert_eq!(app.visible, ["old"]);
        press(&mut app, "f");
        press(&mut app, "ss");
        assert_eq!(app.sort, SortMode::Priority);
        assert_eq!(app.visible, ["old", "new"]);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with(Vec::new());
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(key(&mut app, KeyCode::Esc));
        press(&mut app, "a");
        assert!(!key(&mut app, KeyCode::Esc));
        assert_eq!(app.state, AppState::TaskList);
    }

    fn rendered(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_long_input_scrolls_to_cursor() {
        let mut app = app_with(Vec::new());
        press(&mut app, "a");
        let text = format!("{}XYZ", "w".repeat(96));
        press(&mut app, &text);
        let screen = rendered(&mut app);
        assert!(screen.contains("wwwXYZ"));
    }

    #[test]
    fn test_render_empty_and_populated() {
        let mut app = app_with(Vec::new());
        assert!(rendered(&mut app).contains("No tasks yet"));

        let mut app = app_with(two_tasks());
        let screen = rendered(&mut app);
        assert!(screen.contains("Newer task"));
        assert!(screen.contains("2 total"));
    }
}
