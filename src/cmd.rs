//! Command implementations for the CLI interface.
//!
//! Each handler loads nothing itself: it receives the current `TaskList` and
//! the `TaskStore` it came from, dispatches a `Command` against the list and
//! persists the result. Output goes to the supplied writer so handlers can be
//! exercised against a buffer.

use std::io::{self, Write};

use chrono::Utc;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use thiserror::Error;

use crate::config::Config;
use crate::fields::{Filter, Priority, SortMode};
use crate::list::{Command, LookupError, TaskList};
use crate::storage::{KeyValueStore, TaskStore};
use crate::task::Task;
use crate::validation::ValidationError;
use crate::view::{format_age, project, truncate, EmptyState, Stats};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive UI.
    Ui,

    /// Add a new task.
    Add {
        /// Task text, 3 to 100 characters. Multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Priority: low | medium | high (default from config).
        #[arg(long, short, value_enum)]
        priority: Option<Priority>,
    },

    /// List tasks.
    List {
        /// Which tasks to show: all | active | completed.
        #[arg(long, short, value_enum)]
        filter: Option<Filter>,
        /// Order: date | alphabetical | priority.
        #[arg(long, short, value_enum)]
        sort: Option<SortMode>,
    },

    /// Flip a task between open and completed.
    Toggle {
        /// Task id or unique id prefix.
        id: String,
    },

    /// Delete a task.
    Delete {
        /// Task id or unique id prefix.
        id: String,
    },

    /// Delete every completed task.
    ClearCompleted,

    /// Show task counts and completion.
    Stats,

    /// Remove the stored task list entirely.
    Reset,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Failures reported to the CLI user.
#[derive(Debug, Error)]
pub enum CmdError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Apply `command` to `list` and persist the result.
///
/// A rejected command leaves both the list and the store untouched.
pub fn dispatch<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    list: &TaskList,
    command: &Command,
) -> Result<TaskList, ValidationError> {
    let next = list.apply(command)?;
    if next != *list {
        store.save(next.tasks());
    }
    tracing::info!(?command, before = list.len(), after = next.len(), "applied command");
    Ok(next)
}

/// Add a new task.
pub fn cmd_add<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    list: &TaskList,
    text: &[String],
    priority: Option<Priority>,
    config: &Config,
    out: &mut impl Write,
) -> Result<TaskList, CmdError> {
    let command = Command::Add {
        text: text.join(" "),
        priority: priority.unwrap_or(config.default_priority),
    };
    let next = dispatch(store, list, &command)?;
    if let Some(task) = next.tasks().first() {
        writeln!(out, "Added task {}", task.short_id())?;
    }
    Ok(next)
}

/// List tasks with the given filter and sort mode.
pub fn cmd_list(
    list: &TaskList,
    filter: Option<Filter>,
    sort: Option<SortMode>,
    config: &Config,
    out: &mut impl Write,
) -> Result<(), CmdError> {
    let filter = filter.unwrap_or(config.default_filter);
    let sort = sort.unwrap_or(config.default_sort);
    let shown = project(list.tasks(), filter, sort);

    if let Some(empty) = EmptyState::for_view(list.len(), shown.len(), filter) {
        writeln!(out, "{}", empty.title())?;
        writeln!(out, "{}", empty.message())?;
    } else {
        print_table(&shown, out)?;
    }
    writeln!(out)?;
    writeln!(out, "{}", Stats::of(list.tasks()).summary())?;
    Ok(())
}

/// Print tasks in a formatted table.
pub fn print_table(tasks: &[&Task], out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<9} {:<4} {:<7} {:<9} {}",
        "ID", "Done", "Pri", "Age", "Text"
    )?;
    let now = Utc::now();
    for t in tasks {
        writeln!(
            out,
            "{:<9} {:<4} {:<7} {:<9} {}",
            t.short_id(),
            if t.completed { "[x]" } else { "[ ]" },
            t.priority.to_string(),
            format_age(t.created_at, now),
            truncate(&t.text, 60)
        )?;
    }
    Ok(())
}

/// Toggle completion of the task addressed by `id`.
pub fn cmd_toggle<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    list: &TaskList,
    id: &str,
    out: &mut impl Write,
) -> Result<TaskList, CmdError> {
    let id = list.resolve_id(id)?;
    let next = dispatch(store, list, &Command::Toggle(id.clone()))?;
    if let Some(task) = next.get(&id) {
        let state = if task.completed { "completed" } else { "reopened" };
        writeln!(out, "Task {} {}", task.short_id(), state)?;
    }
    Ok(next)
}

/// Delete the task addressed by `id`.
pub fn cmd_delete<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    list: &TaskList,
    id: &str,
    out: &mut impl Write,
) -> Result<TaskList, CmdError> {
    let id = list.resolve_id(id)?;
    let short_id = list.get(&id).map(|t| t.short_id().to_string()).unwrap_or_default();
    let next = dispatch(store, list, &Command::Remove(id))?;
    writeln!(out, "Deleted task {short_id}")?;
    Ok(next)
}

/// Delete all completed tasks.
pub fn cmd_clear_completed<S: KeyValueStore>(
    store: &mut TaskStore<S>,
    list: &TaskList,
    out: &mut impl Write,
) -> Result<TaskList, CmdError> {
    if !list.has_completed() {
        writeln!(out, "No completed tasks.")?;
        return Ok(list.clone());
    }
    let next = dispatch(store, list, &Command::ClearCompleted)?;
    writeln!(out, "Cleared {} completed task(s).", list.len() - next.len())?;
    Ok(next)
}

/// Print counts and completion percentage.
pub fn cmd_stats(list: &TaskList, out: &mut impl Write) -> Result<(), CmdError> {
    let stats = Stats::of(list.tasks());
    writeln!(out, "{}", stats.summary())?;
    writeln!(out, "{}% complete", stats.completion_percent())?;
    Ok(())
}

/// Remove the stored entry.
pub fn cmd_reset<S: KeyValueStore>(store: &mut TaskStore<S>, out: &mut impl Write) -> Result<(), CmdError> {
    store.clear();
    writeln!(out, "Task list cleared.")?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}
