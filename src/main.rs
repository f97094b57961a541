//! # tl - personal task list
//!
//! A small task list for the terminal: add short tasks with a priority, mark
//! them done, filter and sort the view, and clear what is finished. State is
//! kept in a local key-value store so the list survives restarts.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the interactive UI
//! tl
//!
//! # Add a task from the shell
//! tl add "Renew passport" --priority high
//!
//! # Show open tasks, highest priority first
//! tl list --filter active --sort priority
//!
//! # Toggle or delete by id prefix (shown by `tl list`)
//! tl toggle 0190f3a2
//! tl delete 0190f3a2
//! ```
//!
//! Tasks are stored as JSON in `<data dir>/tasklist/task-list.json`. Storage is
//! best effort: an unreadable file is treated as an empty list and a failed
//! write is logged and dropped.

use std::io;
use std::path::Path;
use std::process;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod fields;
pub mod list;
pub mod storage;
pub mod task;
pub mod validation;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::Config;
use list::TaskList;
use storage::{FileStore, TaskStore};

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            cli.data_dir
                .as_deref()
                .map(Config::with_data_dir)
                .unwrap_or_default()
        }
    };

    // Logs go to a file; the UI owns the terminal.
    let log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());
    tracing::debug!(data_dir = %config.data_dir.display(), "resolved configuration");

    let code = run(cli.command.unwrap_or(Commands::Ui), &config);
    drop(log_guard);
    process::exit(code);
}

/// Run one command and return the process exit status.
fn run(command: Commands, config: &Config) -> i32 {
    let open = || {
        let store = TaskStore::new(FileStore::new(&config.data_dir));
        let list = TaskList::new(store.load());
        (store, list)
    };
    let mut out = io::stdout().lock();

    let result = match command {
        Commands::Ui => {
            if let Err(e) = tui::run::run_tui(config) {
                eprintln!("UI error: {e}");
                return 1;
            }
            Ok(())
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
        Commands::Add { text, priority } => {
            let (mut store, list) = open();
            cmd_add(&mut store, &list, &text, priority, config, &mut out).map(drop)
        }
        Commands::List { filter, sort } => {
            let (_, list) = open();
            cmd_list(&list, filter, sort, config, &mut out)
        }
        Commands::Toggle { id } => {
            let (mut store, list) = open();
            cmd_toggle(&mut store, &list, &id, &mut out).map(drop)
        }
        Commands::Delete { id } => {
            let (mut store, list) = open();
            cmd_delete(&mut store, &list, &id, &mut out).map(drop)
        }
        Commands::ClearCompleted => {
            let (mut store, list) = open();
            cmd_clear_completed(&mut store, &list, &mut out).map(drop)
        }
        Commands::Stats => {
            let (_, list) = open();
            cmd_stats(&list, &mut out)
        }
        Commands::Reset => {
            let (mut store, _) = open();
            cmd_reset(&mut store, &mut out)
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::warn!(error = %e, "command failed");
            eprintln!("{e}");
            1
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklist.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
