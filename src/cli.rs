use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Personal task list backed by a local key-value store.
/// Runs the interactive UI when no subcommand is given.
#[derive(Parser, Debug)]
#[command(name = "tl", version, about = "Personal task list")]
pub struct Cli {
    /// Directory holding the task store (overrides the config file).
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to config file (default: `<config dir>/tasklist/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info", env = "TASKLIST_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/tasklist.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
