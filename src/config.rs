//! Configuration for the task list.
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments
//! 2. TOML config file (`<config dir>/tasklist/config.toml`)
//! 3. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that cannot be read or parsed is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;
use crate::fields::{Filter, Priority, SortMode};

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Top-level TOML config file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    storage: StorageFileConfig,
    ui: UiFileConfig,
}

/// `[storage]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageFileConfig {
    data_dir: Option<PathBuf>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UiFileConfig {
    default_priority: Option<Priority>,
    default_filter: Option<Filter>,
    default_sort: Option<SortMode>,
    poll_timeout_ms: Option<u64>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the task store.
    pub data_dir: PathBuf,
    /// Priority preselected in the add form.
    pub default_priority: Priority,
    pub default_filter: Filter,
    pub default_sort: SortMode,
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_priority: Priority::Medium,
            default_filter: Filter::All,
            default_sort: SortMode::Date,
            poll_timeout: Duration::from_millis(50),
        }
    }
}

impl Config {
    /// Load configuration by merging CLI args and a TOML file.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve from CLI args and a parsed config file. Priority: CLI > file > default.
    fn resolve(cli: &Cli, file: &ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.storage.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            default_priority: file.ui.default_priority.unwrap_or(defaults.default_priority),
            default_filter: file.ui.default_filter.unwrap_or(defaults.default_filter),
            default_sort: file.ui.default_sort.unwrap_or(defaults.default_sort),
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
        }
    }

    /// Defaults with storage rooted at `data_dir`.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            ..Self::default()
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("tasklist"))
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}

/// Load and parse a TOML config file.
///
/// An explicit path must exist. Without one, the default path is tried and a
/// missing file is treated as an empty config.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("tasklist").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
