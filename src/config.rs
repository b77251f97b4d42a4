//! Configuration file support for pit
//!
//! Reads from .pit/config.toml

use crate::error::{PitError, Result};
use crate::models::{bounded, Priority, USERNAME_MAX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Identity settings
    #[serde(default)]
    pub user: UserConfig,

    /// Project defaults
    #[serde(default)]
    pub project: ProjectConfig,

    /// Task defaults
    #[serde(default)]
    pub task: TaskConfig,

    /// Action log settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Who gets recorded as creator/editor
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct UserConfig {
    /// Overrides $USER / $USERNAME when set
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectConfig {
    /// Status given to new projects when -s is omitted
    /// Default: "active"
    #[serde(default = "default_project_status")]
    pub default_status: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TaskConfig {
    /// Default: "open"
    #[serde(default = "default_task_status")]
    pub default_status: String,

    /// Default: "normal"
    #[serde(default = "default_task_priority")]
    pub default_priority: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    /// How many of the most recent log entries are loaded and shown
    /// Default: 20
    #[serde(default = "default_log_tail")]
    pub tail: usize,
}

fn default_project_status() -> String {
    "active".to_string()
}

fn default_task_status() -> String {
    "open".to_string()
}

fn default_task_priority() -> String {
    Priority::Normal.to_string()
}

fn default_log_tail() -> usize {
    20
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            default_status: default_project_status(),
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_status: default_task_status(),
            default_priority: default_task_priority(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            tail: default_log_tail(),
        }
    }
}

impl Config {
    /// Load config from .pit/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse a specific config file. A file that exists but doesn't parse is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| PitError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".pit").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Resolve the acting user: config, then $USER, then $USERNAME.
    pub fn current_user(&self) -> Result<String> {
        let name = pick_user(self.user.name.clone(), |key| std::env::var(key).ok());
        bounded("username", &name, USERNAME_MAX)
    }

    pub fn default_priority(&self) -> Result<Priority> {
        self.task.default_priority.parse()
    }
}

/// First non-blank of the configured name, $USER and $USERNAME.
fn pick_user<F>(configured: Option<String>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &String| !name.trim().is_empty();
    configured
        .filter(non_blank)
        .or_else(|| env("USER").filter(non_blank))
        .or_else(|| env("USERNAME").filter(non_blank))
        .unwrap_or_else(|| "unknown".to_string())
}
