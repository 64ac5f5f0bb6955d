//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where snapshots and logs live and how the tree is addressed.
//! - Load settings from JSON with per-field defaults.
//!
//! # Invariants
//! - A validated config has a tree root without `/` and a non-zero
//!   upcoming horizon.

use crate::logging::default_log_level;
use crate::tree::view::DEFAULT_TREE_ROOT;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_UPCOMING_DAYS: u32 = 7;

/// Errors from loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Settings for opening a daybook core session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite snapshot file; in-memory storage when absent.
    pub database_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; file logging is disabled when absent.
    pub log_dir: Option<PathBuf>,
    /// Id prefix of the journal tree.
    pub tree_root: String,
    /// Number of days shown in the upcoming-tasks agenda.
    pub upcoming_days: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            tree_root: DEFAULT_TREE_ROOT.to_string(),
            upcoming_days: DEFAULT_UPCOMING_DAYS,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = self.tree_root.trim();
        if root.is_empty() || root.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "tree_root must be a single non-blank segment, got `{}`",
                self.tree_root
            )));
        }
        if self.upcoming_days == 0 {
            return Err(ConfigError::Invalid(
                "upcoming_days must be at least 1".to_string(),
            ));
        }
        if self
            .log_dir
            .as_ref()
            .is_some_and(|dir| !dir.is_absolute())
        {
            return Err(ConfigError::Invalid(
                "log_dir must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }
}
