//! cscope-nav configuration management.
//!
//! Handles the configuration file at:
//! - Linux: ~/.config/cscope-nav/config.toml
//! - macOS: ~/Library/Application Support/cscope-nav/config.toml
//! - Windows: %APPDATA%\cscope-nav\config.toml
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

/// How a result set is handed to the picker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One flat list of items
    #[default]
    List,
    /// Items grouped under their file
    Tree,
}

/// cscope-nav configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Indexer binary
    pub indexer: String,

    /// Database file, relative to the project root unless absolute
    pub database: String,

    /// Flags for building the database
    pub build_args: String,

    /// Flags for line-oriented queries
    pub query_args: String,

    /// Source extensions that trigger an automatic rebuild
    pub extensions: Vec<String>,

    /// Build a missing database at start and rebuild on file changes
    pub auto_build: bool,

    /// Preview the highlighted result while picking
    pub preview: bool,

    /// Result presentation mode
    pub output: OutputMode,

    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Upper bound on source files read at once while resolving a run
    pub max_concurrent_reads: usize,

    /// Drop late results of a run once a newer run has started
    pub discard_superseded: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            indexer: "cscope".to_string(),
            database: "cscope.out".to_string(),
            build_args: "-RbU".to_string(),
            query_args: "-RL".to_string(),
            extensions: vec!["c".to_string(), "h".to_string()],
            auto_build: false,
            preview: true,
            output: OutputMode::List,
            log_level: "info".to_string(),
            max_concurrent_reads: 64,
            discard_superseded: false,
        }
    }
}

impl NavConfig {
    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cscope-nav").join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| NavError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| NavError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        // Atomic write
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Reject settings that would make every indexer call fail
    pub fn validate(&self) -> Result<()> {
        if self.indexer.trim().is_empty() {
            return Err(NavError::Config {
                message: "indexer must not be empty".to_string(),
            });
        }
        if self.database.trim().is_empty() {
            return Err(NavError::Config {
                message: "database must not be empty".to_string(),
            });
        }
        if self.max_concurrent_reads == 0 {
            return Err(NavError::Config {
                message: "max_concurrent_reads must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Database location for a project root
    pub fn database_path(&self, root: &Path) -> PathBuf {
        let db = Path::new(&self.database);
        if db.is_absolute() {
            db.to_path_buf()
        } else {
            root.join(db)
        }
    }

    /// Argument vector for a build: `<build flags> -f <database>`
    pub fn build_argv(&self) -> Vec<String> {
        let mut args = split_flags(&self.build_args);
        args.push("-f".to_string());
        args.push(self.database.clone());
        args
    }

    /// Argument vector prefix for a query: `<query flags> -f <database>`
    pub fn query_argv(&self) -> Vec<String> {
        let mut args = split_flags(&self.query_args);
        args.push("-f".to_string());
        args.push(self.database.clone());
        args
    }

    /// Glob describing watched sources, e.g. `**/*.{c,h}`
    pub fn watch_pattern(&self) -> String {
        format!("**/*.{{{}}}", self.extensions.join(","))
    }

    /// Resolve the indexer binary on PATH, if it can be found
    pub fn locate_indexer(&self) -> Option<PathBuf> {
        which::which(&self.indexer).ok()
    }
}

fn split_flags(flags: &str) -> Vec<String> {
    flags.split_whitespace().map(str::to_string).collect()
}
