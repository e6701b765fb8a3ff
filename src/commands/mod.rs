//! Command modules for the cscope-nav CLI
//!
//! ## Architecture
//!
//! Each command module implements a single top-level command:
//! - `build` - Build or refresh the database
//! - `query` - Run one query to completion and print resolved items
//! - `calls` - Print callers or callees of a function
//! - `watch` - Rebuild the database on source changes
//! - `config` - Show or initialize the configuration file
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext` for output format, project root and
//! configuration.

pub mod build;
pub mod calls;
pub mod config;
pub mod query;
pub mod watch;

// Re-export command handlers for easy access
pub use build::run_build;
pub use calls::run_calls;
pub use config::run_config;
pub use query::run_query;
pub use watch::run_watch;

use std::path::PathBuf;

use serde::Serialize;

use crate::cli::{Cli, OutputFormat};
use crate::config::NavConfig;
use crate::engine::QueryEngine;
use crate::error::{NavError, Result};

/// Shared context passed to all command handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    /// Absolute project root
    pub root: PathBuf,
    /// Effective configuration
    pub config: NavConfig,
    /// Configuration file the settings came from (or would be written to)
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Create a new CommandContext from CLI args
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.clone().or_else(NavConfig::default_path);
        let config = match &config_path {
            Some(path) => NavConfig::load_from(path)?,
            None => NavConfig::default(),
        };

        let root = match &cli.root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let root = root.canonicalize().map_err(|_| NavError::FileNotFound {
            path: root.display().to_string(),
        })?;

        Ok(Self {
            format: cli.format,
            verbose: cli.verbose,
            root,
            config,
            config_path,
        })
    }

    /// Engine for the effective configuration
    pub fn engine(&self) -> QueryEngine {
        QueryEngine::new(self.config.clone())
    }
}

/// Pretty JSON for the json output format
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
