//! CLI argument definitions using clap with subcommand architecture

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::kind::QueryKind;

/// Navigate C sources through a cscope symbol database
#[derive(Parser, Debug)]
#[command(name = "cscope-nav")]
#[command(about = "Build and query cscope databases with exact result columns")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the per-user config)
    #[arg(long, value_name = "PATH", global = true, env = "CSCOPE_NAV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root the database lives in (defaults to the current directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

/// Available subcommands for cscope-nav
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build or refresh the database
    #[command(visible_alias = "b")]
    Build,

    /// Run one query and print the resolved results
    #[command(visible_alias = "q")]
    Query(QueryArgs),

    /// Print callers or callees of a function
    Calls(CallsArgs),

    /// Build a missing database, then rebuild on every source change
    Watch,

    /// Manage cscope-nav configuration
    Config(ConfigArgs),
}

// ============================================
// Query Subcommand
// ============================================

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Kind of query
    #[arg(value_enum)]
    pub kind: QueryKind,

    /// Symbol, text or pattern to look for
    pub pattern: String,

    /// Group results by file
    #[arg(long)]
    pub tree: bool,
}

// ============================================
// Calls Subcommand
// ============================================

/// Arguments for the calls command
#[derive(Args, Debug)]
pub struct CallsArgs {
    /// Function name
    pub name: String,

    /// Show functions calling NAME instead of functions NAME calls
    #[arg(long)]
    pub incoming: bool,
}

// ============================================
// Config Subcommand
// ============================================

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub operation: ConfigOperation,
}

#[derive(Subcommand, Debug)]
pub enum ConfigOperation {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default for terminal)
    #[default]
    #[value(alias = "pretty")]
    Text,
    /// JSON - standard JSON output for machine parsing
    Json,
}
