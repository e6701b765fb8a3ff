//! cscope-nav: cscope queries with exact source locations
//!
//! Runs the `cscope` indexer as a subprocess, parses its line-oriented
//! output as it streams in, and re-reads each reported source line to find
//! the exact column of the searched token. Resolution of many hits runs
//! concurrently under a bounded number of simultaneous file reads.
//!
//! On top of the query engine sit an editor session ([`Navigator`]) with a
//! jump history, a build coordinator that can rebuild the database when
//! sources change, and a presentation layer shaping results for a picker or
//! a call hierarchy view.
//!
//! # Example
//!
//! ```ignore
//! use cscope_nav::{NavConfig, QueryEngine, QueryKind, QuerySpec};
//! use std::path::Path;
//!
//! let engine = QueryEngine::new(NavConfig::default());
//! let run = engine.start(QuerySpec::new(QueryKind::Definition, "main"), Path::new("."))?;
//! for item in run.settle().await?.sorted_items() {
//!     println!("{}:{}:{}", item.file.display(), item.line + 1, item.column + 1);
//! }
//! ```

pub mod build;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod host;
pub mod kind;
pub mod navigator;
pub mod parser;
pub mod presentation;
pub mod process;
pub mod resolver;

// Re-export commonly used types
pub use build::{BuildCoordinator, WatchHandle};
pub use config::{NavConfig, OutputMode};
pub use engine::{QueryEngine, QueryRun, RunState, RunStats, SettledRun};
pub use error::{NavError, Result};
pub use history::{NavigationHistory, Position};
pub use host::{Editor, LogStatus, StatusSink, StderrStatus};
pub use kind::{QueryKind, QuerySpec};
pub use navigator::Navigator;
pub use parser::{parse_line, parse_output, RawHit};
pub use presentation::{CallHierarchyItem, Presentation, ResultPresenter};
pub use process::{LineStream, ProcessRunner};
pub use resolver::{FsSourceReader, ResolvedItem, ResultResolver, SourceReader};
