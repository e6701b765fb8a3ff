//! Database builds and automatic rebuilds on source changes
//!
//! Uses the `notify` crate directly, without a debouncer: every qualifying
//! create, modify or remove event triggers exactly one rebuild attempt.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │   notify    │────>│ extension filter │────>│ on_change / build │
//! │   watcher   │     │  **/*.{c,h}      │     │  (one per event)  │
//! └─────────────┘     └──────────────────┘     └──────────────────┘
//! ```

use std::path::{Component, Path};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::engine::QueryEngine;
use crate::error::{NavError, Result};
use crate::host::StatusSink;

/// Runs builds and reports their outcome on the status line
pub struct BuildCoordinator {
    engine: Arc<QueryEngine>,
    status: Arc<dyn StatusSink>,
}

impl BuildCoordinator {
    pub fn new(engine: Arc<QueryEngine>, status: Arc<dyn StatusSink>) -> Self {
        Self { engine, status }
    }

    pub fn engine(&self) -> &Arc<QueryEngine> {
        &self.engine
    }

    /// Whether the database file exists under `cwd`
    pub fn index_exists(&self, cwd: &Path) -> bool {
        self.engine.config().database_path(cwd).is_file()
    }

    /// Build the database, reporting progress and outcome
    pub async fn build(&self, cwd: &Path) -> Result<String> {
        let database = self.engine.config().database;
        self.status
            .show_status(&format!("Building \"{}\"...", database));

        match self.engine.build(cwd).await {
            Ok(output) => {
                self.status
                    .show_status(&format!("\"{}\" is updated.", database));
                Ok(output)
            }
            Err(e) => {
                tracing::error!("build failed: {}", e);
                self.status.show_status(&format!(
                    "Error occurred while updating \"{}\".",
                    database
                ));
                Err(e)
            }
        }
    }

    /// Build the database if it does not exist yet.
    ///
    /// Returns whether a build was run.
    pub async fn ensure_fresh(&self, cwd: &Path) -> Result<bool> {
        if self.index_exists(cwd) {
            tracing::debug!("database present under {}", cwd.display());
            return Ok(false);
        }
        self.build(cwd).await?;
        Ok(true)
    }

    /// Rebuild on every qualifying change under `cwd`.
    ///
    /// Must be called from within a tokio runtime; builds run on it.
    pub fn watch_and_rebuild(self: &Arc<Self>, cwd: &Path) -> Result<WatchHandle> {
        let runtime = tokio::runtime::Handle::current();
        let coordinator = Arc::clone(self);
        let root = cwd.to_path_buf();
        let extensions = self.engine.config().extensions;

        watch(&extensions, cwd, move |path| {
            tracing::info!("{} changed, rebuilding", path.display());
            let coordinator = Arc::clone(&coordinator);
            let root = root.clone();
            runtime.spawn(async move {
                // Failures are already reported on the status line
                let _ = coordinator.build(&root).await;
            });
        })
    }
}

/// Handle for a running watch; dropping it stops the watch
pub struct WatchHandle {
    running: Arc<AtomicBool>,
    pattern: String,
}

impl WatchHandle {
    /// Stop the watcher
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the watcher is still running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Glob of the watched files, e.g. `**/*.{c,h}`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watch `cwd` recursively and call `on_change` once per create, modify or
/// remove event touching a file with one of `extensions`
pub fn watch<F>(extensions: &[String], cwd: &Path, on_change: F) -> Result<WatchHandle>
where
    F: Fn(&Path) + Send + 'static,
{
    if extensions.is_empty() {
        return Err(NavError::Watch {
            message: "no extensions to watch".to_string(),
        });
    }

    let extensions: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();
    let pattern = format!("**/*.{{{}}}", extensions.join(","));
    let root = cwd.to_path_buf();

    let (tx, rx) = std::sync::mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx).map_err(|e| NavError::Watch {
        message: e.to_string(),
    })?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| NavError::Watch {
            message: format!("{}: {}", root.display(), e),
        })?;
    tracing::info!("watching {} under {}", pattern, root.display());

    let running = Arc::new(AtomicBool::new(true));
    let thread_running = Arc::clone(&running);
    std::thread::spawn(move || {
        while thread_running.load(Ordering::SeqCst) {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(Ok(event)) => {
                    if !is_change(&event.kind) {
                        continue;
                    }
                    if let Some(path) = event
                        .paths
                        .iter()
                        .find(|p| should_watch_path(p, &root, &extensions))
                    {
                        tracing::debug!("[WATCHER] {:?} {}", event.kind, path.display());
                        on_change(path);
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!("Watcher error: {:?}", e);
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // Keep the watcher alive until the thread exits
        drop(watcher);
        tracing::debug!("[WATCHER] stopped");
    });

    Ok(WatchHandle { running, pattern })
}

fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Whether `path` is a source file the index cares about
fn should_watch_path(path: &Path, root: &Path, extensions: &[String]) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);

    // Skip hidden files and directories
    for component in relative.components() {
        if let Component::Normal(name) = component {
            if name.to_string_lossy().starts_with('.') {
                return false;
            }
        }
    }

    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            extensions.iter().any(|e| *e == ext)
        }
        None => false,
    }
}
