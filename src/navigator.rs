//! Editor session: ties queries, picking, jumping and history together
//!
//! One [`Navigator`] lives for the whole editor session. Its collaborators
//! are handed in at construction; nothing here is global.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::build::{BuildCoordinator, WatchHandle};
use crate::config::NavConfig;
use crate::engine::{QueryEngine, SettledRun};
use crate::error::Result;
use crate::history::{NavigationHistory, Position};
use crate::host::{Editor, StatusSink};
use crate::kind::{QueryKind, QuerySpec};
use crate::presentation::{call_hierarchy_items, CallHierarchyItem, Presentation, ResultPresenter};
use crate::resolver::ResolvedItem;

/// Status shown when the pattern prompt was cancelled or left empty
pub const NO_PATTERN: &str = "Cannot get pattern from the input box.";

/// Status shown when there is no selection or word to query
pub const NO_WORD: &str = "Cannot find a word under the cursor.";

/// Status shown when the editor has no cursor to remember
pub const NO_EDITOR: &str = "Cannot find Active Text Editor.";

/// One editor session against one project root
pub struct Navigator {
    root: PathBuf,
    engine: Arc<QueryEngine>,
    builder: Arc<BuildCoordinator>,
    history: Mutex<NavigationHistory>,
    editor: Arc<dyn Editor>,
    presenter: Arc<dyn ResultPresenter>,
    status: Arc<dyn StatusSink>,
    last_results: Mutex<Option<SettledRun>>,
    /// Number of interactive queries started; a settled query whose ticket
    /// is no longer the latest is stale
    interactive: AtomicU64,
    auto_build: Mutex<Option<WatchHandle>>,
}

impl Navigator {
    pub fn new(
        root: impl Into<PathBuf>,
        config: NavConfig,
        editor: Arc<dyn Editor>,
        presenter: Arc<dyn ResultPresenter>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self::with_engine(
            root,
            Arc::new(QueryEngine::new(config)),
            editor,
            presenter,
            status,
        )
    }

    /// Session around an existing engine
    pub fn with_engine(
        root: impl Into<PathBuf>,
        engine: Arc<QueryEngine>,
        editor: Arc<dyn Editor>,
        presenter: Arc<dyn ResultPresenter>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        let builder = Arc::new(BuildCoordinator::new(
            Arc::clone(&engine),
            Arc::clone(&status),
        ));
        Self {
            root: root.into(),
            engine,
            builder,
            history: Mutex::new(NavigationHistory::new(Arc::clone(&status))),
            editor,
            presenter,
            status,
            last_results: Mutex::new(None),
            interactive: AtomicU64::new(0),
            auto_build: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine(&self) -> &Arc<QueryEngine> {
        &self.engine
    }

    /// Session start: with `auto_build` set, build a missing database and
    /// start watching sources
    pub async fn start(&self) -> Result<()> {
        if self.engine.config().auto_build {
            self.set_auto_build(true).await?;
        }
        Ok(())
    }

    /// Build or refresh the database
    pub async fn build(&self) -> Result<String> {
        self.builder.build(&self.root).await
    }

    /// Turn automatic rebuilds on or off
    pub async fn set_auto_build(&self, enabled: bool) -> Result<()> {
        if !enabled {
            if let Some(handle) = self.auto_build.lock().take() {
                tracing::info!("stopped watching {}", handle.pattern());
            }
            return Ok(());
        }

        self.builder.ensure_fresh(&self.root).await?;
        let handle = self.builder.watch_and_rebuild(&self.root)?;
        *self.auto_build.lock() = Some(handle);
        Ok(())
    }

    pub fn auto_build_enabled(&self) -> bool {
        self.auto_build
            .lock()
            .as_ref()
            .map(|h| h.is_running())
            .unwrap_or(false)
    }

    /// Glob of the running auto-build watch
    pub fn auto_build_pattern(&self) -> Option<String> {
        self.auto_build
            .lock()
            .as_ref()
            .filter(|h| h.is_running())
            .map(|h| h.pattern().to_string())
    }

    /// Apply a new configuration, re-installing the watch when the watched
    /// extensions changed and starting or dropping it to match `auto_build`
    pub async fn reload_config(&self, config: NavConfig) -> Result<()> {
        config.validate()?;
        let previous = self.engine.config();
        self.engine.set_config(config.clone());

        let watching = self.auto_build_enabled();
        let extensions_changed = config.extensions != previous.extensions;
        if config.auto_build != watching || (watching && extensions_changed) {
            self.set_auto_build(false).await?;
            if config.auto_build {
                self.set_auto_build(true).await?;
            }
        }
        Ok(())
    }

    /// Query the selection or the word under the cursor
    pub async fn query(&self, kind: QueryKind) -> Result<Option<Position>> {
        match self.editor.current_word() {
            Some(word) => self.run_query(QuerySpec::new(kind, word)).await,
            None => {
                self.status.show_status(NO_WORD);
                Ok(None)
            }
        }
    }

    /// Ask for a pattern, pre-filled with the current word, then query it
    pub async fn query_with_prompt(&self, kind: QueryKind) -> Result<Option<Position>> {
        let default = self.editor.current_word().unwrap_or_default();
        match self.editor.prompt_for_input(&default).await {
            Some(pattern) if !pattern.is_empty() => {
                self.run_query(QuerySpec::new(kind, pattern)).await
            }
            _ => {
                tracing::info!("{}", NO_PATTERN);
                self.status.show_status(NO_PATTERN);
                Ok(None)
            }
        }
    }

    /// Run `spec` to completion, present its items and jump to the pick.
    ///
    /// If another interactive query was started meanwhile, this one's
    /// results are dropped without being presented.
    pub async fn run_query(&self, spec: QuerySpec) -> Result<Option<Position>> {
        let ticket = self.interactive.fetch_add(1, Ordering::SeqCst) + 1;
        self.status
            .show_status(&format!("Querying \"{}\"...", spec.pattern()));

        let settled = match self.engine.query_complete(spec, &self.root).await {
            Ok(settled) => settled,
            Err(e) => {
                let command = self.engine.last_query_command().unwrap_or_default();
                self.status
                    .show_status(&format!("Error occurred while querying: \"{}\".", command));
                return Err(e);
            }
        };

        if self.interactive.load(Ordering::SeqCst) != ticket {
            tracing::debug!("dropping results of stale {}", settled.spec.kind());
            return Ok(None);
        }

        *self.last_results.lock() = Some(settled);
        self.show_results().await
    }

    /// Present the last settled run again without re-querying
    pub async fn show_results(&self) -> Result<Option<Position>> {
        let presentation = {
            let last = self.last_results.lock();
            let Some(run) = last.as_ref() else {
                return Ok(None);
            };
            let config = self.engine.config();
            let title = format!("{} {}", run.spec.kind(), run.spec.pattern());
            Presentation::new(config.output, &title, &run.sorted_items(), &self.root)
        };

        let preview = self.engine.config().preview;
        match self.presenter.present_selection(&presentation, preview).await {
            Some(item) => self.jump_to(&item).await.map(Some),
            None => Ok(None),
        }
    }

    /// Items of the last settled run
    pub fn last_results(&self) -> Option<Vec<ResolvedItem>> {
        self.last_results.lock().as_ref().map(|r| r.items.clone())
    }

    /// Remember where the cursor is and open `item`
    pub async fn jump_to(&self, item: &ResolvedItem) -> Result<Position> {
        match self.editor.current_position() {
            Some(here) => {
                self.history.lock().push(here);
            }
            None => self.status.show_status(NO_EDITOR),
        }

        let target = Position::from(item);
        self.editor.open_file_at(&target, false).await?;
        Ok(target)
    }

    /// Go back to the most recently remembered position
    pub async fn pop(&self) -> Result<Option<Position>> {
        let position = self.history.lock().pop();
        match position {
            Some(position) => {
                self.editor.open_file_at(&position, false).await?;
                Ok(Some(position))
            }
            None => Ok(None),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Where `word` is defined; empty when the query fails
    pub async fn definitions(&self, word: &str) -> Vec<ResolvedItem> {
        self.lookup(QuerySpec::new(QueryKind::Definition, word)).await
    }

    /// Where `word` is referenced; empty when the query fails
    pub async fn references(&self, word: &str) -> Vec<ResolvedItem> {
        self.lookup(QuerySpec::new(QueryKind::Symbol, word)).await
    }

    /// Functions calling `name`
    pub async fn incoming_calls(&self, name: &str) -> Vec<CallHierarchyItem> {
        let items = self.lookup(QuerySpec::new(QueryKind::Caller, name)).await;
        call_hierarchy_items(&items, &self.root)
    }

    /// Functions called by `name`
    pub async fn outgoing_calls(&self, name: &str) -> Vec<CallHierarchyItem> {
        let items = self.lookup(QuerySpec::new(QueryKind::Callee, name)).await;
        call_hierarchy_items(&items, &self.root)
    }

    async fn lookup(&self, spec: QuerySpec) -> Vec<ResolvedItem> {
        match self.engine.query_complete(spec, &self.root).await {
            Ok(settled) => settled.sorted_items(),
            Err(e) => {
                tracing::error!("cannot query: {}", e);
                Vec::new()
            }
        }
    }
}
