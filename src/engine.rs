//! Query engine: indexer invocation, streaming parse, concurrent resolution.
//!
//! # Run lifecycle
//!
//! ```text
//! Idle ──spawn──> Running ──process exit──> Draining ──all resolutions done──> Settled
//! ```
//!
//! Every stdout line is parsed as soon as it arrives and each hit gets its
//! own resolution task, so source files are re-read while the indexer is
//! still producing output. [`QueryRun::settle`] is a barrier over all of
//! those tasks. Resolution tasks may finish in any order; the item order of
//! a settled run is completion order, not indexer order.
//!
//! Starting a run never cancels an earlier one, and by default every run
//! keeps all of its results. Each run carries a generation number so callers
//! can tell a superseded run from the latest one; only when
//! `discard_superseded` is set does the engine drop results that finish after
//! a newer run was started.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::NavConfig;
use crate::error::{NavError, Result};
use crate::kind::QuerySpec;
use crate::parser::parse_line;
use crate::process::{command_line, LineStream, ProcessRunner};
use crate::resolver::{FsSourceReader, ResolvedItem, ResultResolver, SourceReader};

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Created, process not spawned yet
    Idle,
    /// Process is running and producing output
    Running,
    /// Process has exited, resolutions are still outstanding
    Draining,
    /// Process has exited and every resolution has completed or been dropped
    Settled,
}

/// Per-run state shared between the run handle and its tasks
#[derive(Debug)]
struct RunShared {
    state: Mutex<RunState>,
    items: Mutex<Vec<ResolvedItem>>,
    hits: AtomicUsize,
    dropped_lines: AtomicUsize,
    dropped_items: AtomicUsize,
    discarded: AtomicUsize,
}

impl RunShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Idle),
            items: Mutex::new(Vec::new()),
            hits: AtomicUsize::new(0),
            dropped_lines: AtomicUsize::new(0),
            dropped_items: AtomicUsize::new(0),
            discarded: AtomicUsize::new(0),
        }
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock() = state;
    }
}

/// Generation token of a run
#[derive(Debug, Clone)]
struct Generation {
    value: u64,
    latest: Arc<AtomicU64>,
}

impl Generation {
    fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.value
    }
}

/// Counters describing how a run's output was consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Lines that parsed into hits
    pub hits: usize,
    /// Lines that did not match the output format
    pub dropped_lines: usize,
    /// Hits whose source file could not be read
    pub dropped_items: usize,
    /// Items thrown away because a newer run had started
    pub discarded: usize,
}

/// An in-flight query
pub struct QueryRun {
    spec: QuerySpec,
    cwd: PathBuf,
    command_line: String,
    generation: Generation,
    shared: Arc<RunShared>,
    driver: JoinHandle<Result<()>>,
}

impl QueryRun {
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn generation(&self) -> u64 {
        self.generation.value
    }

    /// Whether a newer run has been started on the same engine
    pub fn is_superseded(&self) -> bool {
        self.generation.is_superseded()
    }

    pub fn state(&self) -> RunState {
        *self.shared.state.lock()
    }

    /// Items resolved so far
    pub fn items(&self) -> Vec<ResolvedItem> {
        self.shared.items.lock().clone()
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            hits: self.shared.hits.load(Ordering::SeqCst),
            dropped_lines: self.shared.dropped_lines.load(Ordering::SeqCst),
            dropped_items: self.shared.dropped_items.load(Ordering::SeqCst),
            discarded: self.shared.discarded.load(Ordering::SeqCst),
        }
    }

    /// Wait until the process has exited and every resolution has finished.
    ///
    /// Fails with the indexer's error if the process failed; per-line and
    /// per-item problems never fail the run.
    pub async fn settle(self) -> Result<SettledRun> {
        let outcome = match self.driver.await {
            Ok(outcome) => outcome,
            Err(e) => Err(NavError::TaskFailure {
                message: e.to_string(),
            }),
        };
        outcome?;

        let stats = RunStats {
            hits: self.shared.hits.load(Ordering::SeqCst),
            dropped_lines: self.shared.dropped_lines.load(Ordering::SeqCst),
            dropped_items: self.shared.dropped_items.load(Ordering::SeqCst),
            discarded: self.shared.discarded.load(Ordering::SeqCst),
        };
        let items = std::mem::take(&mut *self.shared.items.lock());

        Ok(SettledRun {
            superseded: self.generation.is_superseded(),
            spec: self.spec,
            cwd: self.cwd,
            items,
            stats,
        })
    }
}

/// The terminal result of a query
#[derive(Debug, Clone, Serialize)]
pub struct SettledRun {
    pub spec: QuerySpec,
    pub cwd: PathBuf,
    pub items: Vec<ResolvedItem>,
    pub stats: RunStats,
    /// A newer run was started before this one settled
    pub superseded: bool,
}

impl SettledRun {
    /// Items ordered by file, line and column
    pub fn sorted_items(&self) -> Vec<ResolvedItem> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.line.cmp(&b.line))
                .then(a.column.cmp(&b.column))
        });
        items
    }
}

/// Runs builds and queries against one indexer configuration
pub struct QueryEngine {
    config: RwLock<NavConfig>,
    runner: ProcessRunner,
    reader: Arc<dyn SourceReader>,
    generation: Arc<AtomicU64>,
    last_build_command: Mutex<Option<String>>,
    last_query_command: Mutex<Option<String>>,
}

impl QueryEngine {
    /// Create an engine that reads sources from disk
    pub fn new(config: NavConfig) -> Self {
        Self::with_reader(config, Arc::new(FsSourceReader))
    }

    /// Create an engine with a host-supplied source reader
    pub fn with_reader(config: NavConfig, reader: Arc<dyn SourceReader>) -> Self {
        Self {
            config: RwLock::new(config),
            runner: ProcessRunner::new(),
            reader,
            generation: Arc::new(AtomicU64::new(0)),
            last_build_command: Mutex::new(None),
            last_query_command: Mutex::new(None),
        }
    }

    /// Snapshot of the current configuration
    pub fn config(&self) -> NavConfig {
        self.config.read().clone()
    }

    /// Replace the configuration; affects runs started afterwards
    pub fn set_config(&self, config: NavConfig) {
        *self.config.write() = config;
    }

    /// Generation of the most recently started run (0 before the first)
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn last_build_command(&self) -> Option<String> {
        self.last_build_command.lock().clone()
    }

    pub fn last_query_command(&self) -> Option<String> {
        self.last_query_command.lock().clone()
    }

    /// Full argument vector for a query
    pub fn query_args(&self, spec: &QuerySpec) -> Vec<String> {
        let mut args = self.config.read().query_argv();
        args.push(spec.kind().flag().to_string());
        args.push(spec.pattern().to_string());
        args
    }

    /// Spawn the indexer for `spec` and start consuming its output.
    ///
    /// Must be called from within a tokio runtime. Fails immediately only
    /// if the process cannot be started.
    pub fn start(&self, spec: QuerySpec, cwd: &Path) -> Result<QueryRun> {
        let discard = self.config.read().discard_superseded;
        self.spawn_run(spec, cwd, discard)
    }

    fn spawn_run(
        &self,
        spec: QuerySpec,
        cwd: &Path,
        discard_superseded: bool,
    ) -> Result<QueryRun> {
        let config = self.config();
        let args = self.query_args(&spec);
        let cmdline = command_line(&config.indexer, &args);
        *self.last_query_command.lock() = Some(cmdline.clone());

        let shared = Arc::new(RunShared::new());
        let stream = self.runner.stream(&config.indexer, &args, cwd)?;
        shared.set_state(RunState::Running);

        let generation = Generation {
            value: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
            latest: Arc::clone(&self.generation),
        };

        let driver = tokio::spawn(drive(
            stream,
            spec.clone(),
            ResultResolver::new(cwd, Arc::clone(&self.reader)),
            Arc::clone(&shared),
            generation.clone(),
            discard_superseded,
            Arc::new(Semaphore::new(config.max_concurrent_reads.max(1))),
        ));

        Ok(QueryRun {
            spec,
            cwd: cwd.to_path_buf(),
            command_line: cmdline,
            generation,
            shared,
            driver,
        })
    }

    /// Wait for a run to reach [`RunState::Settled`]
    pub async fn settle(&self, run: QueryRun) -> Result<SettledRun> {
        run.settle().await
    }

    /// Start a run and wait for it to settle
    pub async fn query(&self, spec: QuerySpec, cwd: &Path) -> Result<SettledRun> {
        self.start(spec, cwd)?.settle().await
    }

    /// Like [`query`](Self::query), but the run keeps every result even when
    /// `discard_superseded` is set and a newer run starts meanwhile
    pub async fn query_complete(&self, spec: QuerySpec, cwd: &Path) -> Result<SettledRun> {
        self.spawn_run(spec, cwd, false)?.settle().await
    }

    /// Build or refresh the database, returning the indexer's trimmed stdout
    pub async fn build(&self, cwd: &Path) -> Result<String> {
        let config = self.config();
        let args = config.build_argv();
        *self.last_build_command.lock() = Some(command_line(&config.indexer, &args));
        self.runner.run(&config.indexer, &args, cwd).await
    }
}

async fn drive(
    mut stream: LineStream,
    spec: QuerySpec,
    resolver: ResultResolver,
    shared: Arc<RunShared>,
    generation: Generation,
    discard_superseded: bool,
    permits: Arc<Semaphore>,
) -> Result<()> {
    let mut tasks = JoinSet::new();

    loop {
        let line = match stream.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tasks.shutdown().await;
                shared.set_state(RunState::Settled);
                return Err(e);
            }
        };

        let hit = match parse_line(&line) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("{}", e);
                shared.dropped_lines.fetch_add(1, Ordering::SeqCst);
                continue;
            }
        };
        shared.hits.fetch_add(1, Ordering::SeqCst);

        let token = spec.search_token(&hit.symbol).to_string();
        let resolver = resolver.clone();
        let shared = Arc::clone(&shared);
        let generation = generation.clone();
        let permits = Arc::clone(&permits);

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if discard_superseded && generation.is_superseded() {
                shared.discarded.fetch_add(1, Ordering::SeqCst);
                return;
            }
            match resolver.resolve(&hit, &token).await {
                Ok(item) => {
                    if discard_superseded && generation.is_superseded() {
                        shared.discarded.fetch_add(1, Ordering::SeqCst);
                    } else {
                        shared.items.lock().push(item);
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    shared.dropped_items.fetch_add(1, Ordering::SeqCst);
                }
            }
        });
    }

    let exit = stream.finish().await;
    if let Err(e) = exit {
        tasks.shutdown().await;
        shared.set_state(RunState::Settled);
        return Err(e);
    }

    shared.set_state(RunState::Draining);
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::warn!("resolution task failed: {}", e);
            shared.dropped_items.fetch_add(1, Ordering::SeqCst);
        }
    }
    shared.set_state(RunState::Settled);

    tracing::info!(
        "{} {:?}: {} results",
        spec.kind(),
        spec.pattern(),
        shared.items.lock().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::QueryKind;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// In-memory sources keyed by absolute path
    struct MemoryReader {
        files: HashMap<PathBuf, Vec<String>>,
    }

    #[async_trait]
    impl SourceReader for MemoryReader {
        async fn read_line(&self, path: &Path, line: usize) -> Result<String> {
            let lines = self.files.get(path).ok_or_else(|| NavError::SourceRead {
                path: path.display().to_string(),
                message: "no such file".to_string(),
            })?;
            Ok(lines.get(line).cloned().unwrap_or_default())
        }
    }

    /// Engine whose indexer is a shell script in a fresh directory
    struct Fixture {
        dir: tempfile::TempDir,
        engine: QueryEngine,
    }

    #[cfg(unix)]
    fn fixture(body: &str, files: &[(&str, Vec<&str>)]) -> Fixture {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-indexer");
        std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let files = files
            .iter()
            .map(|(name, lines)| {
                (
                    dir.path().join(name),
                    lines.iter().map(|l| l.to_string()).collect(),
                )
            })
            .collect();
        let config = NavConfig {
            indexer: script.display().to_string(),
            ..NavConfig::default()
        };
        let engine = QueryEngine::with_reader(config, Arc::new(MemoryReader { files }));
        Fixture { dir, engine }
    }

    #[test]
    fn test_query_args_layout() {
        let engine = QueryEngine::new(NavConfig::default());
        let spec = QuerySpec::new(QueryKind::Definition, "foo");
        assert_eq!(
            engine.query_args(&spec),
            vec!["-RL", "-f", "cscope.out", "-1", "foo"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_definition_run_settles_with_resolved_item() {
        let mut source = vec![""; 9];
        source.push("int foo(void) {");
        let fx = fixture("echo 'a.c foo 10 int foo(void) {'", &[("a.c", source)]);

        let run = fx
            .engine
            .start(QuerySpec::new(QueryKind::Definition, "foo"), fx.dir.path())
            .unwrap();
        assert_eq!(run.generation(), 1);

        let settled = run.settle().await.unwrap();
        assert_eq!(settled.items.len(), 1);
        let item = &settled.items[0];
        assert_eq!(item.file, fx.dir.path().join("a.c"));
        assert_eq!((item.line, item.column, item.length), (9, 4, 3));
        assert_eq!(settled.stats.hits, 1);
        assert!(fx
            .engine
            .last_query_command()
            .unwrap()
            .ends_with("-f cscope.out -1 foo"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_callee_query_searches_for_callee_name() {
        let fx = fixture(
            "echo 'a.c bar 1 void foo() { bar(); }'",
            &[("a.c", vec!["void foo() { bar(); }"])],
        );
        let settled = fx
            .engine
            .query(QuerySpec::new(QueryKind::Callee, "foo"), fx.dir.path())
            .await
            .unwrap();
        assert_eq!(settled.items.len(), 1);
        assert_eq!((settled.items[0].column, settled.items[0].length), (13, 3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_malformed_lines_are_dropped() {
        let fx = fixture(
            "echo 'a.c main 1 foo();'; echo junk; echo",
            &[("a.c", vec!["foo();"])],
        );
        let settled = fx
            .engine
            .query(QuerySpec::new(QueryKind::Symbol, "foo"), fx.dir.path())
            .await
            .unwrap();
        assert_eq!(settled.items.len(), 1);
        assert_eq!(settled.stats.dropped_lines, 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_files_are_dropped() {
        let fx = fixture(
            "echo 'a.c main 1 foo();'; echo 'gone.c main 1 foo();'",
            &[("a.c", vec!["foo();"])],
        );
        let settled = fx
            .engine
            .query(QuerySpec::new(QueryKind::Symbol, "foo"), fx.dir.path())
            .await
            .unwrap();
        assert_eq!(settled.items.len(), 1);
        assert_eq!(settled.stats.hits, 2);
        assert_eq!(settled.stats.dropped_items, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_failure_rejects_settle() {
        let fx = fixture("echo 'cscope: database not found' >&2; exit 1", &[]);
        let run = fx
            .engine
            .start(QuerySpec::new(QueryKind::Definition, "foo"), fx.dir.path())
            .unwrap();
        let err = run.settle().await.unwrap_err();
        assert_eq!(err.stderr(), Some("cscope: database not found"));
    }

    #[tokio::test]
    async fn test_missing_indexer_fails_at_start() {
        let config = NavConfig {
            indexer: "definitely-not-a-real-indexer-xyz".to_string(),
            ..NavConfig::default()
        };
        let engine = QueryEngine::new(config);
        let err = engine
            .start(
                QuerySpec::new(QueryKind::Symbol, "foo"),
                &std::env::temp_dir(),
            )
            .err()
            .unwrap();
        assert!(matches!(err, NavError::SpawnFailure { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_a_valid_settled_run() {
        let fx = fixture("true", &[]);
        let run = fx
            .engine
            .start(QuerySpec::new(QueryKind::Text, "nothing"), fx.dir.path())
            .unwrap();
        let settled = run.settle().await.unwrap();
        assert!(settled.items.is_empty());
        assert!(!settled.superseded);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_newer_run_supersedes_older() {
        let fx = fixture("true", &[]);
        let first = fx
            .engine
            .start(QuerySpec::new(QueryKind::Symbol, "a"), fx.dir.path())
            .unwrap();
        let second = fx
            .engine
            .start(QuerySpec::new(QueryKind::Symbol, "b"), fx.dir.path())
            .unwrap();

        assert!(first.is_superseded());
        assert!(!second.is_superseded());
        assert_eq!(fx.engine.current_generation(), 2);

        // Both runs still reach Settled
        assert!(first.settle().await.unwrap().superseded);
        assert!(!second.settle().await.unwrap().superseded);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_records_command() {
        let fx = fixture("echo built", &[]);
        let out = fx.engine.build(fx.dir.path()).await.unwrap();
        assert_eq!(out, "built");
        assert!(fx
            .engine
            .last_build_command()
            .unwrap()
            .ends_with("-RbU -f cscope.out"));
    }

    #[test]
    fn test_sorted_items() {
        let item = |file: &str, line: usize| ResolvedItem {
            file: PathBuf::from(file),
            symbol: "s".to_string(),
            line,
            column: 0,
            length: 0,
            line_text: String::new(),
            trailing_text: String::new(),
        };
        let settled = SettledRun {
            spec: QuerySpec::new(QueryKind::Symbol, "s"),
            cwd: PathBuf::from("/"),
            items: vec![item("/b.c", 1), item("/a.c", 7), item("/a.c", 2)],
            stats: RunStats::default(),
            superseded: false,
        };
        let lines: Vec<(String, usize)> = settled
            .sorted_items()
            .iter()
            .map(|i| (i.file.display().to_string(), i.line))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("/a.c".to_string(), 2),
                ("/a.c".to_string(), 7),
                ("/b.c".to_string(), 1)
            ]
        );
    }
}
