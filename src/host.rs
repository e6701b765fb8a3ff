//! Capabilities supplied by the embedding editor or front end.
//!
//! The navigator never talks to a UI directly. It is handed an [`Editor`]
//! for cursor and file access and a [`StatusSink`] for short user-facing
//! messages; picking a result goes through
//! [`ResultPresenter`](crate::presentation::ResultPresenter).

use async_trait::async_trait;

use crate::error::Result;
use crate::history::Position;

/// Cursor, selection and file access of the host editor
#[async_trait]
pub trait Editor: Send + Sync {
    /// Open `position` in the editor; `preview` opens it without committing
    /// a new editor tab
    async fn open_file_at(&self, position: &Position, preview: bool) -> Result<()>;

    /// Current non-empty selection, if any
    fn selection(&self) -> Option<String>;

    /// Word under the cursor, if any
    fn word_at_cursor(&self) -> Option<String>;

    /// Where the cursor currently is
    fn current_position(&self) -> Option<Position>;

    /// Ask the user for a pattern, pre-filled with `default`.
    ///
    /// `None` means the input was cancelled.
    async fn prompt_for_input(&self, default: &str) -> Option<String>;

    /// The pattern a query should use: the selection wins over the word
    fn current_word(&self) -> Option<String> {
        self.selection()
            .filter(|s| !s.is_empty())
            .or_else(|| self.word_at_cursor().filter(|w| !w.is_empty()))
    }
}

/// Destination for status bar messages
pub trait StatusSink: Send + Sync {
    fn show_status(&self, message: &str);
}

/// Status messages written to the log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn show_status(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Status messages printed to stderr, for terminal use
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrStatus;

impl StatusSink for StderrStatus {
    fn show_status(&self, message: &str) {
        eprintln!("{}", message);
    }
}
