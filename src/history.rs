//! Jump history
//!
//! A plain stack of positions the user jumped away from. Positions are not
//! validated or deduplicated; a popped position may point at a file that has
//! since moved, which is for the editor to deal with when opening it.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::{LogStatus, StatusSink};
use crate::resolver::ResolvedItem;

/// Status shown when popping an empty history
pub const END_OF_HISTORY: &str = "End of History.";

/// A cursor location, 0-based
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl From<&ResolvedItem> for Position {
    fn from(item: &ResolvedItem) -> Self {
        Self {
            file: item.file.clone(),
            line: item.line,
            column: item.column,
        }
    }
}

/// LIFO stack of positions
pub struct NavigationHistory {
    stack: Vec<Position>,
    status: Arc<dyn StatusSink>,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(Arc::new(LogStatus))
    }
}

impl NavigationHistory {
    /// Empty history reporting exhaustion to `status`
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self {
            stack: Vec::new(),
            status,
        }
    }

    pub fn push(&mut self, position: Position) -> &Position {
        tracing::debug!(
            "history push {}:{}:{}",
            position.file.display(),
            position.line,
            position.column
        );
        self.stack.push(position);
        &self.stack[self.stack.len() - 1]
    }

    /// Most recent position, or `None` (with a status message) when empty
    pub fn pop(&mut self) -> Option<Position> {
        let position = self.stack.pop();
        if position.is_none() {
            tracing::warn!("{}", END_OF_HISTORY);
            self.status.show_status(END_OF_HISTORY);
        }
        position
    }

    pub fn peek(&self) -> Option<&Position> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}
