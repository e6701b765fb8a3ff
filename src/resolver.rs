//! Resolution of raw hits into exact source locations.
//!
//! The indexer only reports a file and a line. To get a column span the
//! reported line is re-read and the search token is located in it as a
//! literal substring. The index may be stale, so a token that is no longer
//! on that line still yields a visitable item at column 0 with length 0.
//! A file that cannot be read is an error for that item only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};
use crate::parser::RawHit;

/// Read access to source text, supplied by the host
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Text of the 0-based `line` of `path`, without its terminator.
    ///
    /// A line past the end of the file reads as empty; an unreadable file
    /// is an error.
    async fn read_line(&self, path: &Path, line: usize) -> Result<String>;
}

/// Reads source lines straight from disk
#[derive(Debug, Clone, Default)]
pub struct FsSourceReader;

#[async_trait]
impl SourceReader for FsSourceReader {
    async fn read_line(&self, path: &Path, line: usize) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| NavError::SourceRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text
            .lines()
            .nth(line)
            .map(|l| l.trim_end_matches('\r').to_string())
            .unwrap_or_default())
    }
}

/// A hit with an exact column span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedItem {
    /// Absolute path of the source file
    pub file: PathBuf,
    /// Symbol column of the hit
    pub symbol: String,
    /// 0-based line
    pub line: usize,
    /// 0-based column of the token, in characters
    pub column: usize,
    /// Token length in characters (0 when the token was not found)
    pub length: usize,
    /// Current text of the line
    pub line_text: String,
    /// Text the indexer reported after the line number
    pub trailing_text: String,
}

impl ResolvedItem {
    /// File path relative to `root`, or the full path outside of it
    pub fn relative_path(&self, root: &Path) -> String {
        self.file
            .strip_prefix(root)
            .unwrap_or(&self.file)
            .display()
            .to_string()
    }
}

/// Column and length of `token` in `line_text`, in characters.
///
/// Returns `(0, 0)` when the token does not occur on the line.
pub fn locate_token(line_text: &str, token: &str) -> (usize, usize) {
    match line_text.find(token) {
        Some(byte_offset) => (
            line_text[..byte_offset].chars().count(),
            token.chars().count(),
        ),
        None => (0, 0),
    }
}

/// Turns raw hits into resolved items relative to one working directory
#[derive(Clone)]
pub struct ResultResolver {
    root: PathBuf,
    reader: Arc<dyn SourceReader>,
}

impl ResultResolver {
    pub fn new(root: impl Into<PathBuf>, reader: Arc<dyn SourceReader>) -> Self {
        Self {
            root: root.into(),
            reader,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a file name reported by the indexer
    pub fn absolute_path(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Re-read the hit's line and locate `search_token` on it
    pub async fn resolve(&self, hit: &RawHit, search_token: &str) -> Result<ResolvedItem> {
        let file = self.absolute_path(&hit.file);
        let line_text = self.reader.read_line(&file, hit.line_number).await?;
        let (column, length) = locate_token(&line_text, search_token);

        if length == 0 && !search_token.is_empty() {
            tracing::debug!(
                "{:?} not found on {}:{}, index may be stale",
                search_token,
                file.display(),
                hit.line_number + 1
            );
        }

        Ok(ResolvedItem {
            file,
            symbol: hit.symbol.clone(),
            line: hit.line_number,
            column,
            length,
            line_text,
            trailing_text: hit.trailing_text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(root: &Path) -> ResultResolver {
        ResultResolver::new(root, Arc::new(FsSourceReader))
    }

    #[test]
    fn test_locate_token() {
        assert_eq!(locate_token("int foo(void) {", "foo"), (4, 3));
        assert_eq!(locate_token("int bar(void) {", "foo"), (0, 0));
        assert_eq!(locate_token("", "foo"), (0, 0));
    }

    #[test]
    fn test_locate_token_counts_characters() {
        // "é" is two bytes but one column
        assert_eq!(locate_token("/* é */ foo();", "foo"), (8, 3));
    }

    #[test]
    fn test_absolute_path() {
        let r = resolver(Path::new("/proj"));
        assert_eq!(r.absolute_path("src/a.c"), PathBuf::from("/proj/src/a.c"));
        assert_eq!(r.absolute_path("/usr/include/stdio.h"), PathBuf::from("/usr/include/stdio.h"));
    }

    #[tokio::test]
    async fn test_resolve_definition() {
        let dir = TempDir::new().unwrap();
        let mut source = String::new();
        for _ in 0..9 {
            source.push_str("\n");
        }
        source.push_str("int foo(void) {\n}\n");
        fs::write(dir.path().join("a.c"), source).unwrap();

        let hit = parse_line("a.c foo 10 int foo(void) {").unwrap();
        let item = resolver(dir.path()).resolve(&hit, "foo").await.unwrap();

        assert_eq!(item.file, dir.path().join("a.c"));
        assert_eq!(item.symbol, "foo");
        assert_eq!(item.line, 9);
        assert_eq!(item.column, 4);
        assert_eq!(item.length, 3);
        assert_eq!(item.line_text, "int foo(void) {");
        assert_eq!(item.relative_path(dir.path()), "a.c");
    }

    #[tokio::test]
    async fn test_stale_line_falls_back_to_column_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), "int bar;\nint baz;\n").unwrap();

        let hit = parse_line("a.c foo 2 int foo;").unwrap();
        let item = resolver(dir.path()).resolve(&hit, "foo").await.unwrap();
        assert_eq!((item.column, item.length), (0, 0));
        assert_eq!(item.line_text, "int baz;");

        let past_end = parse_line("a.c foo 50 int foo;").unwrap();
        let item = resolver(dir.path()).resolve(&past_end, "foo").await.unwrap();
        assert_eq!((item.column, item.length), (0, 0));
        assert_eq!(item.line_text, "");
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.c"), "void main() { foo(); }\n").unwrap();
        let hit = parse_line("a.c main 1 void main() { foo(); }").unwrap();

        let r = resolver(dir.path());
        let first = r.resolve(&hit, "foo").await.unwrap();
        let second = r.resolve(&hit, "foo").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_error() {
        let dir = TempDir::new().unwrap();
        let hit = parse_line("missing.c foo 1 foo();").unwrap();
        let err = resolver(dir.path()).resolve(&hit, "foo").await.unwrap_err();
        assert!(matches!(err, NavError::SourceRead { .. }));
    }
}
