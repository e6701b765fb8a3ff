//! Shaping resolved items for a picker or a call hierarchy view
//!
//! Labels show 1-based lines and columns; the structured fields of every
//! entry keep the 0-based values of the underlying [`ResolvedItem`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::OutputMode;
use crate::resolver::ResolvedItem;

/// One row of a flat result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// `<symbol> : <trailing text>`
    pub label: String,
    /// `<relative path>:<line>:<column>`
    pub detail: String,
    pub item: ResolvedItem,
}

/// One result under its file in a grouped tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeLeaf {
    /// `<symbol>[<line>:<column>] <trimmed line text>`
    pub label: String,
    pub item: ResolvedItem,
}

/// All results of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGroup {
    /// File path relative to the project root
    pub path: String,
    pub children: Vec<TreeLeaf>,
}

/// Results grouped by file, in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTree {
    pub title: String,
    pub files: Vec<FileGroup>,
}

impl ResultTree {
    pub fn len(&self) -> usize {
        self.files.iter().map(|f| f.children.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A result set in the shape the picker asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "entries", rename_all = "lowercase")]
pub enum Presentation {
    List(Vec<ListEntry>),
    Tree(ResultTree),
}

impl Presentation {
    /// Shape `items` for `mode`
    pub fn new(mode: OutputMode, title: &str, items: &[ResolvedItem], root: &Path) -> Self {
        match mode {
            OutputMode::List => Self::List(list_entries(items, root)),
            OutputMode::Tree => Self::Tree(result_tree(title, items, root)),
        }
    }

    /// Items in presentation order
    pub fn items(&self) -> Vec<&ResolvedItem> {
        match self {
            Self::List(entries) => entries.iter().map(|e| &e.item).collect(),
            Self::Tree(tree) => tree
                .files
                .iter()
                .flat_map(|f| f.children.iter().map(|c| &c.item))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(entries) => entries.is_empty(),
            Self::Tree(tree) => tree.is_empty(),
        }
    }
}

/// A caller or callee of a function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallHierarchyItem {
    /// Function the call site belongs to (callers) or the called function (callees)
    pub name: String,
    /// `[<relative path>:<line>:<column>]<line text>`
    pub detail: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub length: usize,
}

/// Lets the user pick one item of a presented result set
#[async_trait]
pub trait ResultPresenter: Send + Sync {
    /// Returns the picked item, or `None` when the pick was cancelled.
    ///
    /// With `preview` set the presenter may open the highlighted item in
    /// preview mode while the user is choosing.
    async fn present_selection(
        &self,
        presentation: &Presentation,
        preview: bool,
    ) -> Option<ResolvedItem>;
}

fn location(item: &ResolvedItem, root: &Path) -> String {
    format!(
        "{}:{}:{}",
        item.relative_path(root),
        item.line + 1,
        item.column + 1
    )
}

pub fn list_entries(items: &[ResolvedItem], root: &Path) -> Vec<ListEntry> {
    items
        .iter()
        .map(|item| ListEntry {
            label: format!("{} : {}", item.symbol, item.trailing_text),
            detail: location(item, root),
            item: item.clone(),
        })
        .collect()
}

pub fn result_tree(title: &str, items: &[ResolvedItem], root: &Path) -> ResultTree {
    let mut files: Vec<FileGroup> = Vec::new();

    for item in items {
        let path = item.relative_path(root);
        let leaf = TreeLeaf {
            label: format!(
                "{}[{}:{}] {}",
                item.symbol,
                item.line + 1,
                item.column + 1,
                item.line_text.trim()
            ),
            item: item.clone(),
        };

        match files.iter_mut().find(|group| group.path == path) {
            Some(group) => group.children.push(leaf),
            None => files.push(FileGroup {
                path,
                children: vec![leaf],
            }),
        }
    }

    ResultTree {
        title: title.to_string(),
        files,
    }
}

pub fn call_hierarchy_items(items: &[ResolvedItem], root: &Path) -> Vec<CallHierarchyItem> {
    items
        .iter()
        .map(|item| CallHierarchyItem {
            name: item.symbol.clone(),
            detail: format!("[{}]{}", location(item, root), item.line_text),
            file: item.file.clone(),
            line: item.line,
            column: item.column,
            length: item.length,
        })
        .collect()
}
