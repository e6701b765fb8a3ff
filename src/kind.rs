//! Query kinds understood by the indexer
//!
//! Each kind owns its indexer flag and its rule for which token to look for
//! when re-reading the reported source line.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::NavError;

/// The nine line-oriented cscope query types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    /// Find this C symbol
    Symbol,
    /// Find this global definition
    Definition,
    /// Find functions called by this function
    Callee,
    /// Find functions calling this function
    Caller,
    /// Find this text string
    Text,
    /// Find this egrep pattern
    Egrep,
    /// Find this file
    File,
    /// Find files #including this file
    Include,
    /// Find assignments to this symbol
    Set,
}

impl QueryKind {
    pub const ALL: [QueryKind; 9] = [
        QueryKind::Symbol,
        QueryKind::Definition,
        QueryKind::Callee,
        QueryKind::Caller,
        QueryKind::Text,
        QueryKind::Egrep,
        QueryKind::File,
        QueryKind::Include,
        QueryKind::Set,
    ];

    /// Indexer flag selecting this query type
    pub fn flag(&self) -> &'static str {
        match self {
            QueryKind::Symbol => "-0",
            QueryKind::Definition => "-1",
            QueryKind::Callee => "-2",
            QueryKind::Caller => "-3",
            QueryKind::Text => "-4",
            QueryKind::Egrep => "-5",
            QueryKind::File => "-6",
            QueryKind::Include => "-7",
            QueryKind::Set => "-8",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Symbol => "symbol",
            QueryKind::Definition => "definition",
            QueryKind::Callee => "callee",
            QueryKind::Caller => "caller",
            QueryKind::Text => "text",
            QueryKind::Egrep => "egrep",
            QueryKind::File => "file",
            QueryKind::Include => "include",
            QueryKind::Set => "set",
        }
    }

    /// Token to locate on the reported line.
    ///
    /// A callee hit reports the *called* function in its symbol column, so the
    /// call site is found by that name; every other kind looks for the pattern.
    pub fn search_token<'a>(&self, pattern: &'a str, hit_symbol: &'a str) -> &'a str {
        match self {
            QueryKind::Callee => hit_symbol,
            _ => pattern,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| NavError::InvalidKind {
                name: s.to_string(),
            })
    }
}

/// An immutable query request: kind plus pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    kind: QueryKind,
    pattern: String,
}

impl QuerySpec {
    pub fn new(kind: QueryKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Token to search for on a hit's line
    pub fn search_token<'a>(&'a self, hit_symbol: &'a str) -> &'a str {
        self.kind.search_token(&self.pattern, hit_symbol)
    }
}
