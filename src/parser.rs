//! Parser for one line of cscope line-oriented output
//!
//! Line format: `<file> <function> <line number> <rest of line>`. The first
//! three fields are runs of non-space characters; the fourth is everything
//! after the single space that follows the line number, kept verbatim.
//!
//! File names containing spaces cannot be told apart from the delimiter and
//! will parse incorrectly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{NavError, Result};

static LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^ ]+) +([^ ]+) +([^ ]+) (.*)$").expect("line pattern is valid"));

/// One indexer result before its column is resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    /// File as reported by the indexer (may be relative)
    pub file: String,
    /// Enclosing function, or the callee name for callee queries
    pub symbol: String,
    /// 0-based line number
    pub line_number: usize,
    /// Source text after the line number field
    pub trailing_text: String,
    /// The complete output line
    pub original_line: String,
}

/// Parse one output line into a [`RawHit`]
pub fn parse_line(line: &str) -> Result<RawHit> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let caps = LINE_PATTERN.captures(line).ok_or_else(|| NavError::Parse {
        line: line.to_string(),
        reason: "wrong format".to_string(),
    })?;

    let number = &caps[3];
    let one_based: usize = number.parse().map_err(|_| NavError::Parse {
        line: line.to_string(),
        reason: format!("line number {:?} is not a number", number),
    })?;
    if one_based == 0 {
        return Err(NavError::Parse {
            line: line.to_string(),
            reason: "line numbers start at 1".to_string(),
        });
    }

    Ok(RawHit {
        file: caps[1].to_string(),
        symbol: caps[2].to_string(),
        line_number: one_based - 1,
        trailing_text: caps[4].to_string(),
        original_line: line.to_string(),
    })
}

/// Parse a whole output buffer, dropping (and logging) malformed lines
pub fn parse_output(output: &str) -> Vec<RawHit> {
    output
        .lines()
        .filter_map(|line| match parse_line(line) {
            Ok(hit) => Some(hit),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        })
        .collect()
}
