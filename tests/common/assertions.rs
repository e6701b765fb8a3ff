//! Custom assertions for integration tests

use serde_json::Value;

use cscope_nav::ResolvedItem;

/// Assert that output is valid JSON and return parsed value
pub fn assert_valid_json(output: &str, context: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|e| {
        panic!(
            "Expected valid JSON ({}): {}\nOutput:\n{}",
            context, e, output
        )
    })
}

/// Assert that output contains all expected substrings
pub fn assert_contains_all(output: &str, expected: &[&str]) {
    for needle in expected {
        assert!(
            output.contains(needle),
            "Expected output to contain {:?}\nOutput:\n{}",
            needle,
            output
        );
    }
}

/// Assert that an item points at `line`/`column` with `length`
pub fn assert_location(item: &ResolvedItem, line: usize, column: usize, length: usize) {
    assert_eq!(
        (item.line, item.column, item.length),
        (line, column, length),
        "unexpected location for {}: {:?}",
        item.file.display(),
        item
    );
}
