//! Error types and exit codes for cscope-nav

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for cscope-nav operations
#[derive(Error, Debug)]
pub enum NavError {
    #[error("Failed to spawn {command}: {cause}")]
    SpawnFailure { command: String, cause: String },

    #[error("Indexer exited with {}: {stderr}", exit_code_label(.exit_code))]
    ProcessFailure {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Cannot parse {line:?}: {reason}")]
    Parse { line: String, reason: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Could not open {path:?}: {message}")]
    SourceRead { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File watch error: {message}")]
    Watch { message: String },

    #[error("Query task failed: {message}")]
    TaskFailure { message: String },

    #[error("Unknown query kind: {name}")]
    InvalidKind { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {}", c),
        None => "signal".to_string(),
    }
}

impl NavError {
    /// Numeric exit status for this error:
    /// - 0: Success
    /// - 1: File not found / IO error / internal task failure
    /// - 2: Configuration or usage error
    /// - 3: Indexer could not be spawned
    /// - 4: Indexer exited with failure
    /// - 5: File watch error
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::FileNotFound { .. } | Self::SourceRead { .. } | Self::Io(_) => 1,
            Self::TaskFailure { .. } => 1,
            Self::Config { .. } | Self::InvalidKind { .. } | Self::Parse { .. } => 2,
            Self::SpawnFailure { .. } => 3,
            Self::ProcessFailure { .. } => 4,
            Self::Watch { .. } => 5,
        }
    }

    /// Convert error to the process exit code
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }

    /// Diagnostic payload of an indexer failure, if this is one
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessFailure { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}

/// Result type alias for cscope-nav operations
pub type Result<T> = std::result::Result<T, NavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failure_message_includes_stderr() {
        let err = NavError::ProcessFailure {
            exit_code: Some(1),
            stderr: "cscope: database not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Indexer exited with code 1: cscope: database not found"
        );
        assert_eq!(err.stderr(), Some("cscope: database not found"));
    }

    #[test]
    fn test_killed_process_reports_signal() {
        let err = NavError::ProcessFailure {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("signal"));
    }

    #[test]
    fn test_exit_codes() {
        let spawn = NavError::SpawnFailure {
            command: "cscope".into(),
            cause: "not found".into(),
        };
        assert_eq!(spawn.exit_status(), 3);
        assert_eq!(
            NavError::Config {
                message: String::new()
            }
            .exit_status(),
            2
        );
        assert!(spawn.stderr().is_none());
    }

    #[test]
    fn test_task_failure_is_its_own_error() {
        let err = NavError::TaskFailure {
            message: "task 7 panicked".into(),
        };
        assert_eq!(err.to_string(), "Query task failed: task 7 panicked");
        assert_eq!(err.exit_status(), 1);
        assert!(!matches!(err, NavError::Io(_)));
    }
}
