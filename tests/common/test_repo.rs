//! TestRepo builder for integration testing
//!
//! Builds a throwaway project tree with C sources and an executable shell
//! script standing in for `cscope`. The script ignores the database and
//! prints whatever canned output the test gives it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

use cscope_nav::NavConfig;

/// Builder for creating test project structures
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty test repository
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Get the path to the test repository root
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a source file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    /// Install a fake indexer running `body` as a shell script
    #[cfg(unix)]
    pub fn with_indexer(&self, body: &str) -> &Self {
        use std::os::unix::fs::PermissionsExt;

        let script = self.indexer_path();
        fs::write(&script, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write indexer");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("Failed to make indexer executable");
        self
    }

    /// Fake indexer printing `output` verbatim on every query
    #[cfg(unix)]
    pub fn with_indexer_output(&self, output: &str) -> &Self {
        self.add_file(".fake/output.txt", output);
        self.with_indexer("cat \"$(dirname \"$0\")/output.txt\"")
    }

    pub fn indexer_path(&self) -> PathBuf {
        let dir = self.dir.path().join(".fake");
        fs::create_dir_all(&dir).expect("Failed to create fake indexer dir");
        dir.join("cscope")
    }

    /// Config pointing at the fake indexer
    pub fn config(&self) -> NavConfig {
        NavConfig {
            indexer: self.indexer_path().display().to_string(),
            ..NavConfig::default()
        }
    }

    /// Write `config` next to the sources and return its path
    pub fn write_config(&self, config: &NavConfig) -> PathBuf {
        let path = self.dir.path().join(".fake/config.toml");
        config.save_to(&path).expect("Failed to write config");
        path
    }

    /// Run the cscope-nav binary against this repo
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        let config = self.write_config(&self.config());
        Command::new(env!("CARGO_BIN_EXE_cscope-nav"))
            .current_dir(self.path())
            .arg("--config")
            .arg(config)
            .args(args)
            .env_remove("RUST_LOG")
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (Option<i32>, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    /// A small C project with one definition and two call sites
    pub fn with_small_project(&self) -> &Self {
        self.add_file(
            "src/foo.c",
            "#include \"foo.h\"\n\nint foo(void) {\n    return bar(1);\n}\n",
        )
        .add_file("src/foo.h", "int foo(void);\n")
        .add_file(
            "src/main.c",
            "#include \"foo.h\"\n\nint main(void) {\n    return foo();\n}\n",
        )
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
