//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures that build real git repositories in
//! temporary directories, so workspace and CLI tests run against `git`
//! without any network access.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let source = SourceRepo::new();
//! let first = source.commit(&[("README", "one")], "first");
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{files_under, SourceRepo, TestFixture};
}

/// Runs `git` in `dir` with a fixed identity, panicking on failure.
#[allow(dead_code)]
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A source repository on branch `master` that tests clone from.
#[allow(dead_code)]
pub struct SourceRepo {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl SourceRepo {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        git(temp_dir.path(), &["init"]);
        git(temp_dir.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
        // Lets clones fetch an arbitrary commit by hash.
        git(
            temp_dir.path(),
            &["config", "uploadpack.allowAnySHA1InWant", "true"],
        );
        Self { temp_dir }
    }

    /// Writes `files`, commits everything and returns the new commit hash.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> String {
        for (path, content) in files {
            self.temp_dir
                .child(path)
                .write_str(content)
                .expect("Failed to write file");
        }
        git(self.path(), &["add", "-A"]);
        git(self.path(), &["commit", "-m", message]);
        git(self.path(), &["rev-parse", "HEAD"])
    }

    /// Deletes `path` from the working tree; it disappears with the next commit.
    pub fn remove(&self, path: &str) {
        std::fs::remove_file(self.path().join(path)).expect("Failed to remove file");
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A `file://` URL, so shallow fetches behave as they would remotely.
    pub fn url(&self) -> String {
        format!("file://{}", self.path().display())
    }
}

impl Default for SourceRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Relative paths of every file under `root`, sorted, `.git` included if
/// present.
#[allow(dead_code)]
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// A temporary directory holding a project file, plus a scratch root for the
/// file store.
#[allow(dead_code)]
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.repo-snapshot.yaml` project file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".repo-snapshot.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Where the file store should put clones and snapshots.
    pub fn tmp_root(&self) -> PathBuf {
        self.temp_dir.path().join("tmp")
    }

    /// Create a command configured to run in this fixture's directory, with
    /// the scratch root pointed inside the fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-snapshot");
        cmd.current_dir(self.path())
            .env("REPO_SNAPSHOT_TMP", self.tmp_root())
            .env_remove("REPO_SNAPSHOT_CONFIG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
