//! # Error Handling
//!
//! This module defines the centralized error type for `repo-snapshot`. It uses
//! the `thiserror` library to build a single `Error` enum whose variants fall
//! into a few distinct categories, so callers can tell a bad request apart
//! from broken infrastructure.
//!
//! ## Categories
//!
//! - **Underlying faults**: `CommandFailed` (an external process exited
//!   non-zero) and `Io` (a filesystem operation failed). These are produced by
//!   the `command` and `filesystem` modules.
//!
//! - **`EnvironmentProblem`**: the fatal category a workspace wraps every
//!   underlying fault into, annotated with the operation, repository, backing
//!   directory and revision involved.
//!
//! - **`InvariantViolation`**: a workspace method was called in the wrong
//!   state (update before clone, a second update, archive before clone). This
//!   is a programming error and must never be retried.
//!
//! - **`CodebaseCreation`**: an expression could not be resolved, e.g. it names
//!   an unknown repository, editor or translator.
//!
//! - **Configuration**: `ConfigParse` and `Yaml` for project files.
//!
//! There is no retry policy anywhere in the crate: the first failing command
//! or I/O step aborts the whole operation.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for repo-snapshot operations
#[derive(Error, Debug)]
pub enum Error {
    /// An external command terminated unsuccessfully.
    #[error(
        "Command failed: {program} {} (exit status: {}): {stderr}",
        args.join(" "),
        exit_status(exit_code)
    )]
    CommandFailed {
        program: String,
        args: Vec<String>,
        /// `None` when the process was killed by a signal or never started.
        exit_code: Option<i32>,
        stderr: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// A command or I/O fault surfaced at the workspace boundary.
    #[error("{message}: {source}")]
    EnvironmentProblem {
        message: String,
        #[source]
        source: Box<Error>,
    },

    /// A workspace or store was driven in an order its state machine forbids.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// An expression could not be resolved into a codebase.
    #[error("Could not create codebase: {message}")]
    CodebaseCreation { message: String },

    /// An error occurred while parsing or validating a project configuration.
    #[error("Configuration parsing error: {message}{}", hint_suffix(hint))]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn exit_status(exit_code: &Option<i32>) -> String {
    exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

impl Error {
    /// Builds an `Io` fault for `path` out of a `std::io::Error`.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Wraps an underlying fault into an `EnvironmentProblem`.
    pub fn environment(message: impl Into<String>, source: Error) -> Self {
        Error::EnvironmentProblem {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn codebase_creation(message: impl Into<String>) -> Self {
        Error::CodebaseCreation {
            message: message.into(),
        }
    }

    pub fn is_environment_problem(&self) -> bool {
        matches!(self, Error::EnvironmentProblem { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation { .. })
    }

    pub fn is_codebase_creation(&self) -> bool {
        matches!(self, Error::CodebaseCreation { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
