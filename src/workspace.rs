//! # Local Workspaces
//!
//! A workspace owns exactly one on-disk checkout of one repository and moves it
//! through a small state machine:
//!
//! ```text
//! Uninitialized --clone_locally_at_head--> ClonedAtHead --update_to_revision--> Pinned(r)
//! ```
//!
//! `Pinned` is terminal for an instance. Archiving is a side operation that is
//! allowed from either cloned state and never changes the state.
//!
//! `LocalWorkspace` is the capability every version-control backend
//! implements; `repository::RepositoryFactory` picks the implementation from
//! the descriptor's kind.
//!
//! ## Ownership
//!
//! The state-changing operations take `&mut self`, so the borrow checker
//! enforces the single-owner requirement: an instance can only be shared across
//! threads behind a lock the caller chooses. Archiving takes `&self` and may run
//! concurrently with other archives of the same instance. Distinct instances
//! share no mutable state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RepositoryConfig;
use crate::error::Result;
use crate::filesystem::Lifetime;
use crate::revision::{Revision, HEAD};

/// Where a workspace is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceState {
    Uninitialized,
    /// Cloned; the revision marker is the `HEAD` sentinel.
    ClonedAtHead { dir: PathBuf },
    /// Pinned to a concrete revision. Never goes back to `HEAD`.
    Pinned { dir: PathBuf, revision: String },
}

impl WorkspaceState {
    /// The backing directory, once cloned.
    pub fn backing_dir(&self) -> Option<&Path> {
        match self {
            WorkspaceState::Uninitialized => None,
            WorkspaceState::ClonedAtHead { dir } | WorkspaceState::Pinned { dir, .. } => Some(dir),
        }
    }

    /// The current revision marker: `HEAD` right after a clone, the pinned
    /// revision afterwards.
    pub fn revision_marker(&self) -> Option<&str> {
        match self {
            WorkspaceState::Uninitialized => None,
            WorkspaceState::ClonedAtHead { .. } => Some(HEAD),
            WorkspaceState::Pinned { revision, .. } => Some(revision),
        }
    }

    pub fn is_cloned(&self) -> bool {
        !matches!(self, WorkspaceState::Uninitialized)
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceState::Uninitialized => write!(f, "uninitialized"),
            WorkspaceState::ClonedAtHead { .. } => write!(f, "cloned at HEAD"),
            WorkspaceState::Pinned { revision, .. } => write!(f, "pinned at {}", revision),
        }
    }
}

/// One on-disk checkout of one repository.
pub trait LocalWorkspace: Send {
    fn repository_name(&self) -> &str;

    fn config(&self) -> &Arc<RepositoryConfig>;

    fn state(&self) -> &WorkspaceState;

    /// Clones the configured branch into a fresh backing directory allocated
    /// with `lifetime`.
    ///
    /// Fails with `InvariantViolation` unless the workspace is uninitialized,
    /// and with `EnvironmentProblem` if any command or I/O step fails. Nothing
    /// is cleaned up after a failure.
    fn clone_locally_at_head(&mut self, lifetime: Lifetime) -> Result<()>;

    /// Pins the clone to `revision` on a dedicated branch.
    ///
    /// Allowed exactly once, straight after the clone: any other state (even
    /// a previous pin to the same revision) is an `InvariantViolation`.
    fn update_to_revision(&mut self, revision: &str) -> Result<()>;

    /// Exports `revision` into a brand-new directory scoped to the current
    /// task, free of version-control metadata. `Revision::Head` means the tip
    /// of whatever the workspace currently has checked out.
    fn archive_at_revision(&self, revision: &Revision) -> Result<PathBuf>;

    /// Resolves `revision` to the backend-native identifier it currently
    /// points at.
    fn resolve_revision(&self, revision: &Revision) -> Result<String>;

    /// The backing directory. An `InvariantViolation` before the first clone.
    fn local_temp_dir(&self) -> Result<&Path>;
}
