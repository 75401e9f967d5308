//! # Repository Workspaces
//!
//! This module provides the `RepositoryFactory`, which turns a repository
//! descriptor into a fresh `LocalWorkspace` for the backend the descriptor
//! names.
//!
//! ## Design
//!
//! The factory holds the two collaborators every workspace needs:
//!
//! - **`CommandRunner`**: runs the backend's command-line tool.
//! - **`FileStore`**: allocates backing and archive directories.
//!
//! Both are trait objects, so tests inject recording mocks instead of touching
//! git or the disk. The backend is selected by matching on
//! `RepositoryKind`; adding a backend means adding a variant and an arm here.

use std::sync::Arc;

use crate::command::CommandRunner;
use crate::config::{RepositoryConfig, RepositoryKind};
use crate::filesystem::FileStore;
use crate::git::GitClonedRepository;
use crate::workspace::LocalWorkspace;

/// Builds workspaces for repository descriptors.
#[derive(Clone)]
pub struct RepositoryFactory {
    cmd: Arc<dyn CommandRunner>,
    filesystem: Arc<dyn FileStore>,
}

impl RepositoryFactory {
    pub fn new(cmd: Arc<dyn CommandRunner>, filesystem: Arc<dyn FileStore>) -> Self {
        Self { cmd, filesystem }
    }

    /// A new, uninitialized workspace for repository `name`.
    pub fn workspace(
        &self,
        name: &str,
        config: Arc<RepositoryConfig>,
    ) -> Box<dyn LocalWorkspace> {
        let url = config.url.clone();
        self.workspace_from_url(name, config, &url)
    }

    /// A new, uninitialized workspace that clones from `url` rather than the
    /// descriptor's URL, e.g. a locally modified working copy.
    pub fn workspace_from_url(
        &self,
        name: &str,
        config: Arc<RepositoryConfig>,
        url: &str,
    ) -> Box<dyn LocalWorkspace> {
        match config.kind {
            RepositoryKind::Git => Box::new(GitClonedRepository::with_url(
                self.cmd.clone(),
                self.filesystem.clone(),
                name,
                config,
                url,
            )),
        }
    }
}
