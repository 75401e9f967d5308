//! # Git Workspaces
//!
//! `GitClonedRepository` is the git implementation of `LocalWorkspace`: a
//! clone on local disk driven through the system `git` command, so SSH keys,
//! credential helpers and `~/.gitconfig` apply as usual.
//!
//! The clone is built with `git init` + `git remote add` + `git pull` rather
//! than `git clone`, so a sparse-checkout filter can be put in place before the
//! first fetch populates the working tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};

use crate::command::{args, CommandRunner};
use crate::config::RepositoryConfig;
use crate::error::{Error, Result};
use crate::filesystem::{FileStore, Lifetime};
use crate::revision::Revision;
use crate::workspace::{LocalWorkspace, WorkspaceState};

/// Prefix of the branches created when pinning a clone to a revision. The
/// full branch name is this prefix followed by the revision, e.g.
/// `moe_writing_branch_from_abc123`.
pub const MIGRATIONS_BRANCH_PREFIX: &str = "moe_writing_branch_from_";

/// Branch pulled when the descriptor does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Name of the remote every clone registers its source URL under.
const REMOTE: &str = "origin";

/// Location of the sparse-checkout filter inside a clone.
pub fn sparse_checkout_file(clone_dir: &Path) -> PathBuf {
    clone_dir.join(".git").join("info").join("sparse-checkout")
}

/// The sparse-checkout filter for `paths`: one root-anchored pattern per
/// line, newline-terminated. Unanchored, git would match `src` at any depth.
pub fn sparse_checkout_patterns(paths: &[String]) -> String {
    paths
        .iter()
        .map(|path| {
            if path.starts_with('/') {
                format!("{}\n", path)
            } else {
                format!("/{}\n", path)
            }
        })
        .collect()
}

/// The branch `update_to_revision` creates for `revision`.
pub fn migration_branch_name(revision: &str) -> String {
    format!("{}{}", MIGRATIONS_BRANCH_PREFIX, revision)
}

/// A `git clone` to local disk.
pub struct GitClonedRepository {
    cmd: Arc<dyn CommandRunner>,
    filesystem: Arc<dyn FileStore>,
    repository_name: String,
    config: Arc<RepositoryConfig>,
    /// Where to clone from. Differs from `config.url` when snapshotting a
    /// locally modified working copy.
    url: String,
    state: WorkspaceState,
}

impl GitClonedRepository {
    pub fn new(
        cmd: Arc<dyn CommandRunner>,
        filesystem: Arc<dyn FileStore>,
        repository_name: impl Into<String>,
        config: Arc<RepositoryConfig>,
    ) -> Self {
        let url = config.url.clone();
        Self::with_url(cmd, filesystem, repository_name, config, url)
    }

    /// Like `new`, but clones from `url` instead of the descriptor's URL.
    pub fn with_url(
        cmd: Arc<dyn CommandRunner>,
        filesystem: Arc<dyn FileStore>,
        repository_name: impl Into<String>,
        config: Arc<RepositoryConfig>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            cmd,
            filesystem,
            repository_name: repository_name.into(),
            config,
            url: url.into(),
            state: WorkspaceState::Uninitialized,
        }
    }

    /// The URL this workspace clones from.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn run_git(&self, dir: &Path, git_args: Vec<String>) -> Result<String> {
        self.cmd.run("git", &git_args, dir)
    }

    /// Turns `dir` into an empty repository with the source URL as its only
    /// remote, plus the sparse-checkout filter when checkout paths are set.
    fn init_local(&self, dir: &Path) -> Result<()> {
        self.filesystem.make_dirs(dir)?;
        self.run_git(dir, args(["init".to_string(), dir.display().to_string()]))?;
        self.run_git(dir, args(["remote", "add", REMOTE, self.url.as_str()]))?;

        if !self.config.checkout_paths.is_empty() {
            self.run_git(dir, args(["config", "core.sparseCheckout", "true"]))?;
            self.filesystem.write(
                &sparse_checkout_patterns(&self.config.checkout_paths),
                &sparse_checkout_file(dir),
            )?;
        }
        Ok(())
    }

    /// `git pull [--depth=1] origin <what>` in `dir`.
    fn pull(&self, dir: &Path, what: &str) -> Result<()> {
        let mut pull_args = args(["pull"]);
        if self.config.shallow_checkout {
            pull_args.push("--depth=1".to_string());
        }
        pull_args.push(REMOTE.to_string());
        pull_args.push(what.to_string());
        self.run_git(dir, pull_args)?;
        Ok(())
    }

    fn clone_dir_prefix(&self) -> String {
        match &self.config.branch {
            Some(branch) => format!("git_clone_{}_{}_", self.repository_name, branch),
            None => format!("git_clone_{}_", self.repository_name),
        }
    }

    fn cloned_dir(&self, operation: &str) -> Result<&Path> {
        self.state.backing_dir().ok_or_else(|| {
            Error::invariant(format!(
                "{} on repository '{}' requires a local clone",
                operation, self.repository_name
            ))
        })
    }

    /// Exports `revision` as a tarball and unpacks it into `destination`.
    fn archive_with_tarball(
        &self,
        clone_dir: &Path,
        revision: &str,
        destination: &Path,
    ) -> Result<()> {
        // Only used for its (unique) name; git writes the file itself.
        let tarball = self.filesystem.temporary_directory(
            &format!("git_tarball_{}_{}.tar.", self.repository_name, revision),
            Lifetime::CurrentTask,
        )?;

        // git can only export an archive blob, never a plain directory.
        self.run_git(
            clone_dir,
            args([
                "archive".to_string(),
                "--format=tar".to_string(),
                format!("--output={}", tarball.display()),
                revision.to_string(),
            ]),
        )?;

        self.cmd.run(
            "tar",
            &args([
                "xf".to_string(),
                tarball.display().to_string(),
                "-C".to_string(),
                destination.display().to_string(),
            ]),
            destination,
        )?;
        Ok(())
    }

    /// Clones the source again into `destination` with the sparse filter,
    /// checks out `revision` and strips the `.git` directory.
    fn archive_with_sparse_clone(
        &self,
        clone_dir: &Path,
        revision: &Revision,
        destination: &Path,
    ) -> Result<()> {
        // The fresh clone's HEAD would be the remote's tip, not ours.
        let revision = match revision {
            Revision::Head => self
                .run_git(clone_dir, args(["rev-parse", "HEAD"]))?
                .trim()
                .to_string(),
            Revision::Id(id) => id.clone(),
        };

        self.init_local(destination)?;
        self.pull(destination, &revision)?;
        self.run_git(destination, args(["checkout".to_string(), revision]))?;
        self.filesystem.delete_recursively(&destination.join(".git"))?;
        Ok(())
    }
}

impl LocalWorkspace for GitClonedRepository {
    fn repository_name(&self) -> &str {
        &self.repository_name
    }

    fn config(&self) -> &Arc<RepositoryConfig> {
        &self.config
    }

    fn state(&self) -> &WorkspaceState {
        &self.state
    }

    fn clone_locally_at_head(&mut self, lifetime: Lifetime) -> Result<()> {
        if self.state.is_cloned() {
            return Err(Error::invariant(format!(
                "repository '{}' is already cloned ({})",
                self.repository_name, self.state
            )));
        }

        let branch = self
            .config
            .branch
            .clone()
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let result = self
            .filesystem
            .temporary_directory(&self.clone_dir_prefix(), lifetime)
            .and_then(|dir| {
                self.init_local(&dir)?;
                self.pull(&dir, &branch)?;
                Ok(dir)
            });

        match result {
            Ok(dir) => {
                debug!(
                    "cloned {} ({}) into {}",
                    self.repository_name,
                    self.url,
                    dir.display()
                );
                self.state = WorkspaceState::ClonedAtHead { dir };
                Ok(())
            }
            Err(e) => Err(Error::environment(
                format!("Could not clone from git repo at {}", self.url),
                e,
            )),
        }
    }

    fn update_to_revision(&mut self, revision: &str) -> Result<()> {
        let dir = match &self.state {
            WorkspaceState::ClonedAtHead { dir } => dir.clone(),
            other => {
                return Err(Error::invariant(format!(
                    "repository '{}' can only be updated once, straight after a clone at HEAD \
                     (currently {})",
                    self.repository_name, other
                )))
            }
        };
        if Revision::parse(Some(revision)).is_head() {
            return Err(Error::invariant(format!(
                "repository '{}' cannot be pinned to the HEAD sentinel",
                self.repository_name
            )));
        }

        let result = (|| -> Result<()> {
            let head = self.run_git(&dir, args(["rev-parse", "HEAD"]))?;
            // Already at the branch tip: nothing to check out.
            if head.trim() != revision {
                if self.config.shallow_checkout {
                    // The shallow history may not contain `revision`.
                    self.run_git(&dir, args(["fetch", "--unshallow"]))?;
                }
                self.run_git(
                    &dir,
                    args([
                        "checkout".to_string(),
                        revision.to_string(),
                        "-b".to_string(),
                        migration_branch_name(revision),
                    ]),
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                debug!("pinned {} to {}", self.repository_name, revision);
                self.state = WorkspaceState::Pinned {
                    dir,
                    revision: revision.to_string(),
                };
                Ok(())
            }
            Err(e) => Err(Error::environment(
                format!("Could not update git repo at {}", dir.display()),
                e,
            )),
        }
    }

    fn archive_at_revision(&self, revision: &Revision) -> Result<PathBuf> {
        let clone_dir = self.cloned_dir("archive_at_revision")?;

        let result = (|| -> Result<PathBuf> {
            let destination = self.filesystem.temporary_directory(
                &format!("git_archive_{}_{}_", self.repository_name, revision),
                Lifetime::CurrentTask,
            )?;
            self.filesystem.make_dirs(&destination)?;

            if self.config.checkout_paths.is_empty() {
                self.archive_with_tarball(clone_dir, revision.as_str(), &destination)?;
            } else {
                self.archive_with_sparse_clone(clone_dir, revision, &destination)?;
            }
            Ok(destination)
        })();

        match result {
            Ok(destination) => {
                info!(
                    "archived {} at {} into {}",
                    self.repository_name,
                    revision,
                    destination.display()
                );
                Ok(destination)
            }
            Err(e) => Err(Error::environment(
                format!(
                    "Could not archive {} clone at {} to revision {}",
                    self.repository_name,
                    clone_dir.display(),
                    revision
                ),
                e,
            )),
        }
    }

    fn resolve_revision(&self, revision: &Revision) -> Result<String> {
        let clone_dir = self.cloned_dir("resolve_revision")?;
        self.run_git(clone_dir, args(["rev-parse".to_string(), revision.to_string()]))
            .map(|out| out.trim().to_string())
            .map_err(|e| {
                Error::environment(
                    format!(
                        "Could not resolve revision {} in {} clone at {}",
                        revision,
                        self.repository_name,
                        clone_dir.display()
                    ),
                    e,
                )
            })
    }

    fn local_temp_dir(&self) -> Result<&Path> {
        self.cloned_dir("local_temp_dir")
    }
}
