//! # Editors
//!
//! An editor turns one materialized tree into a new one. Editors never modify
//! their input: each run copies the input into a fresh current-task directory
//! and works on the copy, so a codebase can be fed to several editors.
//!
//! Two implementations ship with the crate:
//!
//! - **`IdentityEditor`**: the copy, and nothing else.
//! - **`ShellEditor`**: the copy, then `bash -c <command>` run inside it. The
//!   editor options reach the script as positional `key=value` arguments
//!   (`$1`, `$2`, ...), in insertion order.
//!
//! Other editors (scrubbers, renamers, patchers) plug in by implementing
//! `Editor` and registering with `ProjectContext::register_editor`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::config::EditorConfig;
use crate::context::ProjectContext;
use crate::error::{Error, Result};
use crate::filesystem::Lifetime;

/// Produces a new file tree from an existing one.
pub trait Editor: Send + Sync {
    /// A short human-readable description, used in logs.
    fn description(&self) -> String;

    /// Edits a copy of the tree at `input` and returns the copy's location.
    fn edit(
        &self,
        input: &Path,
        ctx: &ProjectContext,
        options: &IndexMap<String, String>,
    ) -> Result<PathBuf>;
}

/// Instantiates the editor described by `config`.
pub fn from_config(name: &str, config: &EditorConfig) -> Arc<dyn Editor> {
    match config {
        EditorConfig::Identity => Arc::new(IdentityEditor::new(name)),
        EditorConfig::Shell { command } => Arc::new(ShellEditor::new(name, command.clone())),
    }
}

/// Copies `input` into a fresh current-task directory named after `prefix`.
fn copy_to_fresh_dir(input: &Path, ctx: &ProjectContext, prefix: &str) -> Result<PathBuf> {
    let filesystem = ctx.file_store();
    let output = filesystem.temporary_directory(prefix, Lifetime::CurrentTask)?;
    filesystem.copy_dir(input, &output)?;
    Ok(output)
}

/// Copies the codebase unchanged.
#[derive(Debug, Clone)]
pub struct IdentityEditor {
    name: String,
}

impl IdentityEditor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Editor for IdentityEditor {
    fn description(&self) -> String {
        format!("identity editor '{}'", self.name)
    }

    fn edit(
        &self,
        input: &Path,
        ctx: &ProjectContext,
        _options: &IndexMap<String, String>,
    ) -> Result<PathBuf> {
        copy_to_fresh_dir(input, ctx, &format!("identity_run_{}_", self.name))
            .map_err(|e| Error::environment(format!("Running {} failed", self.description()), e))
    }
}

/// Runs a bash command inside a copy of the codebase.
#[derive(Debug, Clone)]
pub struct ShellEditor {
    name: String,
    command: String,
}

impl ShellEditor {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    fn arguments(&self, options: &IndexMap<String, String>) -> Vec<String> {
        let mut args = vec!["-c".to_string(), self.command.clone(), self.name.clone()];
        args.extend(options.iter().map(|(k, v)| format!("{}={}", k, v)));
        args
    }
}

impl Editor for ShellEditor {
    fn description(&self) -> String {
        format!("shell editor '{}' ({})", self.name, self.command)
    }

    fn edit(
        &self,
        input: &Path,
        ctx: &ProjectContext,
        options: &IndexMap<String, String>,
    ) -> Result<PathBuf> {
        let result = copy_to_fresh_dir(input, ctx, &format!("shell_run_{}_", self.name))
            .and_then(|output| {
                debug!("running {} in {}", self.description(), output.display());
                ctx.command_runner()
                    .run("bash", &self.arguments(options), &output)?;
                Ok(output)
            });
        result.map_err(|e| Error::environment(format!("Running {} failed", self.description()), e))
    }
}
