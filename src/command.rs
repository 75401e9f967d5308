//! # Command Execution
//!
//! Every external program this crate drives (`git`, `tar`, `bash`) goes
//! through the `CommandRunner` trait. The system implementation shells out via
//! `std::process::Command`, which picks up the user's SSH keys, credential
//! helpers and `~/.gitconfig` exactly as an interactive `git` would. Tests swap
//! in a recording mock.

use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// Runs an OS-level command and captures its standard output.
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` in `working_dir`.
    ///
    /// Returns standard output on success. A non-zero exit (or a failure to
    /// start the process at all) yields `Error::CommandFailed` carrying the exit
    /// status and standard error.
    fn run(&self, program: &str, args: &[String], working_dir: &Path) -> Result<String>;
}

/// The default implementation of `CommandRunner`, which spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String], working_dir: &Path) -> Result<String> {
        debug!(
            "running `{} {}` in {}",
            program,
            args.join(" "),
            working_dir.display()
        );

        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .map_err(|e| Error::CommandFailed {
                program: program.to_string(),
                args: args.to_vec(),
                exit_code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::CommandFailed {
                program: program.to_string(),
                args: args.to_vec(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Convenience for building argument lists from string literals.
pub fn args<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
