//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Repository Snapshot - Materialize pinned, edited or translated snapshots of repositories
#[derive(Parser, Debug)]
#[command(name = "repo-snapshot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Materialize a codebase from a repository, edits and a translation
    CreateCodebase(commands::create_codebase::CreateCodebaseArgs),

    /// Parse and validate a project file
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .format_timestamp(None)
        .init();

        match self.command {
            Commands::CreateCodebase(args) => commands::create_codebase::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
        }
    }
}
