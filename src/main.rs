//! # Repository Snapshot CLI
//!
//! This is the binary entry point for the `repo-snapshot` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging.
//! - Executing the appropriate command and translating top-level errors into
//!   user-friendly output.
//!
//! The core logic lives in the `repo_snapshot` library crate; the binary is a
//! thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
