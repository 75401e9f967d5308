//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which parses a project
//! file and checks it without cloning anything: every repository has a usable
//! URL and relative checkout paths, shell editors have commands, and
//! translators connect two distinct project spaces.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_snapshot::config::ProjectConfig;

/// Validate a project file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the project file to validate.
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "REPO_SNAPSHOT_CONFIG",
        default_value = ".repo-snapshot.yaml"
    )]
    pub config: PathBuf,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("🔍 Validating project file: {}", args.config.display());

    let config = match ProjectConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            println!("❌ Validation failed");
            return Err(e.into());
        }
    };

    println!("✅ Project '{}' is valid", config.name);
    println!("   {} repositories", config.repositories.len());
    for (name, repository) in &config.repositories {
        let branch = repository.branch.as_deref().unwrap_or("(default)");
        println!("     {} <- {} [{}]", name, repository.url, branch);
    }
    println!("   {} editors", config.editors.len());
    println!("   {} translators", config.translators.len());
    Ok(())
}
