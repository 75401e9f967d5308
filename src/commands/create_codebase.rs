//! Create-codebase command implementation
//!
//! Builds an expression from the command line (a repository at a revision,
//! any number of edits, an optional translation), realizes it, and reports
//! where the resulting tree landed.

use anyhow::{Context, Result};
use clap::Args;
use log::warn;
use std::path::PathBuf;
use std::sync::Arc;

use repo_snapshot::codebase::Codebase;
use repo_snapshot::command::SystemCommandRunner;
use repo_snapshot::config::ProjectConfig;
use repo_snapshot::context::ProjectContext;
use repo_snapshot::expression::{Expression, Operation};
use repo_snapshot::filesystem::{DiskFileStore, Lifetime, TMP_ROOT_ENV};
use repo_snapshot::revision::Revision;

/// Arguments for the create-codebase command
#[derive(Args, Debug)]
pub struct CreateCodebaseArgs {
    /// Path to the project file
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = "REPO_SNAPSHOT_CONFIG",
        default_value = ".repo-snapshot.yaml"
    )]
    pub config: PathBuf,

    /// Repository to start from, as named in the project file
    #[arg(short, long, value_name = "NAME")]
    pub repository: String,

    /// Revision to pin the repository to (defaults to the branch tip)
    #[arg(long, value_name = "REV")]
    pub revision: Option<String>,

    /// Editor to apply, in order: NAME or NAME:KEY=VALUE,KEY=VALUE
    #[arg(short, long, value_name = "EDITOR", value_parser = parse_operation)]
    pub edit: Vec<Operation>,

    /// Project space to translate the result into, after all edits
    #[arg(short, long, value_name = "SPACE")]
    pub translate: Option<String>,

    /// Directory under which temporary clones and snapshots are created
    #[arg(long, value_name = "DIR", env = TMP_ROOT_ENV)]
    pub tmp_root: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Keep the intermediate clones instead of removing them on exit
    #[arg(long)]
    pub keep: bool,
}

/// Parses `NAME` or `NAME:KEY=VALUE,KEY=VALUE` into an editor operation.
pub fn parse_operation(value: &str) -> std::result::Result<Operation, String> {
    let (name, options) = match value.split_once(':') {
        Some((name, options)) => (name.trim(), Some(options)),
        None => (value.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("missing editor name in '{}'", value));
    }

    let mut pairs = Vec::new();
    for option in options.into_iter().flat_map(|o| o.split(',')) {
        let (key, val) = option
            .split_once('=')
            .ok_or_else(|| format!("option '{}' is not KEY=VALUE", option))?;
        if key.trim().is_empty() {
            return Err(format!("option '{}' has an empty key", option));
        }
        pairs.push((key.trim().to_string(), val.to_string()));
    }
    Ok(Operation::with_options(name, pairs))
}

/// Builds the expression described by `args`.
pub fn build_expression(args: &CreateCodebaseArgs) -> Expression {
    let mut expression =
        Expression::repository(&args.repository, Revision::parse(args.revision.as_deref()));
    for operation in &args.edit {
        expression = expression.edit_with_operation(operation.clone());
    }
    if let Some(space) = &args.translate {
        expression = expression.translate_to(space.clone());
    }
    expression
}

/// Combines the evaluation outcome with the clone cleanup. A failed evaluation
/// is reported as such even when the cleanup failed too.
fn settle(
    expression: &Expression,
    result: repo_snapshot::error::Result<Codebase>,
    cleanup: repo_snapshot::error::Result<()>,
) -> Result<Codebase> {
    match result {
        Ok(codebase) => {
            cleanup.context("Failed to remove temporary clones")?;
            Ok(codebase)
        }
        Err(e) => {
            if let Err(cleanup_err) = cleanup {
                warn!("Failed to remove temporary clones: {}", cleanup_err);
            }
            let context = format!("Failed to create codebase {}", expression);
            Err(anyhow::Error::new(e).context(context))
        }
    }
}

/// Execute the create-codebase command
pub fn execute(args: CreateCodebaseArgs) -> Result<()> {
    let config = ProjectConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load project file {}", args.config.display()))?;

    let tmp_root = args
        .tmp_root
        .clone()
        .unwrap_or_else(DiskFileStore::default_root);
    let store = Arc::new(DiskFileStore::new(tmp_root));
    let ctx = ProjectContext::new(config, Arc::new(SystemCommandRunner), store.clone());

    let expression = build_expression(&args);
    let result = expression.create_codebase(&ctx);

    // The snapshot itself is current-task scoped and stays.
    let cleanup = if args.keep {
        Ok(())
    } else {
        store.clean_up(Lifetime::Persistent)
    };
    let codebase = settle(&expression, result, cleanup)?;

    if args.json {
        let report = serde_json::json!({
            "expression": expression.to_string(),
            "revision": codebase.revision(),
            "project_space": codebase.project_space(),
            "path": codebase.path(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("✅ Created codebase {}", expression);
        println!("   revision:      {}", codebase.revision());
        println!("   project space: {}", codebase.project_space());
        println!("   path:          {}", codebase.path().display());
    }

    Ok(())
}
