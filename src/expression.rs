//! # Codebase Expressions
//!
//! An `Expression` lazily describes a codebase: a repository at a revision,
//! optionally passed through a chain of edits and translations. Building an
//! expression has no side effects; `create_codebase` realizes it on demand.
//!
//! ## Shapes
//!
//! - **`Repository`**: a repository name and a revision (possibly `HEAD`).
//! - **`Edited`**: a child expression plus an `Operation` naming an editor and
//!   its options.
//! - **`Translated`**: a child expression plus an `Operation` naming the target
//!   project space.
//!
//! Nodes are immutable. `edit_with` and `translate_to` return a new node that
//! shares the unchanged original as its child, so expressions derived from a
//! common prefix share structure.
//!
//! ## Canonical form
//!
//! ```text
//! foo(revision=abc123)|scrub(mode=strict)>public
//! ```
//!
//! The base renders as `name(revision=X)`, each edit appends
//! `|editor(key=value,...)` with options in insertion order, and each
//! translation appends `>project_space`.
//!
//! ## Evaluation
//!
//! Nothing is memoized: realizing the same expression twice may allocate two
//! independent trees. Resolution failures (an unknown repository, editor or
//! translator) are `CodebaseCreation` errors; failures of git, tar or the
//! filesystem propagate unchanged as `EnvironmentProblem`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};

use crate::codebase::Codebase;
use crate::context::ProjectContext;
use crate::error::{Error, Result};
use crate::filesystem::Lifetime;
use crate::revision::Revision;

/// A named edit or translation request plus its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    name: String,
    options: IndexMap<String, String>,
}

impl Operation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: IndexMap::new(),
        }
    }

    /// An operation with `options` in the given order. A repeated key keeps
    /// its first position and its last value.
    pub fn with_options<I, K, V>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            options: options
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.options.is_empty() {
            let rendered: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "({})", rendered.join(","))?;
        }
        Ok(())
    }
}

/// A lazily evaluated description of a codebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Repository {
        name: String,
        revision: Revision,
    },
    Edited {
        child: Arc<Expression>,
        operation: Operation,
    },
    Translated {
        child: Arc<Expression>,
        operation: Operation,
    },
}

impl Expression {
    /// The base expression: repository `name` at `revision`.
    pub fn repository(name: impl Into<String>, revision: Revision) -> Self {
        Expression::Repository {
            name: name.into(),
            revision,
        }
    }

    /// This expression translated into `project_space`.
    pub fn translate_to(&self, project_space: impl Into<String>) -> Self {
        self.translate_with(Operation::new(project_space))
    }

    /// This expression translated as described by `operation`, whose name is
    /// the target project space.
    pub fn translate_with(&self, operation: Operation) -> Self {
        Expression::Translated {
            child: Arc::new(self.clone()),
            operation,
        }
    }

    /// This expression edited by `editor` with `options`.
    pub fn edit_with<I, K, V>(&self, editor: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.edit_with_operation(Operation::with_options(editor, options))
    }

    pub fn edit_with_operation(&self, operation: Operation) -> Self {
        Expression::Edited {
            child: Arc::new(self.clone()),
            operation,
        }
    }

    /// The wrapped child, if this is not a base expression.
    pub fn child(&self) -> Option<&Arc<Expression>> {
        match self {
            Expression::Repository { .. } => None,
            Expression::Edited { child, .. } | Expression::Translated { child, .. } => Some(child),
        }
    }

    /// The project space the realized codebase will be in, computed without
    /// realizing anything.
    pub fn project_space(&self, ctx: &ProjectContext) -> Result<String> {
        match self {
            Expression::Repository { name, .. } => ctx
                .config()
                .repository(name)
                .map(|config| config.project_space.clone())
                .ok_or_else(|| unknown_repository(name, ctx)),
            Expression::Edited { child, .. } => child.project_space(ctx),
            Expression::Translated { operation, .. } => Ok(operation.name().to_string()),
        }
    }

    /// Realizes this expression into a fresh tree on disk.
    pub fn create_codebase(&self, ctx: &ProjectContext) -> Result<Codebase> {
        debug!("creating codebase for {}", self);
        let codebase = match self {
            Expression::Repository { name, revision } => {
                self.create_repository_codebase(ctx, name, revision)?
            }
            Expression::Edited { child, operation } => {
                let editor = ctx.editor(operation.name()).ok_or_else(|| {
                    Error::codebase_creation(format!(
                        "No editor '{}' in project '{}' (needed by {})",
                        operation.name(),
                        ctx.config().name,
                        self
                    ))
                })?;
                let input = child.create_codebase(ctx)?;
                let path = editor.edit(input.path(), ctx, operation.options())?;
                Codebase::new(
                    path,
                    input.project_space(),
                    self.clone(),
                    input.revision(),
                )
            }
            Expression::Translated { child, operation } => {
                let from = child.project_space(ctx)?;
                let to = operation.name();
                if from == to {
                    let input = child.create_codebase(ctx)?;
                    Codebase::new(input.path().to_path_buf(), to, self.clone(), input.revision())
                } else {
                    let translator = ctx.translator(&from, to).ok_or_else(|| {
                        Error::codebase_creation(format!(
                            "No translator from '{}' to '{}' in project '{}' (needed by {})",
                            from,
                            to,
                            ctx.config().name,
                            self
                        ))
                    })?;
                    let input = child.create_codebase(ctx)?;
                    let path = translator.translate(input.path(), ctx, operation.options())?;
                    Codebase::new(path, to, self.clone(), input.revision())
                }
            }
        };
        info!("created codebase {} at {}", self, codebase.path().display());
        Ok(codebase)
    }

    fn create_repository_codebase(
        &self,
        ctx: &ProjectContext,
        name: &str,
        revision: &Revision,
    ) -> Result<Codebase> {
        let mut workspace = ctx.new_workspace(name)?;
        workspace.clone_locally_at_head(Lifetime::Persistent)?;
        if let Revision::Id(id) = revision {
            workspace.update_to_revision(id)?;
        }

        // After a pin, HEAD is the pinned revision.
        let resolved = workspace.resolve_revision(&Revision::Head)?;
        let path = workspace.archive_at_revision(&Revision::Head)?;
        Ok(Codebase::new(
            path,
            workspace.config().project_space.clone(),
            self.clone(),
            resolved,
        ))
    }
}

fn unknown_repository(name: &str, ctx: &ProjectContext) -> Error {
    Error::codebase_creation(format!(
        "No repository '{}' in project '{}'",
        name,
        ctx.config().name
    ))
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Repository { name, revision } => {
                write!(f, "{}(revision={})", name, revision)
            }
            Expression::Edited { child, operation } => write!(f, "{}|{}", child, operation),
            Expression::Translated { child, operation } => {
                write!(f, "{}>{}", child, operation.name())
            }
        }
    }
}
