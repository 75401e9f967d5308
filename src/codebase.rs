//! Materialized codebases.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::expression::Expression;
use crate::filesystem::list_files;

/// A plain file tree on disk, together with the expression it was created
/// from, the project space it belongs to and the revision it was resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codebase {
    path: PathBuf,
    project_space: String,
    expression: Expression,
    revision: String,
}

impl Codebase {
    pub fn new(
        path: PathBuf,
        project_space: impl Into<String>,
        expression: Expression,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            path,
            project_space: project_space.into(),
            expression,
            revision: revision.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn project_space(&self) -> &str {
        &self.project_space
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// The concrete revision of the base repository this tree derives from.
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Relative paths of every file in the tree, sorted.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.path)
    }
}
