//! # Translators
//!
//! A translator carries a codebase from one project space into another, e.g.
//! from `internal` to `public`. The configured kind is a chain of editor steps
//! applied in order; each step sees the previous step's output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use crate::config::TranslatorConfig;
use crate::context::ProjectContext;
use crate::editor::{self, Editor, IdentityEditor};
use crate::error::Result;

/// Produces, from a tree in `from_project_space`, a tree in
/// `to_project_space`.
pub trait Translator: Send + Sync {
    fn from_project_space(&self) -> &str;

    fn to_project_space(&self) -> &str;

    /// Translates a copy of the tree at `input` and returns the copy's
    /// location. `options` are handed to every step.
    fn translate(
        &self,
        input: &Path,
        ctx: &ProjectContext,
        options: &IndexMap<String, String>,
    ) -> Result<PathBuf>;
}

/// Applies a fixed sequence of editors.
pub struct StepTranslator {
    from_project_space: String,
    to_project_space: String,
    steps: Vec<(String, Arc<dyn Editor>)>,
}

impl StepTranslator {
    pub fn new(
        from_project_space: impl Into<String>,
        to_project_space: impl Into<String>,
        steps: Vec<(String, Arc<dyn Editor>)>,
    ) -> Self {
        Self {
            from_project_space: from_project_space.into(),
            to_project_space: to_project_space.into(),
            steps,
        }
    }

    pub fn from_config(config: &TranslatorConfig) -> Self {
        let steps = config
            .steps
            .iter()
            .map(|step| (step.name.clone(), editor::from_config(&step.name, &step.editor)))
            .collect();
        Self::new(
            config.from_project_space.clone(),
            config.to_project_space.clone(),
            steps,
        )
    }
}

impl Translator for StepTranslator {
    fn from_project_space(&self) -> &str {
        &self.from_project_space
    }

    fn to_project_space(&self) -> &str {
        &self.to_project_space
    }

    fn translate(
        &self,
        input: &Path,
        ctx: &ProjectContext,
        options: &IndexMap<String, String>,
    ) -> Result<PathBuf> {
        if self.steps.is_empty() {
            // Still hand back a tree of our own.
            let name = format!("{}_to_{}", self.from_project_space, self.to_project_space);
            return IdentityEditor::new(name).edit(input, ctx, options);
        }

        let mut current = input.to_path_buf();
        for (name, step) in &self.steps {
            debug!(
                "translation {} -> {}: step '{}'",
                self.from_project_space, self.to_project_space, name
            );
            current = step.edit(&current, ctx, options)?;
        }
        Ok(current)
    }
}
