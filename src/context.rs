//! # Project Context
//!
//! Everything expression evaluation needs: the parsed project configuration,
//! the command runner and file store, a factory for repository workspaces,
//! and the editors and translators an expression may name.
//!
//! Editors and translators declared in the project file are instantiated when
//! the context is built; further implementations can be registered in code.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::CommandRunner;
use crate::config::ProjectConfig;
use crate::editor::{self, Editor};
use crate::error::{Error, Result};
use crate::filesystem::FileStore;
use crate::repository::RepositoryFactory;
use crate::translator::{StepTranslator, Translator};
use crate::workspace::LocalWorkspace;

pub struct ProjectContext {
    config: ProjectConfig,
    cmd: Arc<dyn CommandRunner>,
    filesystem: Arc<dyn FileStore>,
    factory: RepositoryFactory,
    editors: BTreeMap<String, Arc<dyn Editor>>,
    translators: Vec<Arc<dyn Translator>>,
}

impl ProjectContext {
    pub fn new(
        config: ProjectConfig,
        cmd: Arc<dyn CommandRunner>,
        filesystem: Arc<dyn FileStore>,
    ) -> Self {
        let editors = config
            .editors
            .iter()
            .map(|(name, editor_config)| (name.clone(), editor::from_config(name, editor_config)))
            .collect();
        let translators = config
            .translators
            .iter()
            .map(|t| Arc::new(StepTranslator::from_config(t)) as Arc<dyn Translator>)
            .collect();
        let factory = RepositoryFactory::new(cmd.clone(), filesystem.clone());

        Self {
            config,
            cmd,
            filesystem,
            factory,
            editors,
            translators,
        }
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn command_runner(&self) -> &Arc<dyn CommandRunner> {
        &self.cmd
    }

    pub fn file_store(&self) -> &Arc<dyn FileStore> {
        &self.filesystem
    }

    /// Adds (or replaces) an editor under `name`.
    pub fn register_editor(&mut self, name: impl Into<String>, editor: Arc<dyn Editor>) {
        self.editors.insert(name.into(), editor);
    }

    /// Adds a translator. Earlier registrations win for the same pair of
    /// project spaces.
    pub fn register_translator(&mut self, translator: Arc<dyn Translator>) {
        self.translators.push(translator);
    }

    pub fn editor(&self, name: &str) -> Option<&Arc<dyn Editor>> {
        self.editors.get(name)
    }

    pub fn translator(&self, from: &str, to: &str) -> Option<&Arc<dyn Translator>> {
        self.translators
            .iter()
            .find(|t| t.from_project_space() == from && t.to_project_space() == to)
    }

    /// A new, uninitialized workspace for the repository `name`.
    pub fn new_workspace(&self, name: &str) -> Result<Box<dyn LocalWorkspace>> {
        let config = self.config.repository(name).ok_or_else(|| {
            Error::codebase_creation(format!(
                "No repository '{}' in project '{}'",
                name, self.config.name
            ))
        })?;
        Ok(self.factory.workspace(name, config.clone()))
    }
}
