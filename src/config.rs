//! # Project Configuration
//!
//! This module defines the YAML project file that names the repositories,
//! editors and translators an expression may refer to, together with the logic
//! for parsing and validating it.
//!
//! ## Key Components
//!
//! - **`ProjectConfig`**: the whole file. Repositories and editors are keyed by
//!   name; translators are an ordered list.
//!
//! - **`RepositoryConfig`**: the immutable descriptor of one repository
//!   (source URL, optional branch, shallow flag, sparse checkout paths). It is
//!   shared by reference (`Arc`) across every workspace for that repository.
//!
//! - **`EditorConfig`** / **`TranslatorConfig`**: which editor implementation to
//!   instantiate, and which editor steps carry a codebase from one project
//!   space to another.
//!
//! ## Example
//!
//! ```yaml
//! name: my_project
//! repositories:
//!   foo:
//!     type: git
//!     url: https://example/foo.git
//!     branch: main
//!     shallow_checkout: true
//!     checkout_paths: [src, docs]
//! editors:
//!   noop: { type: identity }
//! translators:
//!   - from_project_space: internal
//!     to_project_space: public
//!     steps:
//!       - { name: scrub, editor: { type: shell, command: "rm -rf internal" } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Project space a repository lives in unless its descriptor says otherwise.
pub const DEFAULT_PROJECT_SPACE: &str = "internal";

/// Which version-control backend a repository uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    #[default]
    Git,
}

/// Repository descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Backend used to clone this repository.
    #[serde(rename = "type", default)]
    pub kind: RepositoryKind,
    /// Where to clone from: a remote URL or a local path.
    pub url: String,
    /// Branch to pull. The backend's conventional main branch when omitted.
    #[serde(default)]
    pub branch: Option<String>,
    /// Fetch only the most recent history depth when cloning.
    #[serde(default)]
    pub shallow_checkout: bool,
    /// Path prefixes to sparsely check out. Empty means the whole tree.
    #[serde(default)]
    pub checkout_paths: Vec<String>,
    /// Project space that codebases of this repository start out in.
    #[serde(default = "default_project_space")]
    pub project_space: String,
}

fn default_project_space() -> String {
    DEFAULT_PROJECT_SPACE.to_string()
}

impl RepositoryConfig {
    /// A git descriptor for `url` with every optional setting at its default.
    pub fn git(url: impl Into<String>) -> Self {
        Self {
            kind: RepositoryKind::Git,
            url: url.into(),
            branch: None,
            shallow_checkout: false,
            checkout_paths: Vec::new(),
            project_space: default_project_space(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_shallow_checkout(mut self, shallow: bool) -> Self {
        self.shallow_checkout = shallow;
        self
    }

    pub fn with_checkout_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.checkout_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: format!("Repository '{}' has no url", name),
                hint: Some("Add 'url:' to the repository block".to_string()),
            });
        }

        if self.url.contains("://") {
            url::Url::parse(&self.url).map_err(|e| Error::ConfigParse {
                message: format!(
                    "Repository '{}' has an invalid url '{}': {}",
                    name, self.url, e
                ),
                hint: None,
            })?;
        }

        for path in &self.checkout_paths {
            if path.trim().is_empty() || Path::new(path).is_absolute() {
                return Err(Error::ConfigParse {
                    message: format!(
                        "Repository '{}' has an invalid checkout path '{}'",
                        name, path
                    ),
                    hint: Some(
                        "Checkout paths are non-empty, repository-relative prefixes such as 'src'"
                            .to_string(),
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Which editor implementation to instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorConfig {
    /// Copies the codebase unchanged.
    Identity,
    /// Copies the codebase and runs a `bash` command inside the copy.
    Shell { command: String },
}

impl EditorConfig {
    fn validate(&self, name: &str) -> Result<()> {
        match self {
            EditorConfig::Identity => Ok(()),
            EditorConfig::Shell { command } if command.trim().is_empty() => {
                Err(Error::ConfigParse {
                    message: format!("Shell editor '{}' has an empty command", name),
                    hint: Some("Add 'command:' to the editor block".to_string()),
                })
            }
            EditorConfig::Shell { .. } => Ok(()),
        }
    }
}

/// One editor applied as part of a translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub editor: EditorConfig,
}

/// Editor steps carrying a codebase from one project space to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub from_project_space: String,
    pub to_project_space: String,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// A parsed project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub repositories: BTreeMap<String, Arc<RepositoryConfig>>,
    #[serde(default)]
    pub editors: BTreeMap<String, EditorConfig>,
    #[serde(default)]
    pub translators: Vec<TranslatorConfig>,
}

impl ProjectConfig {
    /// An empty project, mainly useful for building configurations in code.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repositories: BTreeMap::new(),
            editors: BTreeMap::new(),
            translators: Vec::new(),
        }
    }

    pub fn with_repository(mut self, name: impl Into<String>, config: RepositoryConfig) -> Self {
        self.repositories.insert(name.into(), Arc::new(config));
        self
    }

    pub fn with_editor(mut self, name: impl Into<String>, config: EditorConfig) -> Self {
        self.editors.insert(name.into(), config);
        self
    }

    pub fn with_translator(mut self, config: TranslatorConfig) -> Self {
        self.translators.push(config);
        self
    }

    /// Parses and validates a YAML project file.
    pub fn parse(yaml_content: &str) -> Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(yaml_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the project file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ConfigParse {
                message: "Project name is empty".to_string(),
                hint: Some("Add 'name:' at the top of the project file".to_string()),
            });
        }

        for (name, repository) in &self.repositories {
            repository.validate(name)?;
        }

        for (name, editor) in &self.editors {
            editor.validate(name)?;
        }

        for translator in &self.translators {
            let from = translator.from_project_space.trim();
            let to = translator.to_project_space.trim();
            if from.is_empty() || to.is_empty() || from == to {
                return Err(Error::ConfigParse {
                    message: format!(
                        "Translator '{}' -> '{}' needs two distinct project spaces",
                        translator.from_project_space, translator.to_project_space
                    ),
                    hint: None,
                });
            }
            for step in &translator.steps {
                step.editor.validate(&step.name)?;
            }
        }
        Ok(())
    }

    pub fn repository(&self, name: &str) -> Option<&Arc<RepositoryConfig>> {
        self.repositories.get(name)
    }
}
