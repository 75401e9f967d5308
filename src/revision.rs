//! Revision identifiers.

use std::fmt;

/// The sentinel meaning "current tip of whatever branch is checked out".
pub const HEAD: &str = "HEAD";

/// A revision of a repository: either the current tip, or a concrete
/// backend-native identifier such as a commit hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Revision {
    #[default]
    Head,
    Id(String),
}

impl Revision {
    /// Interprets an optional user-supplied revision. `None`, the empty string
    /// and `HEAD` all mean the current tip.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(HEAD) => Revision::Head,
            Some(id) => Revision::Id(id.to_string()),
        }
    }

    pub fn is_head(&self) -> bool {
        matches!(self, Revision::Head)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Revision::Head => HEAD,
            Revision::Id(id) => id,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Revision {
    fn from(value: &str) -> Self {
        Revision::parse(Some(value))
    }
}
