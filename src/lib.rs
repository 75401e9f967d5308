//! # Repository Snapshot Library
//!
//! This library materializes a specific, possibly transformed snapshot of a
//! git repository onto local disk, so that downstream tooling (diffing,
//! editing, publishing) can work on plain files. It backs the
//! `repo-snapshot` command-line tool but can be embedded in other programs.
//!
//! ## Quick Example
//!
//! ```
//! use repo_snapshot::expression::Expression;
//! use repo_snapshot::revision::Revision;
//!
//! let expr = Expression::repository("foo", Revision::Id("abc123".to_string()))
//!     .edit_with("scrub", [("mode", "strict")])
//!     .translate_to("public");
//!
//! assert_eq!(
//!     expr.to_string(),
//!     "foo(revision=abc123)|scrub(mode=strict)>public"
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Expressions (`expression`)**: immutable trees describing *what*
//!   codebase to produce: a repository at a revision, optionally edited and
//!   translated.
//! - **Workspaces (`workspace`, `git`, `repository`)**: the clone manager that
//!   materializes the repository term of an expression: clone, pin to a
//!   revision, archive.
//! - **Editors and translators (`editor`, `translator`)**: turn one
//!   materialized tree into another.
//! - **Context (`context`, `config`)**: the project file and collaborators
//!   evaluation runs against.
//! - **Plumbing (`command`, `filesystem`, `error`)**: running external
//!   programs, lifetime-tagged temporary directories, and the error categories
//!   shared by everything above.
//!
//! ## Execution Flow
//!
//! `Expression::create_codebase` evaluates top-down:
//!
//! 1.  A repository node gets a fresh workspace, clones the configured branch,
//!     pins it when a concrete revision was requested, and archives it into a
//!     plain directory.
//! 2.  An edit node realizes its child, then runs the named editor on the
//!     child's tree.
//! 3.  A translate node realizes its child, then runs the translator between
//!     the child's project space and the target one.

pub mod codebase;
pub mod command;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod expression;
pub mod filesystem;
pub mod git;
pub mod repository;
pub mod revision;
pub mod translator;
pub mod workspace;

#[cfg(test)]
mod test_support;
