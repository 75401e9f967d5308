//! Recording mocks for the command runner and file store, shared by the unit
//! tests of the workspace, expression and editor modules.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::command::CommandRunner;
use crate::error::{Error, Result};
use crate::filesystem::{FileStore, Lifetime};

type Responder = Box<dyn Fn(&str, &[String]) -> Result<String> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
}

/// Records every command and answers with a scripted responder.
pub(crate) struct MockCommandRunner {
    calls: Mutex<Vec<RecordedCommand>>,
    responder: Responder,
}

impl MockCommandRunner {
    /// Every command succeeds with empty output.
    pub fn new() -> Self {
        Self::with_responder(|_, _| Ok(String::new()))
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &[String]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// `git rev-parse` answers `head`; everything else succeeds silently.
    pub fn with_head(head: &'static str) -> Self {
        Self::with_responder(move |program, args| {
            if program == "git" && args.first().map(String::as_str) == Some("rev-parse") {
                Ok(format!("{}\n", head))
            } else {
                Ok(String::new())
            }
        })
    }

    pub fn calls(&self) -> Vec<RecordedCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Argument lists of every `git` invocation, in order.
    pub fn git_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == "git")
            .map(|c| c.args)
            .collect()
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, program: &str, args: &[String], working_dir: &Path) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCommand {
            program: program.to_string(),
            args: args.to_vec(),
            dir: working_dir.to_path_buf(),
        });
        (self.responder)(program, args)
    }
}

/// A failing command, as the system runner would report it.
pub(crate) fn command_failure(program: &str, args: &[String], stderr: &str) -> Error {
    Error::CommandFailed {
        program: program.to_string(),
        args: args.to_vec(),
        exit_code: Some(128),
        stderr: stderr.to_string(),
    }
}

/// Hands out paths under `/mock` and records what was done with them.
#[derive(Default)]
pub(crate) struct MockFileStore {
    counter: AtomicU64,
    pub allocations: Mutex<Vec<(PathBuf, Lifetime)>>,
    pub writes: Mutex<Vec<(PathBuf, String)>>,
    pub deletes: Mutex<Vec<PathBuf>>,
    pub made_dirs: Mutex<Vec<PathBuf>>,
    pub copies: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocations(&self) -> Vec<(PathBuf, Lifetime)> {
        self.allocations.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<PathBuf> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn copies(&self) -> Vec<(PathBuf, PathBuf)> {
        self.copies.lock().unwrap().clone()
    }
}

impl FileStore for MockFileStore {
    fn temporary_directory(&self, prefix: &str, lifetime: Lifetime) -> Result<PathBuf> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let path = PathBuf::from("/mock").join(format!("{}{}", prefix, n));
        self.allocations
            .lock()
            .unwrap()
            .push((path.clone(), lifetime));
        Ok(path)
    }

    fn write(&self, content: &str, path: &Path) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), content.to_string()));
        Ok(())
    }

    fn delete_recursively(&self, path: &Path) -> Result<()> {
        self.deletes.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn make_dirs(&self, path: &Path) -> Result<()> {
        self.made_dirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        self.copies
            .lock()
            .unwrap()
            .push((src.to_path_buf(), dst.to_path_buf()));
        Ok(())
    }
}
