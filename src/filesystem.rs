//! # File Store
//!
//! Temporary directories are handed out by a `FileStore`, each tagged with a
//! `Lifetime` that declares how long the caller intends to use it. The store,
//! not the caller, decides when a tagged directory actually disappears: a
//! workspace never deletes its own backing directory.
//!
//! `DiskFileStore` is the on-disk implementation. It remembers every
//! allocation so a driver (the CLI, or a long-running service between tasks)
//! can reclaim all directories of one lifetime at once.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Environment variable overriding the default root of the disk store.
pub const TMP_ROOT_ENV: &str = "REPO_SNAPSHOT_TMP";

/// How long a temporary directory is meant to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Lives for the whole run, e.g. the backing directory of a clone.
    Persistent,
    /// Lives until the current task finishes, e.g. an archive or an edit output.
    CurrentTask,
}

/// Allocation and manipulation of files and directories on behalf of
/// workspaces and editors.
pub trait FileStore: Send + Sync {
    /// Returns a fresh, not-yet-existing path whose file name starts with
    /// `prefix`. The path is recorded under `lifetime` for later reclamation.
    fn temporary_directory(&self, prefix: &str, lifetime: Lifetime) -> Result<PathBuf>;

    /// Writes `content` to `path`, creating parent directories as needed.
    fn write(&self, content: &str, path: &Path) -> Result<()>;

    /// Removes `path` and everything below it. A missing path is not an error.
    fn delete_recursively(&self, path: &Path) -> Result<()>;

    /// Creates `path` and any missing parents.
    fn make_dirs(&self, path: &Path) -> Result<()>;

    /// Copies the tree rooted at `src` into `dst`, skipping `.git` directories.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// A `FileStore` backed by a root directory on the host filesystem.
#[derive(Debug)]
pub struct DiskFileStore {
    root: PathBuf,
    counter: AtomicU64,
    allocations: Mutex<Vec<(PathBuf, Lifetime)>>,
}

impl DiskFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            counter: AtomicU64::new(0),
            allocations: Mutex::new(Vec::new()),
        }
    }

    /// The default root: `$REPO_SNAPSHOT_TMP`, or `repo-snapshot` under the OS
    /// temporary directory.
    pub fn default_root() -> PathBuf {
        match std::env::var_os(TMP_ROOT_ENV) {
            Some(root) if !root.is_empty() => PathBuf::from(root),
            _ => std::env::temp_dir().join("repo-snapshot"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths allocated under `lifetime` that have not been reclaimed yet.
    pub fn allocated(&self, lifetime: Lifetime) -> Vec<PathBuf> {
        self.lock_allocations()
            .iter()
            .filter(|(_, l)| *l == lifetime)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Deletes every path allocated under `lifetime`.
    pub fn clean_up(&self, lifetime: Lifetime) -> Result<()> {
        let doomed: Vec<PathBuf> = {
            let mut allocations = self.lock_allocations();
            let (doomed, kept): (Vec<_>, Vec<_>) =
                allocations.drain(..).partition(|(_, l)| *l == lifetime);
            *allocations = kept;
            doomed.into_iter().map(|(p, _)| p).collect()
        };

        for path in doomed {
            debug!("reclaiming {:?} path {}", lifetime, path.display());
            self.delete_recursively(&path)?;
        }
        Ok(())
    }

    pub fn clean_up_all(&self) -> Result<()> {
        self.clean_up(Lifetime::CurrentTask)?;
        self.clean_up(Lifetime::Persistent)
    }

    fn lock_allocations(&self) -> std::sync::MutexGuard<'_, Vec<(PathBuf, Lifetime)>> {
        self.allocations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FileStore for DiskFileStore {
    fn temporary_directory(&self, prefix: &str, lifetime: Lifetime) -> Result<PathBuf> {
        self.make_dirs(&self.root)?;

        // Repository and branch names may contain path separators.
        let safe_prefix = prefix.replace(['/', '\\'], "_");
        let path = loop {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let candidate = self
                .root
                .join(format!("{}{}_{}", safe_prefix, std::process::id(), n));
            if !candidate.exists() {
                break candidate;
            }
        };

        self.lock_allocations().push((path.clone(), lifetime));
        Ok(path)
    }

    fn write(&self, content: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.make_dirs(parent)?;
        }
        fs::write(path, content).map_err(|e| Error::io(path, e))
    }

    fn delete_recursively(&self, path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else if path.exists() {
            fs::remove_file(path)
        } else {
            return Ok(());
        };
        result.map_err(|e| Error::io(path, e))
    }

    fn make_dirs(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Error::io(path, e))
    }

    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        self.make_dirs(dst)?;
        let walker = WalkDir::new(src)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| Error::Io {
                path: src.to_path_buf(),
                message: e.to_string(),
            })?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| Error::Io {
                    path: entry.path().to_path_buf(),
                    message: e.to_string(),
                })?;
            let target = dst.join(relative);

            if entry.file_type().is_symlink() {
                copy_symlink(entry.path(), &target)?;
            } else if entry.file_type().is_dir() {
                self.make_dirs(&target)?;
            } else {
                fs::copy(entry.path(), &target).map_err(|e| Error::io(entry.path(), e))?;
            }
        }
        Ok(())
    }
}

/// Recreates the link at `src` as `dst`, pointing at the same (possibly
/// dangling) target.
#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| Error::io(src, e))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| Error::io(dst, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| Error::io(src, e))
}

/// Lists the files below `root` as paths relative to it, sorted, skipping any
/// `.git` directory.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::Io {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_temporary_directory_is_fresh_and_prefixed() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());

        let a = store
            .temporary_directory("git_clone_foo_", Lifetime::Persistent)
            .unwrap();
        let b = store
            .temporary_directory("git_clone_foo_", Lifetime::Persistent)
            .unwrap();

        assert_ne!(a, b);
        assert!(!a.exists());
        assert!(a.starts_with(temp_dir.path()));
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("git_clone_foo_"));
    }

    #[test]
    fn test_temporary_directory_sanitizes_separators() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());
        let path = store
            .temporary_directory("git_clone_foo_feature/x_", Lifetime::Persistent)
            .unwrap();
        assert_eq!(path.parent().unwrap(), temp_dir.path());
    }

    #[test]
    fn test_write_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());
        let path = temp_dir.path().join("a/.git/info/sparse-checkout");
        store.write("src\ndocs\n", &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "src\ndocs\n");
    }

    #[test]
    fn test_delete_recursively_handles_missing_and_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());

        store
            .delete_recursively(&temp_dir.path().join("missing"))
            .unwrap();

        let file = temp_dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        store.delete_recursively(&file).unwrap();
        assert!(!file.exists());

        let dir = temp_dir.path().join("d/e");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("g.txt"), "y").unwrap();
        store.delete_recursively(&temp_dir.path().join("d")).unwrap();
        assert!(!temp_dir.path().join("d").exists());
    }

    #[test]
    fn test_clean_up_only_touches_requested_lifetime() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());

        let clone = store
            .temporary_directory("clone_", Lifetime::Persistent)
            .unwrap();
        let archive = store
            .temporary_directory("archive_", Lifetime::CurrentTask)
            .unwrap();
        store.make_dirs(&clone).unwrap();
        store.make_dirs(&archive).unwrap();

        store.clean_up(Lifetime::CurrentTask).unwrap();
        assert!(clone.exists());
        assert!(!archive.exists());
        assert!(store.allocated(Lifetime::CurrentTask).is_empty());
        assert_eq!(store.allocated(Lifetime::Persistent), vec![clone.clone()]);

        store.clean_up_all().unwrap();
        assert!(!clone.exists());
    }

    #[test]
    fn test_copy_dir_skips_git_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join(".git")).unwrap();
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join(".git/HEAD"), "ref").unwrap();
        fs::write(src.join("lib/a.rs"), "fn a() {}").unwrap();
        fs::write(src.join("README"), "hi").unwrap();

        let dst = temp_dir.path().join("dst");
        store.copy_dir(&src, &dst).unwrap();

        assert_eq!(
            list_files(&dst).unwrap(),
            vec![PathBuf::from("README"), PathBuf::from("lib/a.rs")]
        );
        assert!(!dst.join(".git").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_copy_dir_preserves_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let store = DiskFileStore::new(temp_dir.path().to_path_buf());
        let src = temp_dir.path().join("src");
        fs::create_dir_all(src.join("real")).unwrap();
        fs::write(src.join("real/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink("missing", src.join("dangling")).unwrap();
        std::os::unix::fs::symlink("real", src.join("linked")).unwrap();

        let dst = temp_dir.path().join("dst");
        store.copy_dir(&src, &dst).unwrap();

        assert_eq!(
            fs::read_link(dst.join("dangling")).unwrap(),
            PathBuf::from("missing")
        );
        assert_eq!(
            fs::read_link(dst.join("linked")).unwrap(),
            PathBuf::from("real")
        );
        assert!(fs::symlink_metadata(dst.join("linked"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_to_string(dst.join("linked/a.txt")).unwrap(), "a");
    }

    #[test]
    #[serial]
    fn test_default_root_honours_env() {
        std::env::set_var(TMP_ROOT_ENV, "/var/tmp/snapshots");
        assert_eq!(
            DiskFileStore::default_root(),
            PathBuf::from("/var/tmp/snapshots")
        );
        std::env::remove_var(TMP_ROOT_ENV);
        assert!(DiskFileStore::default_root().ends_with("repo-snapshot"));
    }
}
