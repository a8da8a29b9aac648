//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so that task executors can be
//! unit-tested without touching the real filesystem.  Production code uses
//! [`SystemFileSystemOps`]; tests use `MemoryFileSystemOps`.

use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Abstraction over the filesystem primitives used by task executors.
///
/// Every mutating call (`write_atomic`, `copy_file`, `remove`) is skipped by
/// the executors in dry-run mode, so an implementation only ever sees writes
/// for real runs.
pub trait FileSystemOps: Send + Sync + std::fmt::Debug {
    /// Returns `true` if `path` exists on the filesystem.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Returns the immediate child paths inside `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` cannot be opened or read as a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Read the whole file at `path` as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Replace the content of `path` with `contents` in one step.
    ///
    /// Either the full new content is visible at `path` afterwards or the
    /// file is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be written or renamed.
    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()>;

    /// Copy `src` to `dst`, creating parent directories and keeping the
    /// access and modification times of `src`.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Remove the file or empty directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails.
    fn remove(&self, path: &Path) -> Result<()>;

    /// `path` with symlinks resolved, or `path` itself if it cannot be resolved.
    fn canonicalize(&self, path: &Path) -> PathBuf;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        std::fs::read_dir(path)
            .with_context(|| format!("reading directory {}", path.display()))?
            .map(|e| e.map(|entry| entry.path()).map_err(Into::into))
            .collect()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(contents.as_bytes())
            .with_context(|| format!("writing temp file for {}", path.display()))?;
        if let Ok(meta) = std::fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .with_context(|| format!("copying permissions of {}", path.display()))?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::copy(src, dst)
            .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;

        let meta = std::fs::metadata(src)?;
        let times = std::fs::FileTimes::new()
            .set_accessed(meta.accessed()?)
            .set_modified(meta.modified()?);
        std::fs::File::options()
            .write(true)
            .open(dst)
            .and_then(|f| f.set_times(times))
            .with_context(|| format!("preserving timestamps on {}", dst.display()))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let meta = std::fs::symlink_metadata(path)?;
        let removed = if meta.is_dir() {
            std::fs::remove_dir(path)
        } else {
            std::fs::remove_file(path)
        };
        removed.with_context(|| format!("removing {}", path.display()))
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// In-memory [`FileSystemOps`] for unit tests.
///
/// Files are keyed by absolute path; directories exist implicitly as the
/// ancestors of stored files. Every mutating call is counted so tests can
/// assert that an operation performed no writes at all.
///
/// # Example
///
/// ```ignore
/// use codemucker_merge::operations::MemoryFileSystemOps;
///
/// let fs = MemoryFileSystemOps::new()
///     .with_file("/project/a.txt", "a")
///     .with_file("/project/src/b.txt", "b");
/// assert!(fs.is_dir(Path::new("/project/src")));
/// ```
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryFileSystemOps {
    files: std::sync::Mutex<std::collections::BTreeMap<PathBuf, String>>,
    mutations: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl MemoryFileSystemOps {
    /// Create an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with the given content.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.files
            .lock()
            .expect("memory fs poisoned")
            .insert(path.into(), contents.to_string());
        self
    }

    /// Current content of `path`, if it is a file.
    #[must_use]
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .lock()
            .expect("memory fs poisoned")
            .get(path.as_ref())
            .cloned()
    }

    /// Number of mutating calls (`write_atomic`, `copy_file`, `remove`).
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn record_mutation(&self) {
        self.mutations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
impl FileSystemOps for MemoryFileSystemOps {
    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("memory fs poisoned")
            .contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .lock()
            .expect("memory fs poisoned")
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            anyhow::bail!("memory fs: {} is not a directory", path.display());
        }
        let files = self.files.lock().expect("memory fs poisoned");
        let mut children: Vec<PathBuf> = files
            .keys()
            .filter_map(|p| p.strip_prefix(path).ok())
            .filter_map(|rel| rel.components().next())
            .map(|first| path.join(first))
            .collect();
        children.dedup();
        Ok(children)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.contents(path)
            .ok_or_else(|| anyhow::anyhow!("memory fs: no file at {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<()> {
        self.record_mutation();
        self.files
            .lock()
            .expect("memory fs poisoned")
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        self.record_mutation();
        let contents = self.read_to_string(src)?;
        self.files
            .lock()
            .expect("memory fs poisoned")
            .insert(dst.to_path_buf(), contents);
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.record_mutation();
        self.files
            .lock()
            .expect("memory fs poisoned")
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("memory fs: no file at {}", path.display()))
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // SystemFileSystemOps
    // -----------------------------------------------------------------------

    #[test]
    fn write_atomic_creates_parent_dirs_and_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let fs = SystemFileSystemOps;

        fs.write_atomic(&path, "first").unwrap();
        fs.write_atomic(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file should be renamed away");
    }

    #[test]
    fn copy_file_preserves_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.txt");
        let dst = dir.path().join("out").join("dst.txt");
        std::fs::write(&src, "payload").unwrap();
        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        std::fs::File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(old)
            .unwrap();

        SystemFileSystemOps.copy_file(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "payload");
        assert_eq!(std::fs::metadata(&dst).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, "x").unwrap();
        SystemFileSystemOps.remove(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn read_to_string_missing_file_mentions_path() {
        let err = SystemFileSystemOps
            .read_to_string(Path::new("/nonexistent/merge/file.txt"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/merge/file.txt"));
    }

    // -----------------------------------------------------------------------
    // MemoryFileSystemOps
    // -----------------------------------------------------------------------

    #[test]
    fn memory_fs_directories_are_implicit() {
        let fs = MemoryFileSystemOps::new()
            .with_file("/p/a.txt", "a")
            .with_file("/p/src/b.txt", "b")
            .with_file("/p/src/c.txt", "c");
        assert!(fs.is_dir(Path::new("/p")));
        assert!(fs.is_dir(Path::new("/p/src")));
        assert!(!fs.is_dir(Path::new("/p/a.txt")));
        assert_eq!(
            fs.read_dir(Path::new("/p")).unwrap(),
            vec![PathBuf::from("/p/a.txt"), PathBuf::from("/p/src")]
        );
    }

    #[test]
    fn memory_fs_counts_mutations() {
        let fs = MemoryFileSystemOps::new().with_file("/p/a.txt", "a");
        assert_eq!(fs.mutation_count(), 0);
        fs.copy_file(Path::new("/p/a.txt"), Path::new("/p/b.txt"))
            .unwrap();
        fs.remove(Path::new("/p/a.txt")).unwrap();
        assert_eq!(fs.mutation_count(), 2);
        assert_eq!(fs.contents("/p/b.txt").as_deref(), Some("a"));
        assert!(!fs.exists(Path::new("/p/a.txt")));
    }
}
