//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use forgecss_core::{
    application::{ApplicationError, ports::Filesystem},
    error::{ForgeError, ForgeResult},
};

/// In-memory filesystem for testing.
///
/// Clones share the same tree, so a test can hand one clone to the engine
/// and inspect another afterwards.
#[derive(Debug, Clone)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug)]
struct MemoryFilesystemInner {
    cwd: PathBuf,
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
    writes: usize,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem rooted at `/`.
    pub fn new() -> Self {
        Self::with_current_dir("/")
    }

    /// Create an empty filesystem whose current directory is `cwd`.
    pub fn with_current_dir(cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        let mut directories = BTreeSet::new();
        insert_ancestors(&mut directories, &cwd);
        Self {
            inner: Arc::new(RwLock::new(MemoryFilesystemInner {
                cwd,
                files: BTreeMap::new(),
                directories,
                writes: 0,
            })),
        }
    }

    /// Seed a file without counting it as a write (testing helper).
    pub fn seed_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        let mut inner = self.lock_write_unchecked();
        if let Some(parent) = path.parent() {
            insert_ancestors(&mut inner.directories, parent);
        }
        inner.files.insert(path.to_path_buf(), content.to_string());
    }

    /// Read a file's content (testing helper).
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        let inner = self.inner.read().ok()?;
        inner.files.get(path.as_ref()).cloned()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.inner
            .read()
            .map(|inner| inner.directories.contains(path.as_ref()))
            .unwrap_or(false)
    }

    /// List all files, sorted.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner
            .read()
            .map(|inner| inner.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `write_text` calls and newly created directories so far.
    pub fn write_count(&self) -> usize {
        self.inner.read().map(|inner| inner.writes).unwrap_or(0)
    }

    fn lock_read(&self) -> ForgeResult<RwLockReadGuard<'_, MemoryFilesystemInner>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn lock_write(&self) -> ForgeResult<RwLockWriteGuard<'_, MemoryFilesystemInner>> {
        self.inner.write().map_err(|_| poisoned())
    }

    // Test helpers panic anyway, so a poisoned lock is recovered.
    fn lock_write_unchecked(&self) -> RwLockWriteGuard<'_, MemoryFilesystemInner> {
        self.inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for MemoryFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        self.inner
            .read()
            .map(|inner| inner.files.contains_key(path) || inner.directories.contains(path))
            .unwrap_or(false)
    }

    fn ensure_directory(&self, path: &Path) -> ForgeResult<()> {
        let mut inner = self.lock_write()?;
        if inner.files.contains_key(path) {
            return Err(ApplicationError::filesystem(path, "a file exists at this path").into());
        }
        if insert_ancestors(&mut inner.directories, path) {
            inner.writes += 1;
        }
        Ok(())
    }

    fn read_text(&self, path: &Path) -> ForgeResult<String> {
        let inner = self.lock_read()?;
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ApplicationError::filesystem(path, "no such file").into())
    }

    fn write_text(&self, path: &Path, content: &str) -> ForgeResult<()> {
        let mut inner = self.lock_write()?;

        // Ensure parent exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !inner.directories.contains(parent) {
                return Err(
                    ApplicationError::filesystem(path, "Parent directory does not exist").into(),
                );
            }
        }
        if inner.directories.contains(path) {
            return Err(ApplicationError::filesystem(path, "a directory exists at this path").into());
        }

        inner.files.insert(path.to_path_buf(), content.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn current_directory(&self) -> ForgeResult<PathBuf> {
        Ok(self.lock_read()?.cwd.clone())
    }
}

/// Insert `path` and every ancestor. Returns whether anything was new.
fn insert_ancestors(directories: &mut BTreeSet<PathBuf>, path: &Path) -> bool {
    let mut created = false;
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        created |= directories.insert(current.clone());
    }
    created
}

fn poisoned() -> ForgeError {
    ForgeError::Internal {
        message: "memory filesystem lock poisoned".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_requires_parent_directory() {
        let fs = MemoryFilesystem::with_current_dir("/work");
        let err = fs
            .write_text(Path::new("/work/src/a.txt"), "x")
            .unwrap_err();
        assert!(matches!(
            err,
            ForgeError::Application(ApplicationError::FilesystemError { .. })
        ));

        fs.ensure_directory(Path::new("/work/src")).unwrap();
        fs.write_text(Path::new("/work/src/a.txt"), "x").unwrap();
        assert_eq!(fs.read_file("/work/src/a.txt").as_deref(), Some("x"));
    }

    #[test]
    fn counts_writes_but_not_seeds() {
        let fs = MemoryFilesystem::with_current_dir("/work");
        fs.seed_file("/work/old.txt", "old");
        assert_eq!(fs.write_count(), 0);

        fs.ensure_directory(Path::new("/work")).unwrap();
        assert_eq!(fs.write_count(), 0);

        fs.ensure_directory(Path::new("/work/new")).unwrap();
        fs.write_text(Path::new("/work/old.txt"), "new").unwrap();
        assert_eq!(fs.write_count(), 2);
    }

    #[test]
    fn clones_share_state() {
        let fs = MemoryFilesystem::new();
        let other = fs.clone();
        fs.ensure_directory(Path::new("/a")).unwrap();
        assert!(other.is_dir("/a"));
        assert_eq!(other.current_directory().unwrap(), PathBuf::from("/"));
    }
}
