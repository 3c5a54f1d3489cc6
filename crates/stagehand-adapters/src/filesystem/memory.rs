//! In-memory filesystem adapter for testing.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use stagehand_core::application::ApplicationError;
use stagehand_core::application::ports::Filesystem;
use stagehand_core::error::EngineResult;

/// In-memory filesystem for testing. Cloning shares the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    inner: Arc<RwLock<MemoryFilesystemInner>>,
}

#[derive(Debug, Default)]
struct MemoryFilesystemInner {
    files: BTreeMap<PathBuf, String>,
    directories: BTreeSet<PathBuf>,
}

impl MemoryFilesystem {
    /// Create a new empty memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating parent directories (testing helper).
    pub fn seed(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        let mut inner = self.inner.write().unwrap();
        if let Some(parent) = path.parent() {
            let mut current = PathBuf::new();
            for component in parent.components() {
                current.push(component);
                inner.directories.insert(current.clone());
            }
        }
        inner.files.insert(path, content.into());
    }

    /// Read a file's content without going through the port (testing helper).
    pub fn content(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner.read().unwrap().files.get(path.as_ref()).cloned()
    }

    /// All file paths in sorted order.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner.read().unwrap().files.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().files.is_empty()
    }
}

impl Filesystem for MemoryFilesystem {
    fn read_file(&self, path: &Path) -> EngineResult<String> {
        self.inner
            .read()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| {
                ApplicationError::Filesystem {
                    path: path.to_path_buf(),
                    reason: "file does not exist".into(),
                }
                .into()
            })
    }

    fn write_file(&self, path: &Path, content: &str) -> EngineResult<()> {
        let mut inner = self.inner.write().unwrap();
        inner.files.insert(path.to_path_buf(), content.to_owned());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.read().unwrap();
        inner.files.contains_key(path)
            || inner.directories.contains(path)
            || inner.files.keys().any(|p| p.starts_with(path))
    }

    fn create_dir_all(&self, path: &Path) -> EngineResult<()> {
        let mut inner = self.inner.write().unwrap();
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            inner.directories.insert(current.clone());
        }
        Ok(())
    }

    fn walk_files(&self, root: &Path) -> EngineResult<Vec<PathBuf>> {
        let inner = self.inner.read().unwrap();
        if !inner.directories.contains(root)
            && !inner.files.keys().any(|p| p.starts_with(root))
        {
            return Err(ApplicationError::Filesystem {
                path: root.to_path_buf(),
                reason: "directory does not exist".into(),
            }
            .into());
        }
        let mut out: Vec<PathBuf> = inner
            .files
            .keys()
            .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
            .collect();
        out.sort();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_creates_parents() {
        let fs = MemoryFilesystem::new();
        fs.seed("/pack/templates/a.txt", "x");
        assert!(fs.exists(Path::new("/pack/templates")));
        assert!(fs.exists(Path::new("/pack/templates/a.txt")));
    }

    #[test]
    fn walk_is_relative_and_sorted() {
        let fs = MemoryFilesystem::new();
        fs.seed("/root/b/two.txt", "2");
        fs.seed("/root/a.txt", "1");
        let files = fs.walk_files(Path::new("/root")).unwrap();
        assert_eq!(files, [PathBuf::from("a.txt"), PathBuf::from("b/two.txt")]);
    }

    #[test]
    fn walk_missing_root_errors() {
        let fs = MemoryFilesystem::new();
        assert!(fs.walk_files(Path::new("/ghost")).is_err());
    }

    #[test]
    fn clones_share_storage() {
        let fs = MemoryFilesystem::new();
        let other = fs.clone();
        other.write_file(Path::new("/x"), "1").unwrap();
        assert_eq!(fs.content("/x").as_deref(), Some("1"));
    }
}
