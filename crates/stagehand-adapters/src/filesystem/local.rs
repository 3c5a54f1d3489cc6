//! Local filesystem adapter using std::fs and walkdir.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use stagehand_core::{application::ports::Filesystem, error::EngineResult};

/// Production filesystem implementation using `std::fs`.
#[derive(Debug, Clone, Copy)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    /// Create a new local filesystem adapter.
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for LocalFilesystem {
    fn read_file(&self, path: &Path) -> EngineResult<String> {
        std::fs::read_to_string(path).map_err(|e| map_io_error(path, e, "read file"))
    }

    fn write_file(&self, path: &Path, content: &str) -> EngineResult<()> {
        std::fs::write(path, content).map_err(|e| map_io_error(path, e, "write file"))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> EngineResult<()> {
        std::fs::create_dir_all(path).map_err(|e| map_io_error(path, e, "create directory"))
    }

    fn walk_files(&self, root: &Path) -> EngineResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(map_io_error(
                root,
                io::Error::new(io::ErrorKind::NotFound, "not a directory"),
                "walk directory",
            ));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| {
                map_io_error(
                    root,
                    io::Error::other(e),
                    "walk directory",
                )
            })?;
            if entry.file_type().is_file() {
                let relative = entry
                    .path()
                    .strip_prefix(root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn map_io_error(path: &Path, e: io::Error, operation: &str) -> stagehand_core::error::EngineError {
    use stagehand_core::application::ApplicationError;

    ApplicationError::Filesystem {
        path: path.to_path_buf(),
        reason: format!("Failed to {}: {}", operation, e),
    }
    .into()
}
