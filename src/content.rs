//! Content files - one markdown file per question, named `<id>.md`

use crate::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of every content file
pub const CONTENT_EXTENSION: &str = "md";

/// Reads and writes question bodies inside an already-resolved directory.
#[derive(Debug, Clone, Default)]
pub struct ContentStore;

impl ContentStore {
    pub fn new() -> Self {
        Self
    }

    pub fn file_path(&self, dir: &Path, id: i64) -> PathBuf {
        dir.join(format!("{}.{}", id, CONTENT_EXTENSION))
    }

    /// Write (or overwrite) the whole file
    pub fn write(&self, dir: &Path, id: i64, content: &str) -> Result<PathBuf> {
        let path = self.file_path(dir, id);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Read the file, `None` if it doesn't exist
    pub fn read(&self, dir: &Path, id: i64) -> Result<Option<String>> {
        match std::fs::read_to_string(self.file_path(dir, id)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the file. Returns `false` if there was nothing to remove.
    pub fn delete(&self, dir: &Path, id: i64) -> Result<bool> {
        match std::fs::remove_file(self.file_path(dir, id)) {
            Ok(()) => Ok(true),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move the file from one directory to another, replacing any file at the
    /// destination. Returns `false` if there was no source file.
    pub fn relocate(&self, from: &Path, to: &Path, id: i64) -> Result<bool> {
        let source = self.file_path(from, id);
        let target = self.file_path(to, id);
        if source == target {
            return Ok(source.exists());
        }

        match std::fs::rename(&source, &target) {
            Ok(()) => Ok(true),
            Err(e) if is_absent(&e) => Ok(false),
            Err(e) => {
                // rename can't cross filesystems
                tracing::debug!("rename of {} failed ({}), copying instead", source.display(), e);
                std::fs::copy(&source, &target)?;
                std::fs::remove_file(&source)?;
                Ok(true)
            }
        }
    }
}

/// The file isn't there, either because it is missing or because a path
/// component is a plain file rather than a directory
fn is_absent(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
