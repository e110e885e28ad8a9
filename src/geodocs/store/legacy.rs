use crate::error::{GeodocError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only access to documents stored as plain files, from before the
/// relational backend existed.
#[derive(Debug, Clone)]
pub struct LegacyDirectory {
    root: PathBuf,
}

impl LegacyDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Like [`LegacyDirectory::new`], creating the directory if it is missing.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            GeodocError::Storage(format!(
                "Failed to create legacy directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `filename` if it names a direct child of the directory.
    fn path_for(&self, filename: &str) -> Option<PathBuf> {
        let unsafe_name = filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\', '\0']);
        if unsafe_name {
            None
        } else {
            Some(self.root.join(filename))
        }
    }

    pub fn exists(&self, filename: &str) -> Result<bool> {
        if !self.root.is_dir() {
            return Err(GeodocError::Storage(format!(
                "Legacy directory {} is not available",
                self.root.display()
            )));
        }
        Ok(self.path_for(filename).is_some_and(|p| p.is_file()))
    }

    /// Content of `filename`, decoded lossily when it is not valid UTF-8.
    pub fn read(&self, filename: &str) -> Result<String> {
        if !self.exists(filename)? {
            return Err(GeodocError::NotFound(filename.to_string()));
        }
        let path = self
            .path_for(filename)
            .ok_or_else(|| GeodocError::NotFound(filename.to_string()))?;
        debug!(path = %path.display(), "Reading legacy document");
        let bytes = std::fs::read(&path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
