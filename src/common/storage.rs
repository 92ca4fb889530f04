//! # Shared Directory
//!
//! Flat directory of shared files. Names are single path components; anything
//! that could escape the root is rejected.
//!
//! Concurrent writers are not coordinated: two uploads of the same name race
//! and the last one to finish wins.

use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use super::errors::StorageError;

#[derive(Debug, Clone)]
pub struct SharedDirectory {
    root: PathBuf,
}

impl SharedDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Io {
                path: self.root.clone(),
                source,
            })
    }

    /// Names of the regular files in the directory, sorted.
    pub async fn list_entries(&self) -> Result<Vec<String>, StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.root.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            if !entry.file_type().await.map_err(io_err)?.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!("⚠️ Skipping non UTF-8 file name {:?}", raw),
            }
        }

        names.sort();
        Ok(names)
    }

    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| file_error(name, path, e))
    }

    pub async fn write_file(&self, name: &str, contents: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| file_error(name, path, e))
    }

    /// Reject names that are not a single plain path component.
    pub fn check_name(name: &str) -> Result<(), StorageError> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);

        if invalid {
            Err(StorageError::InvalidName(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        Self::check_name(name)?;
        Ok(self.root.join(name))
    }
}

fn file_error(name: &str, path: PathBuf, source: io::Error) -> StorageError {
    if source.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(name.to_string())
    } else {
        StorageError::Io { path, source }
    }
}
