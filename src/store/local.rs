//! Directory-backed object store.
//!
//! Each key maps to a file below the store root; key segments become
//! subdirectories. Writes go to a temporary file in the target directory
//! and are renamed into place.

use super::{key_segments, Lookup, ObjectStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its file path.
    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        for segment in key_segments(key)? {
            path.push(segment);
        }
        Ok(path)
    }
}

fn io_error(key: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Io {
        key: key.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, key: &str) -> Result<Lookup, StoreError> {
        let path = self.object_path(key)?;

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(Lookup::Found(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Lookup::NotFound),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(key)?;
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_error(key, e))?;

        let owned_key = key.to_string();
        let payload = bytes.to_vec();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| io_error(&owned_key, e))?;
            tmp.write_all(&payload)
                .map_err(|e| io_error(&owned_key, e))?;
            tmp.as_file()
                .sync_all()
                .map_err(|e| io_error(&owned_key, e))?;
            tmp.persist(&target)
                .map_err(|e| io_error(&owned_key, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| io_error(key, e))??;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let lookup = store.get("bls/pr.data.0.Current").await.unwrap();
        assert_eq!(lookup, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("bls/pr.data.0.Current", b"A,B\n1,2\n").await.unwrap();

        let lookup = store.get("bls/pr.data.0.Current").await.unwrap();
        assert_eq!(lookup, Lookup::Found(b"A,B\n1,2\n".to_vec()));
        assert!(dir.path().join("bls").join("pr.data.0.Current").is_file());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        store.put("population/us_population.json", b"[]").await.unwrap();
        store
            .put("population/us_population.json", b"[{\"year\":2015}]")
            .await
            .unwrap();

        let bytes = store
            .get("population/us_population.json")
            .await
            .unwrap()
            .into_bytes()
            .unwrap();
        assert_eq!(bytes, b"[{\"year\":2015}]");
    }

    #[tokio::test]
    async fn test_rejects_traversal_key() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path().join("store"));

        let err = store.put("../escape", b"x").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert!(!dir.path().join("escape").exists());
    }

    #[tokio::test]
    async fn test_read_error_is_not_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        // A directory where a blob is expected cannot be read as a file.
        std::fs::create_dir_all(dir.path().join("bls").join("pr.data.0.Current")).unwrap();

        let err = store.get("bls/pr.data.0.Current").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
