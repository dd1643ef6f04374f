//! Object store port and adapters.
//!
//! The pipeline keeps the two raw datasets as opaque blobs addressed by
//! slash-separated keys. [`ObjectStore`] is the contract; the adapters are
//! a directory-backed store for real runs and an in-memory store for tests.

mod local;
#[cfg(test)]
mod memory;

pub use local::LocalObjectStore;
#[cfg(test)]
pub use memory::InMemoryObjectStore;

use crate::error::StoreError;
use async_trait::async_trait;

/// Result of reading a key that may be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Vec<u8>),
    NotFound,
}

impl Lookup {
    /// Returns the bytes if the key was present.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Lookup::Found(bytes) => Some(bytes),
            Lookup::NotFound => None,
        }
    }
}

/// Port for a key-addressed blob store.
///
/// # Contract
///
/// - `get` on an absent key returns `Ok(Lookup::NotFound)`, never an error.
/// - `put` replaces the whole blob; readers never observe a partial write.
/// - No compare-and-swap is offered. Callers that read, compare and write
///   can race with a concurrent writer.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the blob stored at `key`.
    async fn get(&self, key: &str) -> Result<Lookup, StoreError>;

    /// Store `bytes` at `key`, replacing any existing blob.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Validate a store key and split it into path segments.
///
/// Keys are relative, slash-separated, and may not contain empty, `.` or
/// `..` segments.
pub(crate) fn key_segments(key: &str) -> Result<Vec<&str>, StoreError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }

    let segments: Vec<&str> = key.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(StoreError::InvalidKey(key.to_string()));
    }

    Ok(segments)
}
