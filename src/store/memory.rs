//! In-memory object store for tests.
//!
//! Counts `put` calls so tests can assert how many writes an operation
//! issued. Failure injection makes the store-error paths reachable.

use super::{key_segments, Lookup, ObjectStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

/// Object store kept in a `HashMap`.
///
/// # Panics
///
/// Methods panic if the internal lock is poisoned. Test use only.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one object.
    pub fn with_object(key: &str, bytes: &[u8]) -> Self {
        let store = Self::new();
        store
            .objects
            .write()
            .expect("InMemoryObjectStore: lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
        store
    }

    /// Seed an object without counting it as a write.
    pub fn insert(&self, key: &str, bytes: &[u8]) {
        self.objects
            .write()
            .expect("InMemoryObjectStore: lock poisoned")
            .insert(key.to_string(), bytes.to_vec());
    }

    /// Current bytes at `key`, if any.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .read()
            .expect("InMemoryObjectStore: lock poisoned")
            .get(key)
            .cloned()
    }

    /// Number of `put` calls that succeeded.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Make every subsequent `get` fail with an I/O error.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `put` fail with an I/O error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &str) -> Result<Lookup, StoreError> {
        key_segments(key)?;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                message: "access denied".to_string(),
            });
        }

        Ok(match self.object(key) {
            Some(bytes) => Lookup::Found(bytes),
            None => Lookup::NotFound,
        })
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        key_segments(key)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                key: key.to_string(),
                message: "access denied".to_string(),
            });
        }

        self.insert(key, bytes);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_counts_writes() {
        let store = InMemoryObjectStore::new();

        tokio_test::block_on(store.put("a/b", b"1")).unwrap();
        tokio_test::block_on(store.put("a/b", b"2")).unwrap();

        assert_eq!(store.put_count(), 2);
        assert_eq!(store.object("a/b"), Some(b"2".to_vec()));
    }

    #[test]
    fn test_seeded_object_not_counted() {
        let store = InMemoryObjectStore::with_object("k", b"X");

        let lookup = tokio_test::block_on(store.get("k")).unwrap();
        assert_eq!(lookup, Lookup::Found(b"X".to_vec()));
        assert_eq!(store.put_count(), 0);
    }

    #[test]
    fn test_injected_read_failure() {
        let store = InMemoryObjectStore::new();
        store.fail_reads();

        let err = tokio_test::block_on(store.get("k")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
