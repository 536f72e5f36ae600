//! Snapshot store abstraction.
//!
//! Entities are persisted as whole JSON snapshots under string keys. A
//! single-key `put` is atomic: readers observe either the previous or the
//! new snapshot, never a torn one. That is the property the enrollment
//! unit of work relies on (counter and membership travel on one snapshot).

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Durable key/value storage for entity snapshots.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomic single-key write.
    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Keys starting with `prefix`, in lexicographic order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Load and deserialize a snapshot.
pub fn load<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(bytes) => {
            let value =
                serde_json::from_slice(&bytes).map_err(|error| StoreError::Deserialization {
                    key: key.to_string(),
                    source: Box::new(error),
                })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize and store a snapshot.
pub fn save<T: Serialize>(
    store: &dyn SnapshotStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|error| StoreError::Serialization {
        key: key.to_string(),
        source: Box::new(error),
    })?;
    store.put(key, bytes)
}

/// In-memory snapshot store.
///
/// The default backend for tests and the CLI workbench. A `BTreeMap` keeps
/// prefix listings ordered without extra work.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries().get(key).cloned())
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
