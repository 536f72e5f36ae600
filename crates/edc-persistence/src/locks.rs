//! Per-entity-id write locking.
//!
//! One lock per entity id, held for the duration of a single mutating
//! operation. Enrollment-counter updates and version-chain appends are
//! compare-and-append and would corrupt under a lost-update race; reads
//! bypass the lock and rely on atomic snapshot puts instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lock table keyed by entity id.
#[derive(Debug, Default)]
pub struct EntityLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, id: &str) -> Arc<Mutex<()>> {
        let mut table = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        table.entry(id.to_string()).or_default().clone()
    }

    /// Run `f` while holding the write lock for `id`.
    pub fn with_entity<R>(&self, id: &str, f: impl FnOnce() -> R) -> R {
        let slot = self.slot(id);
        let _guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }

    /// Run `f` while holding the locks for two distinct entity ids.
    ///
    /// Lock order is by id, so overlapping pairs cannot deadlock.
    pub fn with_pair<R>(&self, a: &str, b: &str, f: impl FnOnce() -> R) -> R {
        if a == b {
            return self.with_entity(a, f);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_slot = self.slot(first);
        let second_slot = self.slot(second);
        let _first = first_slot.lock().unwrap_or_else(|e| e.into_inner());
        let _second = second_slot.lock().unwrap_or_else(|e| e.into_inner());
        f()
    }
}
