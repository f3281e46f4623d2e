//! Name-to-handle cache reconciled against a live server listing.
//!
//! # Design
//! The server is the only source of truth. A `HandleCache` is never updated
//! incrementally; instead `reconcile` is given the full live name set and
//! brings the cache in line with it. Entries present on both sides keep the
//! same `Arc`, so state held by an existing handle survives a rebuild.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// What a single `reconcile` call changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub evicted: usize,
    pub inserted: usize,
    pub retained: usize,
}

impl ReconcileStats {
    pub fn is_unchanged(&self) -> bool {
        self.evicted == 0 && self.inserted == 0
    }
}

#[derive(Debug)]
pub struct HandleCache<T> {
    entries: BTreeMap<String, Arc<T>>,
}

impl<T> Default for HandleCache<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> HandleCache<T> {
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evict names missing from `live`, build handles for live names not yet
    /// cached, leave everything else alone.
    pub fn reconcile<I, F>(&mut self, live: I, mut make: F) -> ReconcileStats
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&str) -> T,
    {
        let live: BTreeSet<String> = live.into_iter().collect();
        let before = self.entries.len();

        self.entries.retain(|name, _| live.contains(name));
        let evicted = before - self.entries.len();
        let retained = self.entries.len();

        let mut inserted = 0;
        for name in live {
            if !self.entries.contains_key(&name) {
                let handle = Arc::new(make(&name));
                self.entries.insert(name, handle);
                inserted += 1;
            }
        }

        ReconcileStats {
            evicted,
            inserted,
            retained,
        }
    }
}
