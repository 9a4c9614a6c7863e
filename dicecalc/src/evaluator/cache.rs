//! Evaluation memo table
//!
//! Entries are keyed by the structural hash of an expression combined with
//! the hash of the current values of every name it depends on. A changed
//! binding changes the key, so stale entries become unreachable instead of
//! being overwritten. Unreachable entries are dropped by [`Cache::sweep`].

use super::context::Env;
use crate::{Expression, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    expression: u32,
    dependencies: u32,
}

impl CacheKey {
    pub fn new(expr: &Expression, dependencies: &[Arc<str>], env: &Env) -> Self {
        Self {
            expression: expr.structural_hash(),
            dependencies: crate::hash::dependencies(dependencies, env),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    used: bool,
}

/// Counters since the cache was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
}

/// Process-wide memo table.
///
/// Not synchronized: one cache belongs to one evaluation at a time.
#[derive(Debug, Default)]
pub struct Cache {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
    stores: u64,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value, marking the entry as used.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<Value> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.used = true;
                self.hits += 1;
                trace!(?key, "cache hit");
                Some(entry.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store a freshly computed value. New entries count as used.
    pub fn store(&mut self, key: CacheKey, value: Value) {
        self.stores += 1;
        self.entries.insert(key, CacheEntry { value, used: true });
    }

    /// Drop every entry not used since the previous sweep and reset the
    /// marks of the survivors. Returns the number of dropped entries.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| std::mem::take(&mut entry.used));
        let evicted = before - self.entries.len();
        trace!(evicted, remaining = self.entries.len(), "cache swept");
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            stores: self.stores,
        }
    }
}
