//! Global string table backing [`Symbol`](super::Symbol).
//!
//! Strings are interned once and leaked to `'static` so a `Symbol` can hand
//! back a `&'static str` without borrowing from any particular arena. This is
//! the same tradeoff the reference interner makes: the compiler runs for a
//! single, short-lived invocation, so "never free an interned string" is
//! cheaper to reason about than reference counting.

use dashmap::DashMap;
use std::sync::{OnceLock, RwLock};

/// Process-wide interner. `DashMap` gives lock-free reads/writes across
/// shards; a plain `RwLock<Vec<_>>` backs the reverse (index -> str) lookup
/// since it is append-only and read far more often than written.
pub struct StringTable {
    forward: DashMap<&'static str, u32>,
    backward: RwLock<Vec<&'static str>>,
}

impl StringTable {
    fn new() -> Self {
        Self {
            forward: DashMap::new(),
            backward: RwLock::new(Vec::new()),
        }
    }

    pub fn intern(&self, s: &str) -> u32 {
        if let Some(existing) = self.forward.get(s) {
            return *existing;
        }
        // Re-check under the write lock in case another thread interned the
        // same string between the read above and here.
        let mut backward = self.backward.write().unwrap();
        if let Some(existing) = self.forward.get(s) {
            return *existing;
        }
        let leaked: &'static str = Box::leak(s.to_string().into_boxed_str());
        let index = backward.len() as u32;
        backward.push(leaked);
        self.forward.insert(leaked, index);
        index
    }

    pub fn resolve(&self, index: u32) -> &'static str {
        self.backward.read().unwrap()[index as usize]
    }
}

static TABLE: OnceLock<StringTable> = OnceLock::new();

pub fn global() -> &'static StringTable {
    TABLE.get_or_init(StringTable::new)
}
