//! Deduplication of emitted card texts.
//!
//! The orchestrator only needs `contains` and `add`, so storage is swappable:
//! in-memory for tests and the CLI, file-backed for the server.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Previously emitted card texts, keyed by exact string equality.
pub trait DedupStore: Send + Sync {
    /// Whether the text was emitted before.
    fn contains(&self, text: &str) -> bool;

    /// Record an emitted text.
    fn add(&self, text: String);

    /// Number of remembered texts.
    fn len(&self) -> usize;

    /// Whether nothing has been remembered yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insertion-ordered set with an optional capacity.
///
/// When `entries_max` is set, the oldest entries are evicted first.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
    order: VecDeque<String>,
    entries_max: Option<usize>,
}

impl DedupSet {
    /// Create an empty set.
    pub fn new(entries_max: Option<usize>) -> Self {
        debug_assert!(entries_max != Some(0), "Capacity must be positive when set");

        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            entries_max,
        }
    }

    /// Create from existing entries, keeping the first occurrence of each.
    pub fn from_entries(
        entries: impl IntoIterator<Item = String>,
        entries_max: Option<usize>,
    ) -> Self {
        let mut set = Self::new(entries_max);
        for entry in entries {
            set.insert(entry);
        }
        set
    }

    /// Whether the text is present.
    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(text)
    }

    /// Insert a text. Returns false if it was already present.
    pub fn insert(&mut self, text: String) -> bool {
        if self.seen.contains(&text) {
            return false;
        }

        self.seen.insert(text.clone());
        self.order.push_back(text);

        if let Some(max) = self.entries_max {
            while self.order.len() > max {
                if let Some(oldest) = self.order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }

        debug_assert_eq!(self.seen.len(), self.order.len());
        true
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }
}

/// Process-local dedup store.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    set: Mutex<DedupSet>,
}

impl MemoryDedupStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that keeps at most `entries_max` texts.
    pub fn with_capacity_max(entries_max: usize) -> Self {
        Self {
            set: Mutex::new(DedupSet::new(Some(entries_max))),
        }
    }

    /// Create a store pre-filled with texts.
    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            set: Mutex::new(DedupSet::from_entries(entries, None)),
        }
    }
}

impl DedupStore for MemoryDedupStore {
    fn contains(&self, text: &str) -> bool {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(text)
    }

    fn add(&self, text: String) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(text);
    }

    fn len(&self) -> usize {
        self.set.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
