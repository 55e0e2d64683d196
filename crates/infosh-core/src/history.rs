// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Bounded command history ring with recall cursor and persistence.
// Author: Lukas Bower

//! Bounded command history with up/down recall.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::error::ShellError;
use crate::storage::{HistoryStorage, PersistQueue};

/// Submitted lines, oldest first, capped at `capacity`.
///
/// The recall cursor ranges over `0..=len`; `len` means "fresh line, not
/// browsing". Every `record` puts it back to `len`.
#[derive(Debug)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
    cursor: usize,
    persist: Option<PersistQueue>,
}

impl HistoryStore {
    /// Create an empty, memory-only store. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
            persist: None,
        }
    }

    /// Create a store from previously saved entries, keeping the newest
    /// `capacity` of them.
    #[must_use]
    pub fn from_entries(entries: Vec<String>, capacity: usize) -> Self {
        let mut store = Self::new(capacity);
        let skip = entries.len().saturating_sub(store.capacity);
        store.entries.extend(entries.into_iter().skip(skip));
        store.cursor = store.entries.len();
        store
    }

    /// Restore the store from durable storage. Unreadable or malformed data
    /// yields an empty store and a warning.
    pub fn load(storage: &dyn HistoryStorage, key: &str, capacity: usize) -> Self {
        match read_entries(storage, key) {
            Ok(entries) => {
                debug!("restored {} history entries", entries.len());
                Self::from_entries(entries, capacity)
            }
            Err(err) => {
                warn!("starting with empty history: {err}");
                Self::new(capacity)
            }
        }
    }

    /// Persist future changes through `queue`.
    #[must_use]
    pub fn with_persistence(mut self, queue: PersistQueue) -> Self {
        self.persist = Some(queue);
        self
    }

    /// Stop persisting and hand back the queue (dropping it lets the
    /// persister drain and exit).
    pub fn detach_persistence(&mut self) -> Option<PersistQueue> {
        self.persist.take()
    }

    /// Record a submitted line. Returns false when it repeated the newest
    /// entry and was skipped.
    pub fn record(&mut self, line: &str) -> bool {
        let repeated = self.entries.back().is_some_and(|last| last == line);
        if !repeated {
            self.entries.push_back(line.to_owned());
            while self.entries.len() > self.capacity {
                self.entries.pop_front();
            }
            if let Some(queue) = &self.persist {
                queue.schedule(self.entries.iter().cloned().collect());
            }
        }
        self.reset_cursor();
        !repeated
    }

    /// Step back one entry; stays on the oldest entry once reached.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = self.cursor.saturating_sub(1);
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step forward one entry. Returns `""` when stepping past the newest
    /// entry and `None` when already on the fresh line.
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.cursor >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries.get(self.cursor).map_or("", String::as_str))
    }

    /// Return the cursor to the fresh line.
    pub fn reset_cursor(&mut self) {
        self.cursor = self.entries.len();
    }

    /// Current recall cursor.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries kept.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored entries, oldest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }
}

/// Decode a persisted history payload (a JSON array of strings).
pub fn decode_entries(payload: &str) -> Result<Vec<String>, ShellError> {
    Ok(serde_json::from_str(payload)?)
}

fn read_entries(storage: &dyn HistoryStorage, key: &str) -> Result<Vec<String>, ShellError> {
    match storage.load(key)? {
        Some(payload) => decode_entries(&payload),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStorage;

    fn entries(store: &HistoryStore) -> Vec<&str> {
        store.entries().collect()
    }

    #[test]
    fn bound_evicts_oldest_first() {
        let mut store = HistoryStore::new(3);
        for line in ["a", "b", "c", "d"] {
            store.record(line);
        }
        assert_eq!(entries(&store), ["b", "c", "d"]);
        assert_eq!(store.cursor(), 3);
    }

    #[test]
    fn immediate_repeats_are_recorded_once() {
        let mut store = HistoryStore::new(10);
        assert!(store.record("ls"));
        assert!(!store.record("ls"));
        assert!(store.record("pwd"));
        assert!(store.record("ls"));
        assert_eq!(entries(&store), ["ls", "pwd", "ls"]);
    }

    #[test]
    fn recall_walks_back_clamps_and_returns_to_fresh_line() {
        let mut store = HistoryStore::new(10);
        for line in ["a", "b", "c"] {
            store.record(line);
        }
        assert_eq!(store.recall_next(), None);
        assert_eq!(store.recall_previous(), Some("c"));
        assert_eq!(store.recall_previous(), Some("b"));
        assert_eq!(store.recall_previous(), Some("a"));
        assert_eq!(store.recall_previous(), Some("a"));
        assert_eq!(store.cursor(), 0);
        assert_eq!(store.recall_next(), Some("b"));
        assert_eq!(store.recall_next(), Some("c"));
        assert_eq!(store.recall_next(), Some(""));
        assert_eq!(store.recall_next(), None);
    }

    #[test]
    fn record_resets_cursor_even_for_repeats() {
        let mut store = HistoryStore::new(10);
        store.record("a");
        store.record("b");
        store.recall_previous();
        store.recall_previous();
        assert_eq!(store.cursor(), 0);
        store.record("b");
        assert_eq!(store.cursor(), 2);
    }

    #[test]
    fn empty_store_has_nothing_to_recall() {
        let mut store = HistoryStore::new(5);
        assert_eq!(store.recall_previous(), None);
        assert_eq!(store.recall_next(), None);
    }

    #[test]
    fn load_keeps_newest_entries_within_bound() {
        let storage = MemoryStorage::with_value("history", r#"["a","b","c","d"]"#);
        let store = HistoryStore::load(&storage, "history", 2);
        assert_eq!(entries(&store), ["c", "d"]);
        assert_eq!(store.cursor(), 2);
    }

    #[test]
    fn malformed_payload_starts_empty() {
        let storage = MemoryStorage::with_value("history", "{not json");
        let store = HistoryStore::load(&storage, "history", 5);
        assert!(store.is_empty());
        assert!(matches!(
            decode_entries("[1, 2]"),
            Err(ShellError::MalformedHistoryData(_))
        ));
    }

    #[test]
    fn unreadable_storage_starts_empty() {
        struct Offline;
        impl HistoryStorage for Offline {
            fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Unavailable("offline".to_owned()))
            }
            fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::Unavailable("offline".to_owned()))
            }
        }
        let store = HistoryStore::load(&Offline, "history", 5);
        assert!(store.is_empty());
        assert!(matches!(
            read_entries(&Offline, "history"),
            Err(ShellError::PersistenceFailure(_))
        ));
    }
}
