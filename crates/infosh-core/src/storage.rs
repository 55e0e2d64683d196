// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Durable storage collaborator and fire-and-forget history persistence.
// Author: Lukas Bower

//! Durable storage for the history ring.
//!
//! History writes never block key handling: [`PersistQueue::schedule`] hands a
//! snapshot to a background task that performs the blocking save and logs any
//! failure.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::StorageError;

/// Key/value storage surviving across sessions.
pub trait HistoryStorage: Send + Sync {
    /// Load the value stored under `key`, or `None` if nothing was stored.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Process-local storage, useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-seeded with one value.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut values) = storage.values.lock() {
            values.insert(key.to_owned(), value.to_owned());
        }
        storage
    }

    /// Peek at a stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

impl HistoryStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_owned()))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_owned()))?
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Directory-backed storage keeping one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Store files under `root`, creating it on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl HistoryStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

/// Sending half of the persistence pipeline, owned by the history store.
#[derive(Debug, Clone)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<Vec<String>>,
}

impl PersistQueue {
    /// Queue a full snapshot for saving. Never blocks; a stopped persister
    /// only costs a debug log line.
    pub fn schedule(&self, snapshot: Vec<String>) {
        if self.tx.send(snapshot).is_err() {
            debug!("history persister stopped; snapshot kept in memory only");
        }
    }
}

/// Background task saving history snapshots.
#[derive(Debug)]
pub struct HistoryPersister {
    task: JoinHandle<()>,
}

impl HistoryPersister {
    /// Start the persister on the current tokio runtime and return the queue
    /// feeding it. The task stops once every queue clone is dropped.
    pub fn spawn(storage: Arc<dyn HistoryStorage>, key: impl Into<String>) -> (PersistQueue, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(persist_loop(storage, key.into(), rx));
        (PersistQueue { tx }, Self { task })
    }

    /// Wait for queued snapshots to be written. Call after the queue has
    /// been dropped.
    pub async fn finish(self) {
        if let Err(err) = self.task.await {
            warn!("history persister task failed: {err}");
        }
    }
}

async fn persist_loop(
    storage: Arc<dyn HistoryStorage>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<Vec<String>>,
) {
    while let Some(mut snapshot) = rx.recv().await {
        // Only the newest snapshot matters.
        while let Ok(newer) = rx.try_recv() {
            snapshot = newer;
        }
        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("failed to encode history snapshot: {err}");
                continue;
            }
        };
        let storage = Arc::clone(&storage);
        let key = key.clone();
        let entries = snapshot.len();
        let saved = tokio::task::spawn_blocking(move || storage.save(&key, &payload)).await;
        match saved {
            Ok(Ok(())) => debug!("persisted {entries} history entries"),
            Ok(Err(err)) => warn!("history not persisted: {err}"),
            Err(err) => warn!("history save task failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));
        assert!(storage.load("history").unwrap().is_none());
        storage.save("history", "[\"ls\"]").unwrap();
        assert_eq!(storage.load("history").unwrap().as_deref(), Some("[\"ls\"]"));
        assert!(dir.path().join("state/history.json").is_file());
        assert!(!dir.path().join("state/history.json.tmp").exists());
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        for key in ["", "../escape", "a/b", "with space"] {
            assert!(matches!(
                storage.save(key, "[]"),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn persister_writes_latest_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let (queue, persister) = HistoryPersister::spawn(storage.clone(), "history");
        queue.schedule(vec!["a".to_owned()]);
        queue.schedule(vec!["a".to_owned(), "b".to_owned()]);
        drop(queue);
        persister.finish().await;
        assert_eq!(storage.get("history").as_deref(), Some(r#"["a","b"]"#));
    }
}
