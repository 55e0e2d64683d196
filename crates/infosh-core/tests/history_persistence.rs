// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Verify history survives sessions and tolerates broken storage.
// Author: Lukas Bower

use std::rc::Rc;
use std::sync::Arc;

use infosh_core::{
    CommandRegistry, FileStorage, HistoryPersister, HistoryStorage, HistoryStore, Key, KeyEvent,
    MemoryStorage, MemoryTerminal, Session, SessionEnd, Shell, ShellConfig, StorageError,
};
use tokio::sync::mpsc;
use tokio::task::LocalSet;

struct BrokenStorage;

impl HistoryStorage for BrokenStorage {
    fn load(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_owned()))
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_owned()))
    }
}

fn send_line(tx: &mpsc::UnboundedSender<KeyEvent>, line: &str) {
    for ch in line.chars() {
        tx.send(KeyEvent::char(ch)).unwrap();
    }
    tx.send(KeyEvent::plain(Key::Enter)).unwrap();
}

async fn run_session(storage: Arc<dyn HistoryStorage>, lines: &[&str]) -> Vec<String> {
    let config = ShellConfig::default();
    let (queue, persister) = HistoryPersister::spawn(Arc::clone(&storage), &config.history_key);
    let history = HistoryStore::load(storage.as_ref(), &config.history_key, config.history_size)
        .with_persistence(queue);
    let (_terminal, output) = MemoryTerminal::shared();
    let shell = Shell::new(config, Rc::new(CommandRegistry::new()), history, output);
    let mut session = Session::new(shell).with_persister(persister);

    let (tx, mut rx) = mpsc::unbounded_channel();
    for line in lines {
        send_line(&tx, line);
    }
    drop(tx);

    let end = LocalSet::new().run_until(session.run(&mut rx)).await;
    assert_eq!(end, SessionEnd::InputClosed);
    let shell = session.finish().await;
    shell.history().entries().map(str::to_owned).collect()
}

#[tokio::test]
async fn history_is_restored_by_the_next_session() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn HistoryStorage> = Arc::new(FileStorage::new(dir.path()));

    let first = run_session(Arc::clone(&storage), &["ls", "ls", "whoami"]).await;
    assert_eq!(first, ["ls", "whoami"]);

    let payload = std::fs::read_to_string(dir.path().join("history.json")).unwrap();
    assert_eq!(payload, r#"["ls","whoami"]"#);

    let second = run_session(storage, &["help"]).await;
    assert_eq!(second, ["ls", "whoami", "help"]);
}

#[tokio::test]
async fn broken_storage_keeps_history_in_memory() {
    let entries = run_session(Arc::new(BrokenStorage), &["one", "two"]).await;
    assert_eq!(entries, ["one", "two"]);
}

#[test]
fn malformed_payload_starts_empty() {
    let storage = MemoryStorage::with_value("history", "{not json");
    let history = HistoryStore::load(&storage, "history", 10);
    assert!(history.is_empty());
}

#[test]
fn restored_history_is_trimmed_to_capacity() {
    let storage = MemoryStorage::with_value("history", r#"["a","b","c"]"#);
    let history = HistoryStore::load(&storage, "history", 2);
    assert_eq!(history.entries().collect::<Vec<_>>(), ["b", "c"]);
    assert_eq!(history.cursor(), 2);
}
