// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Async session driver feeding key events and exit notifications to the shell.
// Author: Lukas Bower

//! Session driver.
//!
//! [`Session`] owns a [`Shell`] and the history persister behind it. It
//! interleaves key events with foreground exit notifications on a single
//! task, so every state transition happens in arrival order.

use log::{debug, info};
use tokio::sync::mpsc;

use crate::key::KeyEvent;
use crate::shell::{KeyOutcome, Shell};
use crate::storage::HistoryPersister;

/// Why [`Session::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The exit chord was pressed.
    ExitRequested,
    /// The key source closed; any foreground process was awaited first.
    InputClosed,
}

/// A shell bound to its history persister.
pub struct Session {
    shell: Shell,
    persister: Option<HistoryPersister>,
}

impl Session {
    /// Wrap `shell` without background persistence.
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            persister: None,
        }
    }

    /// Attach the persister draining the shell's history queue.
    #[must_use]
    pub fn with_persister(mut self, persister: HistoryPersister) -> Self {
        self.persister = Some(persister);
        self
    }

    /// The wrapped shell.
    #[must_use]
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// The wrapped shell, mutably.
    pub fn shell_mut(&mut self) -> &mut Shell {
        &mut self.shell
    }

    /// Greet, wait out the startup delay, and show the first prompt.
    pub async fn start(&mut self) {
        self.shell.greet();
        let delay = self.shell.config().startup_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.shell.show_first_prompt();
        info!("session ready");
    }

    /// Dispatch key events until the exit chord or the end of input.
    ///
    /// Must be polled inside a `LocalSet`: commands run as local tasks.
    pub async fn run(&mut self, keys: &mut mpsc::UnboundedReceiver<KeyEvent>) -> SessionEnd {
        loop {
            let running = self.shell.is_running();
            tokio::select! {
                biased;
                exit = self.shell.wait_for_exit(), if running => {
                    self.shell.complete(exit);
                }
                key = keys.recv() => match key {
                    Some(event) => {
                        if let KeyOutcome::ExitRequested = self.shell.handle_key(&event) {
                            return SessionEnd::ExitRequested;
                        }
                    }
                    None => {
                        debug!("key source closed");
                        self.shell.settle().await;
                        return SessionEnd::InputClosed;
                    }
                },
            }
        }
    }

    /// Stop persisting and wait for pending history writes. Returns the shell.
    pub async fn finish(mut self) -> Shell {
        self.shell.history_mut().detach_persistence();
        if let Some(persister) = self.persister.take() {
            persister.finish().await;
        }
        info!("session closed");
        self.shell
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::config::ShellConfig;
    use crate::history::HistoryStore;
    use crate::key::Key;
    use crate::registry::CommandRegistry;
    use crate::terminal::MemoryTerminal;

    #[tokio::test]
    async fn greeting_precedes_first_prompt() {
        let (terminal, output) = MemoryTerminal::shared();
        let config = ShellConfig {
            prompt: "> ".to_owned(),
            banner: vec!["hello".to_owned()],
            ..ShellConfig::default()
        };
        let shell = Shell::new(
            config,
            Rc::new(CommandRegistry::new()),
            HistoryStore::new(4),
            output,
        );
        let mut session = Session::new(shell);
        session.start().await;
        assert_eq!(
            terminal.borrow().transcript(),
            "hello\r\ncreating new session...\r\n> "
        );
    }

    #[tokio::test]
    async fn run_stops_on_exit_chord() {
        let (_terminal, output) = MemoryTerminal::shared();
        let shell = Shell::new(
            ShellConfig::default(),
            Rc::new(CommandRegistry::new()),
            HistoryStore::new(4),
            output,
        );
        let mut session = Session::new(shell);
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(KeyEvent::char('x')).unwrap();
        tx.send(KeyEvent::ctrl('d')).unwrap();
        tx.send(KeyEvent::plain(Key::Enter)).unwrap();

        let local = tokio::task::LocalSet::new();
        let end = local.run_until(session.run(&mut rx)).await;
        assert_eq!(end, SessionEnd::ExitRequested);
        assert_eq!(session.shell().input(), "x");
        assert!(rx.try_recv().is_ok());
    }
}
