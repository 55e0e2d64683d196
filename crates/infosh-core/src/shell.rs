// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Keystroke dispatch state machine gating input on the foreground process.
// Author: Lukas Bower

//! Keystroke dispatch.
//!
//! [`Shell`] is the whole session state: input line, history, foreground
//! process slot, and executor. It is idle while no process runs and running
//! otherwise; in the running state only the interrupt chord has an effect.

use std::rc::Rc;

use log::{debug, info};

use crate::config::ShellConfig;
use crate::editor::LineEditor;
use crate::error::ShellError;
use crate::executor::Executor;
use crate::history::HistoryStore;
use crate::key::{Key, KeyEvent};
use crate::process::{ProcessExit, ProcessId, ProcessTracker};
use crate::registry::CommandRegistry;
use crate::terminal::Output;

/// Echoed when the user cancels a line or interrupts a process.
pub const INTERRUPT_ECHO: &str = "^C";

/// Written after the greeting while the session warms up.
pub const SESSION_NOTICE: &str = "creating new session...";

/// Whether a foreground process holds the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    /// Editing the input line.
    Idle,
    /// A foreground process is running.
    Running,
}

/// What a key event did.
#[derive(Debug)]
pub enum KeyOutcome {
    /// No effect.
    Ignored,
    /// The input line changed.
    Edited,
    /// A history entry replaced the input line.
    Recalled,
    /// Enter on a blank line: prompt shown again.
    Blank,
    /// The line started a foreground process.
    Started(ProcessId),
    /// The line was recorded but could not start; the error was written.
    Rejected(ShellError),
    /// The display was cleared.
    Cleared,
    /// The input line was discarded.
    Cancelled,
    /// The foreground process was asked to stop.
    Interrupted,
    /// The user asked to end the session.
    ExitRequested,
}

type ExitHook = Box<dyn FnMut(&Output)>;

/// Interactive shell session state.
pub struct Shell {
    config: ShellConfig,
    output: Output,
    editor: LineEditor,
    history: HistoryStore,
    tracker: ProcessTracker,
    executor: Executor,
    on_exit: Option<ExitHook>,
}

impl Shell {
    /// Assemble a shell from its collaborators.
    pub fn new(
        config: ShellConfig,
        registry: Rc<CommandRegistry>,
        history: HistoryStore,
        output: Output,
    ) -> Self {
        let executor = Executor::new(registry, output.clone());
        Self {
            config,
            output,
            editor: LineEditor::new(),
            history,
            tracker: ProcessTracker::new(),
            executor,
            on_exit: None,
        }
    }

    /// Run `hook` when the exit chord is pressed.
    #[must_use]
    pub fn on_exit(mut self, hook: impl FnMut(&Output) + 'static) -> Self {
        self.on_exit = Some(Box::new(hook));
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ShellState {
        if self.tracker.is_active() {
            ShellState::Running
        } else {
            ShellState::Idle
        }
    }

    /// True while a foreground process runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.tracker.is_active()
    }

    /// Unsubmitted input.
    #[must_use]
    pub fn input(&self) -> &str {
        self.editor.as_str()
    }

    /// Command history.
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Mutable command history.
    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    /// Foreground process slot.
    #[must_use]
    pub fn tracker(&self) -> &ProcessTracker {
        &self.tracker
    }

    /// Registered commands.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        self.executor.registry()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Terminal output.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Write the greeting banner.
    pub fn greet(&self) {
        for line in &self.config.banner {
            self.output.write_line(line);
        }
        self.output.write_line(SESSION_NOTICE);
    }

    /// Write the prompt on the current line (first prompt of a session).
    pub fn show_first_prompt(&self) {
        self.output.write(&self.config.prompt);
    }

    /// Move to a new line and write the prompt.
    pub fn show_prompt(&self) {
        self.output.write("\r\n");
        self.output.write(&self.config.prompt);
    }

    /// Route one key event.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if self.tracker.is_active() {
            return self.handle_running_key(event);
        }

        let keys = self.config.keys;
        if keys.exit.matches(event) {
            info!("session exit requested");
            if let Some(hook) = self.on_exit.as_mut() {
                hook(&self.output);
            }
            return KeyOutcome::ExitRequested;
        }
        if keys.clear.matches(event) {
            self.output.clear();
            return KeyOutcome::Cleared;
        }
        if keys.cancel_line.matches(event) {
            self.output.write(INTERRUPT_ECHO);
            self.editor.clear();
            self.history.reset_cursor();
            self.show_prompt();
            return KeyOutcome::Cancelled;
        }
        if event.modifiers.has_command_modifier() {
            return KeyOutcome::Ignored;
        }

        match event.key {
            Key::Enter => self.submit(),
            Key::Backspace => {
                if self.editor.delete_last(&self.output) {
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::ArrowUp => {
                let recalled = self.history.recall_previous().map(str::to_owned);
                self.show_recalled(recalled)
            }
            Key::ArrowDown => {
                let recalled = self.history.recall_next().map(str::to_owned);
                self.show_recalled(recalled)
            }
            _ => match event.printable() {
                Some(ch) => {
                    self.editor.insert(ch, &self.output);
                    KeyOutcome::Edited
                }
                None => KeyOutcome::Ignored,
            },
        }
    }

    /// Apply an exit notification: release the foreground slot and show the
    /// prompt. Stale notifications for other processes are ignored.
    pub fn complete(&mut self, exit: ProcessExit) -> bool {
        let current = self.tracker.active().map(|handle| handle.id());
        if current != Some(exit.pid) {
            debug!("ignoring exit of process {} (active: {current:?})", exit.pid);
            return false;
        }
        self.tracker.end();
        debug!("process {} exited with {:?}", exit.pid, exit.status);
        self.show_prompt();
        true
    }

    /// Wait for the foreground process's exit notification without applying
    /// it. Never resolves while idle. Cancel-safe.
    pub async fn wait_for_exit(&mut self) -> ProcessExit {
        self.tracker.wait_for_exit().await
    }

    /// Apply the foreground process's exit if it already happened.
    pub fn poll_exit(&mut self) -> Option<ProcessExit> {
        let exit = self.tracker.try_exit()?;
        self.complete(exit);
        Some(exit)
    }

    /// Wait for the foreground process (if any) to exit and apply it.
    pub async fn settle(&mut self) -> Option<ProcessExit> {
        if !self.tracker.is_active() {
            return None;
        }
        let exit = self.tracker.wait_for_exit().await;
        self.complete(exit);
        Some(exit)
    }

    fn handle_running_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        if !self.config.keys.interrupt.matches(event) {
            return KeyOutcome::Ignored;
        }
        if self.tracker.interrupt() {
            self.output.write(INTERRUPT_ECHO);
        }
        KeyOutcome::Interrupted
    }

    fn show_recalled(&mut self, recalled: Option<String>) -> KeyOutcome {
        match recalled {
            Some(line) => {
                self.editor.replace(&line, &self.output);
                KeyOutcome::Recalled
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn submit(&mut self) -> KeyOutcome {
        let raw = self.editor.take();
        let line = raw.trim();
        if line.is_empty() {
            self.history.reset_cursor();
            self.show_prompt();
            return KeyOutcome::Blank;
        }

        self.output.write_line("");
        debug!("submitting {line:?}");
        let started = self.executor.execute(&mut self.tracker, line);
        self.history.record(line);
        match started {
            Ok(pid) => KeyOutcome::Started(pid),
            Err(err) => {
                debug!("rejected {line:?}: {err}");
                self.output.write(&err.to_string());
                self.show_prompt();
                KeyOutcome::Rejected(err)
            }
        }
    }
}
