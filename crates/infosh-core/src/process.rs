// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Foreground process tracking and one-shot exit signalling.
// Author: Lukas Bower

//! Foreground process tracking.
//!
//! At most one [`ProcessHandle`] is active. Each handle carries the receiving
//! half of a one-shot channel; the matching [`ExitSignal`] is consumed when
//! the handler finishes, so a process can report its exit only once.

use std::fmt;

use log::debug;
use tokio::sync::oneshot;

use crate::cancel::CancelToken;
use crate::error::ShellError;

/// Identifier of a foreground process, unique within a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(u64);

impl ProcessId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a foreground process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Handler returned `Ok`.
    Success,
    /// Handler returned an error (already reported to the output).
    Failed,
    /// Handler stopped after observing an interrupt.
    Interrupted,
    /// Handler panicked (already reported to the output).
    Panicked,
    /// The exit signal was dropped without being sent.
    Lost,
}

/// Exit notification for one process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Process that ended.
    pub pid: ProcessId,
    /// How it ended.
    pub status: ExitStatus,
}

/// Sending half of a process's exit channel.
#[derive(Debug)]
pub struct ExitSignal {
    pid: ProcessId,
    tx: oneshot::Sender<ExitStatus>,
}

impl ExitSignal {
    /// Process this signal belongs to.
    #[must_use]
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Report the exit. Consumes the signal.
    pub fn send(self, status: ExitStatus) {
        if self.tx.send(status).is_err() {
            debug!("process {} exited after the shell stopped waiting", self.pid);
        }
    }
}

/// Live foreground process as seen by the tracker.
#[derive(Debug)]
pub struct ProcessHandle {
    id: ProcessId,
    command: String,
    cancel: CancelToken,
    exit: oneshot::Receiver<ExitStatus>,
    status: Option<ExitStatus>,
}

impl ProcessHandle {
    /// Create a handle and the signal its handler will fire on exit.
    pub fn new(id: ProcessId, command: impl Into<String>, cancel: CancelToken) -> (Self, ExitSignal) {
        let (tx, exit) = oneshot::channel();
        let handle = Self {
            id,
            command: command.into(),
            cancel,
            exit,
            status: None,
        };
        (handle, ExitSignal { pid: id, tx })
    }

    /// Process identifier.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// Command identifier that started the process.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Cancellation token shared with the handler.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    async fn wait(&mut self) -> ExitStatus {
        if let Some(status) = self.status {
            return status;
        }
        let status = (&mut self.exit).await.unwrap_or(ExitStatus::Lost);
        self.status = Some(status);
        status
    }

    fn poll_exit(&mut self) -> Option<ExitStatus> {
        if self.status.is_none() {
            self.status = match self.exit.try_recv() {
                Ok(status) => Some(status),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(ExitStatus::Lost),
            };
        }
        self.status
    }
}

/// Owner of the single foreground process slot.
#[derive(Debug, Default)]
pub struct ProcessTracker {
    active: Option<ProcessHandle>,
}

impl ProcessTracker {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handle` the foreground process. A second concurrent process is
    /// refused and its token cancelled.
    pub fn begin(&mut self, handle: ProcessHandle) -> Result<(), ShellError> {
        if let Some(active) = &self.active {
            handle.cancel.cancel();
            return Err(ShellError::IllegalState { active: active.id });
        }
        debug!("process {} ({}) started", handle.id, handle.command);
        self.active = Some(handle);
        Ok(())
    }

    /// Release the foreground slot.
    pub fn end(&mut self) -> Option<ProcessHandle> {
        let handle = self.active.take()?;
        debug!("process {} ({}) released", handle.id, handle.command);
        Some(handle)
    }

    /// True while a foreground process holds the slot.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The foreground process, if any.
    #[must_use]
    pub fn active(&self) -> Option<&ProcessHandle> {
        self.active.as_ref()
    }

    /// Ask the foreground process to stop. Returns false when idle or when
    /// an interrupt was already requested.
    pub fn interrupt(&self) -> bool {
        match &self.active {
            Some(handle) => {
                let requested = handle.cancel.cancel();
                if requested {
                    debug!("interrupt requested for process {}", handle.id);
                }
                requested
            }
            None => false,
        }
    }

    /// Wait for the foreground process to signal its exit. Never resolves
    /// while idle. Cancel-safe.
    pub async fn wait_for_exit(&mut self) -> ProcessExit {
        match self.active.as_mut() {
            Some(handle) => {
                let status = handle.wait().await;
                ProcessExit {
                    pid: handle.id,
                    status,
                }
            }
            None => std::future::pending().await,
        }
    }

    /// Non-blocking check for the foreground process's exit.
    pub fn try_exit(&mut self) -> Option<ProcessExit> {
        let handle = self.active.as_mut()?;
        let status = handle.poll_exit()?;
        Some(ProcessExit {
            pid: handle.id,
            status,
        })
    }
}
