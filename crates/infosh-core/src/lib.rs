// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Line editing, history, and command dispatch core for the info terminal.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Interactive line-editing and command-dispatch core for the info terminal.
//!
//! The crate owns the keystroke state machine ([`Shell`]), the editable
//! input line, the persisted history ring, and the single foreground
//! process contract. Rendering, storage, and the commands themselves are
//! collaborators reached through [`Terminal`], [`HistoryStorage`], and
//! [`CommandHandler`].

pub mod cancel;
pub mod config;
pub mod editor;
pub mod error;
pub mod executor;
pub mod history;
pub mod key;
pub mod process;
pub mod registry;
pub mod session;
pub mod shell;
pub mod storage;
pub mod terminal;

pub use cancel::CancelToken;
pub use config::{
    ConfigError, KeyBindings, ShellConfig, DEFAULT_HISTORY_KEY, DEFAULT_HISTORY_SIZE,
    DEFAULT_PROMPT,
};
pub use editor::LineEditor;
pub use error::{HandlerError, ShellError, StorageError};
pub use executor::Executor;
pub use history::HistoryStore;
pub use key::{Key, KeyChord, KeyEvent, Modifiers};
pub use process::{ExitSignal, ExitStatus, ProcessExit, ProcessHandle, ProcessId, ProcessTracker};
pub use registry::{
    Arity, CommandContext, CommandDescriptor, CommandHandler, CommandRegistry, HandlerFuture,
};
pub use session::{Session, SessionEnd};
pub use shell::{KeyOutcome, Shell, ShellState};
pub use storage::{FileStorage, HistoryPersister, HistoryStorage, MemoryStorage, PersistQueue};
pub use terminal::{MemoryTerminal, Output, Terminal};
