// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Error types surfaced by the infosh shell core.
// Author: Lukas Bower

//! Error types surfaced by the shell core.

use std::io;

use thiserror::Error;

use crate::process::ProcessId;
use crate::registry::Arity;

/// Errors raised while resolving, starting, or persisting shell work.
///
/// Resolution and argument errors are reported to the terminal and never end
/// the session; persistence errors are logged and otherwise ignored.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The first token of the submitted line names no registered command.
    #[error("command not found: {0}")]
    UnknownCommand(String),
    /// The argument count does not satisfy the command's arity.
    #[error("{command}: expected {expected}, got {got}")]
    ArgumentError {
        /// Command identifier.
        command: String,
        /// Accepted argument counts.
        expected: Arity,
        /// Number of arguments supplied.
        got: usize,
    },
    /// A process was started while another was still in the foreground.
    #[error("process {active} is still running")]
    IllegalState {
        /// Identifier of the process that holds the foreground.
        active: ProcessId,
    },
    /// Durable storage could not be read or written.
    #[error("history persistence failed: {0}")]
    PersistenceFailure(#[from] StorageError),
    /// Stored history could not be decoded.
    #[error("stored history is malformed: {0}")]
    MalformedHistoryData(#[from] serde_json::Error),
    /// A command with the same identifier is already registered.
    #[error("command {0} is already registered")]
    DuplicateCommand(String),
    /// Command identifiers must be non-empty and free of whitespace.
    #[error("invalid command identifier {0:?}")]
    InvalidCommandId(String),
    /// The declared arity accepts no argument count.
    #[error("command {command} declares an empty arity range {min}..={max}")]
    InvalidArity {
        /// Command identifier.
        command: String,
        /// Declared minimum.
        min: usize,
        /// Declared maximum.
        max: usize,
    },
}

/// Errors raised by [`crate::HistoryStorage`] implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    /// Storage backend is not reachable (quota, permissions, offline).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The key cannot be mapped onto the backend.
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Errors produced by handler helpers that observe cancellation.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandlerError {
    /// The foreground process was interrupted.
    #[error("interrupted")]
    Interrupted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_error_names_command_and_counts() {
        let err = ShellError::ArgumentError {
            command: "echo".to_owned(),
            expected: Arity::Exactly(1),
            got: 3,
        };
        assert_eq!(err.to_string(), "echo: expected 1 argument, got 3");
    }

    #[test]
    fn unknown_command_mentions_identifier() {
        let err = ShellError::UnknownCommand("frobnicate".to_owned());
        assert!(err.to_string().contains("frobnicate"));
    }
}
