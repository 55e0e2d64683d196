// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: ANSI terminal writer backing the interactive session on a byte sink.
// Author: Lukas Bower

//! ANSI terminal over any [`Write`] sink.

use std::io::{self, Write};

use infosh_core::Terminal;
use log::warn;

/// Erase the screen and home the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Terminal writing text and ANSI control sequences to a byte sink.
///
/// Writes are flushed immediately so echoed keystrokes appear without
/// waiting for a newline. I/O failures are logged and otherwise dropped.
#[derive(Debug)]
pub struct AnsiTerminal<W: Write> {
    sink: W,
    failed: bool,
}

impl AnsiTerminal<io::Stdout> {
    /// Terminal on the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> AnsiTerminal<W> {
    /// Wrap `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            failed: false,
        }
    }

    /// Consume the terminal and return the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn emit(&mut self, text: &str) {
        let result = self
            .sink
            .write_all(text.as_bytes())
            .and_then(|()| self.sink.flush());
        if let Err(err) = result {
            // Report the first failure only; a closed stdout fails every write.
            if !self.failed {
                warn!("terminal write failed: {err}");
                self.failed = true;
            }
        }
    }
}

impl<W: Write> Terminal for AnsiTerminal<W> {
    fn write(&mut self, text: &str) {
        self.emit(text);
    }

    fn clear(&mut self) {
        self.emit(CLEAR_SCREEN);
    }
}
