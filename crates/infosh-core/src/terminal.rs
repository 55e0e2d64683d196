// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Terminal output collaborator and the shared output handle.
// Author: Lukas Bower

//! Terminal output collaborator.
//!
//! The shell and every running handler write through a cloned [`Output`].
//! All of them live on one thread, so the handle is a plain
//! `Rc<RefCell<_>>` borrowed only for the duration of a single write.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Surface the shell renders onto.
pub trait Terminal {
    /// Write raw text (may include control sequences such as `\b`).
    fn write(&mut self, text: &str);

    /// Write text followed by a line break.
    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\r\n");
    }

    /// Clear the visible display.
    fn clear(&mut self);
}

/// Cloneable handle onto the session terminal.
#[derive(Clone)]
pub struct Output {
    inner: Rc<RefCell<dyn Terminal>>,
}

impl Output {
    /// Wrap an owned terminal.
    pub fn new<T: Terminal + 'static>(terminal: T) -> Self {
        Self::shared(Rc::new(RefCell::new(terminal)))
    }

    /// Wrap a terminal the caller keeps a handle to (tests inspect it).
    pub fn shared<T: Terminal + 'static>(terminal: Rc<RefCell<T>>) -> Self {
        Self { inner: terminal }
    }

    /// Write raw text.
    pub fn write(&self, text: &str) {
        self.inner.borrow_mut().write(text);
    }

    /// Write text followed by a line break.
    pub fn write_line(&self, text: &str) {
        self.inner.borrow_mut().write_line(text);
    }

    /// Clear the visible display.
    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

/// In-memory terminal recording everything written to it.
#[derive(Debug, Default)]
pub struct MemoryTerminal {
    transcript: String,
    clears: usize,
}

impl MemoryTerminal {
    /// Create an empty terminal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a terminal together with an [`Output`] writing into it.
    pub fn shared() -> (Rc<RefCell<Self>>, Output) {
        let terminal = Rc::new(RefCell::new(Self::new()));
        let output = Output::shared(Rc::clone(&terminal));
        (terminal, output)
    }

    /// Everything written so far. Clearing the display does not erase it.
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Return and reset the transcript.
    pub fn take_transcript(&mut self) -> String {
        std::mem::take(&mut self.transcript)
    }

    /// Number of times the display was cleared.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears
    }
}

impl Terminal for MemoryTerminal {
    fn write(&mut self, text: &str) {
        self.transcript.push_str(text);
    }

    fn clear(&mut self) {
        self.clears += 1;
    }
}
