// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Editable input line and the terminal redraws it requires.
// Author: Lukas Bower

//! Editable input line.

use crate::terminal::Output;

/// Cursor-left, blank, cursor-left: erases one displayed cell.
pub const ERASE_CELL: &str = "\u{8} \u{8}";

/// Input line the user is typing. Edits are append/remove-at-end only and
/// each one echoes the matching redraw.
#[derive(Debug, Default, Clone)]
pub struct LineEditor {
    line: String,
}

impl LineEditor {
    /// Create an empty editor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current line contents.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.line
    }

    /// Length in characters (terminal cells for the prompt line).
    #[must_use]
    pub fn len(&self) -> usize {
        self.line.chars().count()
    }

    /// True when nothing has been typed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Append `ch` and echo it.
    pub fn insert(&mut self, ch: char, out: &Output) {
        self.line.push(ch);
        let mut buf = [0u8; 4];
        out.write(ch.encode_utf8(&mut buf));
    }

    /// Remove the last character and erase it on screen. Returns false when
    /// the line was already empty.
    pub fn delete_last(&mut self, out: &Output) -> bool {
        if self.line.pop().is_none() {
            return false;
        }
        out.write(ERASE_CELL);
        true
    }

    /// Erase the displayed line and show `new_line` in its place.
    pub fn replace(&mut self, new_line: &str, out: &Output) {
        let erase = ERASE_CELL.repeat(self.len());
        if !erase.is_empty() {
            out.write(&erase);
        }
        if !new_line.is_empty() {
            out.write(new_line);
        }
        self.line.clear();
        self.line.push_str(new_line);
    }

    /// Drop the contents without touching the display.
    pub fn clear(&mut self) {
        self.line.clear();
    }

    /// Move the contents out, leaving the editor empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::MemoryTerminal;

    #[test]
    fn insert_echoes_each_character() {
        let (terminal, out) = MemoryTerminal::shared();
        let mut editor = LineEditor::new();
        for ch in "héllo".chars() {
            editor.insert(ch, &out);
        }
        assert_eq!(editor.as_str(), "héllo");
        assert_eq!(editor.len(), 5);
        assert_eq!(terminal.borrow().transcript(), "héllo");
    }

    #[test]
    fn delete_last_is_a_noop_when_empty() {
        let (terminal, out) = MemoryTerminal::shared();
        let mut editor = LineEditor::new();
        assert!(!editor.delete_last(&out));
        assert!(!editor.delete_last(&out));
        assert!(terminal.borrow().transcript().is_empty());

        editor.insert('é', &out);
        assert!(editor.delete_last(&out));
        assert!(editor.is_empty());
        assert_eq!(terminal.borrow().transcript(), format!("é{ERASE_CELL}"));
    }

    #[test]
    fn replace_erases_displayed_cells_first() {
        let (terminal, out) = MemoryTerminal::shared();
        let mut editor = LineEditor::new();
        editor.insert('a', &out);
        editor.insert('b', &out);
        terminal.borrow_mut().take_transcript();

        editor.replace("ls -l", &out);
        assert_eq!(editor.as_str(), "ls -l");
        assert_eq!(
            terminal.borrow().transcript(),
            format!("{ERASE_CELL}{ERASE_CELL}ls -l")
        );

        terminal.borrow_mut().take_transcript();
        editor.replace("", &out);
        assert!(editor.is_empty());
        assert_eq!(terminal.borrow().transcript(), ERASE_CELL.repeat(5));
    }

    #[test]
    fn clear_is_silent() {
        let (terminal, out) = MemoryTerminal::shared();
        let mut editor = LineEditor::new();
        editor.insert('x', &out);
        editor.clear();
        assert!(editor.is_empty());
        assert_eq!(terminal.borrow().transcript(), "x");
    }
}
