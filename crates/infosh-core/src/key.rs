// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Key events delivered by the terminal and configurable key chords.
// Author: Lukas Bower

//! Key events delivered by the terminal collaborator and the chords bound to
//! shell actions.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Modifier keys held while a key was pressed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT = 0b0000_0001;
        /// Control key.
        const CTRL = 0b0000_0010;
        /// Alt / Option key.
        const ALT = 0b0000_0100;
        /// AltGr key.
        const ALT_GRAPH = 0b0000_1000;
        /// Meta / Command / Super key.
        const META = 0b0001_0000;
    }
}

impl Modifiers {
    /// Modifiers that turn a character key into a command chord.
    pub const COMMAND: Self = Self::CTRL
        .union(Self::ALT)
        .union(Self::ALT_GRAPH)
        .union(Self::META);

    /// True when any modifier other than Shift is held.
    #[must_use]
    pub fn has_command_modifier(self) -> bool {
        self.intersects(Self::COMMAND)
    }
}

/// Logical key identity, independent of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    /// A character-producing key.
    Char(char),
    Enter,
    Backspace,
    Delete,
    Tab,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
}

impl Key {
    fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::Char(_) => return None,
            Self::Enter => "enter",
            Self::Backspace => "backspace",
            Self::Delete => "delete",
            Self::Tab => "tab",
            Self::Escape => "escape",
            Self::ArrowUp => "up",
            Self::ArrowDown => "down",
            Self::ArrowLeft => "left",
            Self::ArrowRight => "right",
            Self::Home => "home",
            Self::End => "end",
        };
        Some(name)
    }

    fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "enter" | "return" => Self::Enter,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "up" | "arrowup" => Self::ArrowUp,
            "down" | "arrowdown" => Self::ArrowDown,
            "left" | "arrowleft" => Self::ArrowLeft,
            "right" | "arrowright" => Self::ArrowRight,
            "home" => Self::Home,
            "end" => Self::End,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// A single key press reported by the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    /// Key that was pressed.
    pub key: Key,
    /// Modifiers held at the time.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Construct an event from its parts.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Unmodified key press.
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::empty())
    }

    /// Unmodified character key press.
    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self::plain(Key::Char(ch))
    }

    /// Control + character chord.
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self::new(Key::Char(ch), Modifiers::CTRL)
    }

    /// Return the character to echo when this event is plain typing.
    #[must_use]
    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) if !ch.is_control() && !self.modifiers.has_command_modifier() => Some(ch),
            _ => None,
        }
    }
}

/// Error returned when a key chord string cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid key chord {0:?}")]
pub struct KeyChordError(String);

/// A key plus required modifiers, bound to a shell action.
///
/// Chords are written as `+`-separated tokens, modifiers first:
/// `ctrl+c`, `alt+shift+x`, `escape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    key: Key,
    modifiers: Modifiers,
}

impl KeyChord {
    /// Construct a chord from its parts.
    #[must_use]
    pub const fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Control + character chord.
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self::new(Key::Char(ch), Modifiers::CTRL)
    }

    /// True when the event presses this chord. Character keys compare
    /// case-insensitively and Shift is ignored for them.
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match (self.key, event.key) {
            (Key::Char(expected), Key::Char(actual)) => {
                expected.to_lowercase().eq(actual.to_lowercase())
                    && self.modifiers.difference(Modifiers::SHIFT)
                        == event.modifiers.difference(Modifiers::SHIFT)
            }
            (expected, actual) => expected == actual && self.modifiers == event.modifiers,
        }
    }
}

impl FromStr for KeyChord {
    type Err = KeyChordError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || KeyChordError(input.to_owned());
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(invalid());
        }
        // A trailing "+" binds the plus key itself.
        let (prefix, key_token) = match normalized.strip_suffix("++") {
            Some(rest) => (rest, "+"),
            None => match normalized.rsplit_once('+') {
                Some((rest, key)) => (rest, key),
                None => ("", normalized.as_str()),
            },
        };
        let mut modifiers = Modifiers::empty();
        for token in prefix.split('+').filter(|token| !token.is_empty()) {
            let flag = match token {
                "ctrl" | "control" => Modifiers::CTRL,
                "alt" | "option" => Modifiers::ALT,
                "altgr" | "altgraph" => Modifiers::ALT_GRAPH,
                "meta" | "cmd" | "super" => Modifiers::META,
                "shift" => Modifiers::SHIFT,
                _ => return Err(invalid()),
            };
            modifiers |= flag;
        }
        let key = Key::from_name(key_token).ok_or_else(invalid)?;
        Ok(Self::new(key, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (Modifiers::CTRL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::ALT_GRAPH, "altgr"),
            (Modifiers::META, "meta"),
            (Modifiers::SHIFT, "shift"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{label}+")?;
            }
        }
        match self.key.name() {
            Some(name) => f.write_str(name),
            None => match self.key {
                Key::Char(ch) => write!(f, "{ch}"),
                _ => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_excludes_command_modifiers() {
        assert_eq!(KeyEvent::char('a').printable(), Some('a'));
        assert_eq!(
            KeyEvent::new(Key::Char('A'), Modifiers::SHIFT).printable(),
            Some('A')
        );
        assert_eq!(KeyEvent::ctrl('a').printable(), None);
        assert_eq!(
            KeyEvent::new(Key::Char('a'), Modifiers::META).printable(),
            None
        );
        assert_eq!(KeyEvent::char('\u{7}').printable(), None);
        assert_eq!(KeyEvent::plain(Key::Enter).printable(), None);
    }

    #[test]
    fn chords_parse_and_render() {
        let chord: KeyChord = "Ctrl+C".parse().unwrap();
        assert_eq!(chord, KeyChord::ctrl('c'));
        assert_eq!(chord.to_string(), "ctrl+c");

        let chord: KeyChord = "alt+shift+up".parse().unwrap();
        assert_eq!(
            chord,
            KeyChord::new(Key::ArrowUp, Modifiers::ALT | Modifiers::SHIFT)
        );
        assert_eq!(chord.to_string(), "alt+shift+up");

        let chord: KeyChord = "ctrl++".parse().unwrap();
        assert_eq!(chord, KeyChord::ctrl('+'));

        assert!("".parse::<KeyChord>().is_err());
        assert!("hyper+c".parse::<KeyChord>().is_err());
        assert!("ctrl+nope".parse::<KeyChord>().is_err());
    }

    #[test]
    fn chord_matching_ignores_case_and_shift_for_chars() {
        let chord = KeyChord::ctrl('c');
        assert!(chord.matches(&KeyEvent::ctrl('c')));
        assert!(chord.matches(&KeyEvent::ctrl('C')));
        assert!(chord.matches(&KeyEvent::new(
            Key::Char('C'),
            Modifiers::CTRL | Modifiers::SHIFT
        )));
        assert!(!chord.matches(&KeyEvent::char('c')));
        assert!(!chord.matches(&KeyEvent::new(
            Key::Char('c'),
            Modifiers::CTRL | Modifiers::ALT
        )));

        let escape = KeyChord::new(Key::Escape, Modifiers::empty());
        assert!(escape.matches(&KeyEvent::plain(Key::Escape)));
        assert!(!escape.matches(&KeyEvent::new(Key::Escape, Modifiers::SHIFT)));
    }
}
