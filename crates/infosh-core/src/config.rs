// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Shell configuration: prompt, history bounds, greeting, and key bindings.
// Author: Lukas Bower

//! Shell configuration.

use std::time::Duration;

use thiserror::Error;

use crate::key::KeyChord;

/// Prompt written before each input line.
pub const DEFAULT_PROMPT: &str = "guest@info:~$ ";
/// Number of history entries kept.
pub const DEFAULT_HISTORY_SIZE: usize = 50;
/// Storage key holding the persisted history.
pub const DEFAULT_HISTORY_KEY: &str = "history";

/// Chords bound to shell actions.
///
/// `interrupt` applies while a process runs; the others apply while idle, so
/// `interrupt` and `cancel_line` may share a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    /// Interrupt the foreground process.
    pub interrupt: KeyChord,
    /// Discard the current input line.
    pub cancel_line: KeyChord,
    /// Clear the display.
    pub clear: KeyChord,
    /// End the session.
    pub exit: KeyChord,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            interrupt: KeyChord::ctrl('c'),
            cancel_line: KeyChord::ctrl('c'),
            clear: KeyChord::ctrl('l'),
            exit: KeyChord::ctrl('d'),
        }
    }
}

/// Configuration problems detected by [`ShellConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// History must keep at least one entry.
    #[error("history size must be >= 1")]
    HistorySizeZero,
    /// History key must be usable as a storage key.
    #[error("history key {0:?} must be non-empty ASCII letters, digits, '-' or '_'")]
    InvalidHistoryKey(String),
    /// Two idle-state actions share a chord.
    #[error("key {chord} is bound to both {first} and {second}")]
    ConflictingBinding {
        /// The shared chord.
        chord: KeyChord,
        /// First action name.
        first: &'static str,
        /// Second action name.
        second: &'static str,
    },
}

/// Everything the shell needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Prompt text.
    pub prompt: String,
    /// Maximum history entries.
    pub history_size: usize,
    /// Storage key for persisted history.
    pub history_key: String,
    /// Greeting lines written when the session starts.
    pub banner: Vec<String>,
    /// Pause between the greeting and the first prompt.
    pub startup_delay: Duration,
    /// Key bindings.
    pub keys: KeyBindings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            history_size: DEFAULT_HISTORY_SIZE,
            history_key: DEFAULT_HISTORY_KEY.to_owned(),
            banner: vec![
                "Hi cybernaut. this is an info terminal.".to_owned(),
                "use \"help\" to see the available commands".to_owned(),
            ],
            startup_delay: Duration::ZERO,
            keys: KeyBindings::default(),
        }
    }
}

impl ShellConfig {
    /// Check bounds and binding conflicts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_size == 0 {
            return Err(ConfigError::HistorySizeZero);
        }
        let key_ok = !self.history_key.is_empty()
            && self
                .history_key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !key_ok {
            return Err(ConfigError::InvalidHistoryKey(self.history_key.clone()));
        }
        let idle = [
            ("cancel_line", self.keys.cancel_line),
            ("clear", self.keys.clear),
            ("exit", self.keys.exit),
        ];
        for (index, &(first, chord)) in idle.iter().enumerate() {
            if let Some(&(second, _)) = idle[index + 1..]
                .iter()
                .find(|(_, other)| *other == chord)
            {
                return Err(ConfigError::ConflictingBinding {
                    chord,
                    first,
                    second,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ShellConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_history_is_rejected() {
        let config = ShellConfig {
            history_size: 0,
            ..ShellConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::HistorySizeZero));
    }

    #[test]
    fn history_key_must_be_storage_safe() {
        let config = ShellConfig {
            history_key: "../history".to_owned(),
            ..ShellConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidHistoryKey(_))
        ));
    }

    #[test]
    fn idle_bindings_must_differ() {
        let mut config = ShellConfig::default();
        config.keys.exit = KeyChord::ctrl('l');
        assert_eq!(
            config.validate(),
            Err(ConfigError::ConflictingBinding {
                chord: KeyChord::ctrl('l'),
                first: "clear",
                second: "exit",
            })
        );
    }
}
