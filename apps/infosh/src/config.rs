// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load infosh TOML configuration and layer CLI/env overrides on top.
// Author: Lukas Bower

//! TOML configuration for the info terminal front end.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use infosh_core::{KeyBindings, KeyChord, ShellConfig};
use serde::Deserialize;

/// Configuration file looked up under the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "configs/infosh.toml";

/// Directory under `$HOME` holding persisted history.
pub const DEFAULT_HISTORY_DIR: &str = ".infosh";

/// Fully resolved front-end configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppConfig {
    /// Settings handed to the shell core.
    pub shell: ShellConfig,
    /// Directory for persisted history; `None` selects the default.
    pub history_dir: Option<PathBuf>,
}

/// Values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replace the prompt.
    pub prompt: Option<String>,
    /// Replace the history capacity.
    pub history_size: Option<usize>,
    /// Replace the history directory.
    pub history_dir: Option<PathBuf>,
    /// Replace the startup delay in milliseconds.
    pub startup_delay_ms: Option<u64>,
}

impl AppConfig {
    /// Apply overrides and validate the result.
    pub fn with_overrides(self, overrides: &ConfigOverrides) -> Result<Self> {
        let mut updated = self;
        if let Some(prompt) = &overrides.prompt {
            updated.shell.prompt.clone_from(prompt);
        }
        if let Some(size) = overrides.history_size {
            updated.shell.history_size = size;
        }
        if let Some(dir) = &overrides.history_dir {
            updated.history_dir = Some(dir.clone());
        }
        if let Some(ms) = overrides.startup_delay_ms {
            updated.shell.startup_delay = Duration::from_millis(ms);
        }
        updated.shell.validate().context("invalid infosh configuration")?;
        Ok(updated)
    }

    /// History directory, falling back to `$HOME/.infosh` (or `./.infosh`).
    pub fn resolved_history_dir(&self) -> PathBuf {
        if let Some(dir) = &self.history_dir {
            return dir.clone();
        }
        match std::env::var_os("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home).join(DEFAULT_HISTORY_DIR),
            _ => PathBuf::from(DEFAULT_HISTORY_DIR),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    shell: ShellTomlSection,
    #[serde(default)]
    history: HistoryTomlSection,
    #[serde(default)]
    keys: KeysTomlSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShellTomlSection {
    prompt: Option<String>,
    banner: Option<Vec<String>>,
    startup_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HistoryTomlSection {
    size: Option<usize>,
    key: Option<String>,
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeysTomlSection {
    interrupt: Option<String>,
    cancel_line: Option<String>,
    clear: Option<String>,
    exit: Option<String>,
}

fn parse_chord(field: &str, value: Option<&str>, fallback: KeyChord) -> Result<KeyChord> {
    match value {
        Some(text) => text
            .parse()
            .with_context(|| format!("invalid key binding keys.{field}")),
        None => Ok(fallback),
    }
}

/// Parse configuration text. Missing fields keep their defaults; the
/// result is not validated until overrides are applied.
pub fn parse_config(text: &str) -> Result<AppConfig> {
    let parsed: ConfigToml = toml::from_str(text).context("invalid infosh configuration TOML")?;
    let defaults = ShellConfig::default();
    let default_keys = KeyBindings::default();
    let keys = KeyBindings {
        interrupt: parse_chord(
            "interrupt",
            parsed.keys.interrupt.as_deref(),
            default_keys.interrupt,
        )?,
        cancel_line: parse_chord(
            "cancel_line",
            parsed.keys.cancel_line.as_deref(),
            default_keys.cancel_line,
        )?,
        clear: parse_chord("clear", parsed.keys.clear.as_deref(), default_keys.clear)?,
        exit: parse_chord("exit", parsed.keys.exit.as_deref(), default_keys.exit)?,
    };
    let shell = ShellConfig {
        prompt: parsed.shell.prompt.unwrap_or(defaults.prompt),
        history_size: parsed.history.size.unwrap_or(defaults.history_size),
        history_key: parsed.history.key.unwrap_or(defaults.history_key),
        banner: parsed.shell.banner.unwrap_or(defaults.banner),
        startup_delay: parsed
            .shell
            .startup_delay_ms
            .map_or(defaults.startup_delay, Duration::from_millis),
        keys,
    };
    Ok(AppConfig {
        shell,
        history_dir: parsed.history.dir,
    })
}

/// Load configuration from `path`. When `required` is false a missing
/// file yields the built-in defaults.
pub fn load_config(path: &Path, required: bool) -> Result<AppConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
            log::debug!("no configuration at {}; using defaults", path.display());
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read infosh configuration {}", path.display()))
        }
    };
    parse_config(&text).with_context(|| format!("in {}", path.display()))
}

/// Default configuration path under the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
