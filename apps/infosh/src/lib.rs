// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Host front end for the info terminal: config, key decoding, built-ins.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Host front end for the info terminal.
//!
//! Wires the `infosh-core` shell to a byte-oriented terminal: raw stdin is
//! decoded into key events, output goes to an ANSI sink, and history lives
//! in a directory of JSON files.

pub mod commands;
pub mod config;
pub mod input;
pub mod terminal;

pub use commands::builtin_registry;
pub use config::{
    default_config_path, load_config, parse_config, AppConfig, ConfigOverrides,
    DEFAULT_CONFIG_FILE,
};
pub use input::KeyDecoder;
pub use terminal::AnsiTerminal;
