// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for the info terminal shell.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the info terminal shell.

use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use env_logger::Env;
use infosh_core::{
    FileStorage, HistoryPersister, HistoryStorage, HistoryStore, KeyEvent, Output, Session,
    SessionEnd, Shell,
};
use log::{debug, info, warn, LevelFilter};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

use infosh::{
    builtin_registry, default_config_path, load_config, AnsiTerminal, AppConfig, ConfigOverrides,
    KeyDecoder,
};

/// Info terminal command-line arguments.
#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Info terminal shell", long_about = None)]
struct Cli {
    /// Configuration file (defaults to configs/infosh.toml when present).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding persisted history.
    #[arg(long, value_name = "DIR")]
    history_dir: Option<PathBuf>,

    /// Number of history entries kept.
    #[arg(long, value_name = "N")]
    history_size: Option<usize>,

    /// Prompt text.
    #[arg(long)]
    prompt: Option<String>,

    /// Pause between the greeting and the first prompt.
    #[arg(long, value_name = "MS")]
    startup_delay_ms: Option<u64>,

    /// Keep history in memory only.
    #[arg(long, default_value_t = false)]
    no_history: bool,

    /// Enable debug logging on stderr.
    #[arg(short = 'v', long, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

/// Raw environment value; only an empty string counts as unset.
fn env_raw(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) => Ok((!value.is_empty()).then_some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(anyhow!("failed to read {key}: {err}")),
    }
}

/// Trimmed environment value for paths and numbers.
fn env_string(key: &str) -> Result<Option<String>> {
    Ok(env_raw(key)?.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }))
}

fn env_override<T>(cli_value: Option<T>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if cli_value.is_some() {
        return Ok(cli_value);
    }
    match env_string(key)? {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|err| anyhow!("invalid {key} value '{value}': {err}")),
        None => Ok(None),
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let explicit = match &cli.config {
        Some(path) => Some(path.clone()),
        None => env_string("INFOSH_CONFIG")?.map(PathBuf::from),
    };
    let config = match explicit {
        Some(path) => load_config(&path, true)?,
        None => load_config(&default_config_path(), false)?,
    };
    let overrides = ConfigOverrides {
        prompt: match &cli.prompt {
            Some(prompt) => Some(prompt.clone()),
            None => env_raw("INFOSH_PROMPT")?,
        },
        history_size: env_override(cli.history_size, "INFOSH_HISTORY_SIZE")?,
        history_dir: env_override(cli.history_dir.clone(), "INFOSH_HISTORY_DIR")?,
        startup_delay_ms: cli.startup_delay_ms,
    };
    config.with_overrides(&overrides)
}

fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_local(async move {
        let mut stdin = tokio::io::stdin();
        let mut decoder = KeyDecoder::new();
        let mut buf = [0u8; 256];
        loop {
            let read = match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) => {
                    warn!("stdin read failed: {err}");
                    break;
                }
            };
            for event in decoder.feed(&buf[..read]) {
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
        for event in decoder.finish() {
            if tx.send(event).is_err() {
                debug!("key receiver closed; dropping flushed input");
                break;
            }
        }
    });
    rx
}

async fn run(config: AppConfig, persist: bool) -> Result<()> {
    let registry = Rc::new(builtin_registry().context("failed to register built-in commands")?);
    let output = Output::new(AnsiTerminal::stdout());
    let shell_config = config.shell.clone();

    let (history, persister) = if persist {
        let dir = config.resolved_history_dir();
        info!("history directory {}", dir.display());
        let storage: Arc<dyn HistoryStorage> = Arc::new(FileStorage::new(dir));
        let history = HistoryStore::load(
            storage.as_ref(),
            &shell_config.history_key,
            shell_config.history_size,
        );
        let (queue, persister) = HistoryPersister::spawn(storage, shell_config.history_key.clone());
        (history.with_persistence(queue), Some(persister))
    } else {
        (HistoryStore::new(shell_config.history_size), None)
    };

    let shell = Shell::new(shell_config, registry, history, output)
        .on_exit(|out| out.write_line("logout"));
    let mut session = Session::new(shell);
    if let Some(persister) = persister {
        session = session.with_persister(persister);
    }

    session.start().await;
    let mut keys = spawn_key_reader();
    let end = session.run(&mut keys).await;
    if end == SessionEnd::InputClosed {
        session.shell().output().write_line("");
    }
    session.finish().await;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = resolve_config(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    let local = LocalSet::new();
    let result = local.block_on(&runtime, run(config, !cli.no_history));
    drop(local);
    // The stdin reader may still be parked in a blocking read.
    runtime.shutdown_background();
    result
}
