// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Closed command registry, handler contract, and handler context.
// Author: Lukas Bower

//! Command registry and the handler contract.
//!
//! Descriptors are validated when registered; lookups at submit time only
//! resolve the identifier and check the argument count.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::{HandlerError, ShellError};
use crate::process::ProcessId;
use crate::terminal::Output;

/// Future returned by a running handler.
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>>>>;

/// Behaviour bound to a command identifier.
///
/// The executor owns the exit signal: whatever the returned future resolves
/// to (or if it panics) the shell is told exactly once. A future that never
/// resolves keeps the shell in the running state.
pub trait CommandHandler {
    /// Start the command.
    fn run(&self, ctx: CommandContext) -> HandlerFuture;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    fn run(&self, ctx: CommandContext) -> HandlerFuture {
        Box::pin(self(ctx))
    }
}

/// Accepted argument counts for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exactly(usize),
    /// This many or more.
    AtLeast(usize),
    /// Inclusive range.
    Between(usize, usize),
    /// Any count.
    Any,
}

impl Arity {
    /// True when `count` arguments satisfy this arity.
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exactly(n) => count == n,
            Self::AtLeast(n) => count >= n,
            Self::Between(min, max) => (min..=max).contains(&count),
            Self::Any => true,
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Exactly(0) => f.write_str("no arguments"),
            Self::Exactly(n) => write!(f, "{n} {}", plural(n)),
            Self::AtLeast(n) => write!(f, "at least {n} {}", plural(n)),
            Self::Between(min, max) => write!(f, "{min} to {max} arguments"),
            Self::Any => f.write_str("any number of arguments"),
        }
    }
}

/// Everything a running handler can reach.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pid: ProcessId,
    command: String,
    args: Vec<String>,
    output: Output,
    cancel: CancelToken,
}

impl CommandContext {
    /// Assemble a context; normally done by the executor.
    pub fn new(
        pid: ProcessId,
        command: impl Into<String>,
        args: Vec<String>,
        output: Output,
        cancel: CancelToken,
    ) -> Self {
        Self {
            pid,
            command: command.into(),
            args,
            output,
            cancel,
        }
    }

    /// Process running this command.
    #[must_use]
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Command identifier as typed.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Argument tokens after the command identifier.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Argument at `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Terminal output.
    #[must_use]
    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Cancellation token for this process.
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// True once the user interrupted this process.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolve once the user interrupts this process.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Sleep for `duration`, returning early with `Interrupted` on cancel.
    pub async fn sleep(&self, duration: Duration) -> Result<(), HandlerError> {
        self.cancel
            .run_until_cancelled(tokio::time::sleep(duration))
            .await
    }
}

/// Immutable description of one command.
#[derive(Clone)]
pub struct CommandDescriptor {
    id: String,
    description: String,
    arity: Arity,
    handler: Rc<dyn CommandHandler>,
}

impl CommandDescriptor {
    /// Describe a command backed by `handler`.
    pub fn new<H>(id: impl Into<String>, arity: Arity, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        Self {
            id: id.into(),
            description: String::new(),
            arity,
            handler: Rc::new(handler),
        }
    }

    /// Attach the one-line description shown by `help`.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Command identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Accepted argument counts.
    #[must_use]
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Handler bound to the command.
    #[must_use]
    pub fn handler(&self) -> Rc<dyn CommandHandler> {
        Rc::clone(&self.handler)
    }

    fn validate(&self) -> Result<(), ShellError> {
        if self.id.is_empty() || self.id.chars().any(char::is_whitespace) {
            return Err(ShellError::InvalidCommandId(self.id.clone()));
        }
        if let Arity::Between(min, max) = self.arity {
            if min > max {
                return Err(ShellError::InvalidArity {
                    command: self.id.clone(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Mapping from command identifier to descriptor, filled at startup.
#[derive(Debug, Default, Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, rejecting malformed or duplicate identifiers.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), ShellError> {
        descriptor.validate()?;
        if self.commands.contains_key(descriptor.id()) {
            return Err(ShellError::DuplicateCommand(descriptor.id.clone()));
        }
        self.commands.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    /// Look up a command by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CommandDescriptor> {
        self.commands.get(id)
    }

    /// Split `line` on whitespace and look up its first token.
    pub fn resolve(&self, line: &str) -> Result<(&CommandDescriptor, Vec<String>), ShellError> {
        let mut tokens = line.split_whitespace();
        let id = tokens.next().unwrap_or_default();
        let descriptor = self
            .get(id)
            .ok_or_else(|| ShellError::UnknownCommand(id.to_owned()))?;
        Ok((descriptor, tokens.map(str::to_owned).collect()))
    }

    /// Registered commands in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> + '_ {
        self.commands.values()
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
