// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Resolve submitted lines and supervise foreground handler execution.
// Author: Lukas Bower

//! Command execution.
//!
//! Handlers run as local tasks on the current [`tokio::task::LocalSet`]. Each
//! one is wrapped in a supervisor task that awaits the handler's join handle,
//! reports failures to the output, and fires the process's exit signal
//! exactly once whether the handler returned, failed, or panicked.

use std::rc::Rc;

use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{HandlerError, ShellError};
use crate::process::{ExitSignal, ExitStatus, ProcessHandle, ProcessId, ProcessTracker};
use crate::registry::{CommandContext, CommandDescriptor, CommandHandler, CommandRegistry};
use crate::terminal::Output;

/// Starts commands from the registry as foreground processes.
#[derive(Debug)]
pub struct Executor {
    registry: Rc<CommandRegistry>,
    output: Output,
    next_pid: u64,
}

impl Executor {
    /// Create an executor writing handler output to `output`.
    pub fn new(registry: Rc<CommandRegistry>, output: Output) -> Self {
        Self {
            registry,
            output,
            next_pid: 0,
        }
    }

    /// Registered commands.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolve `line` and start it. Must be called inside a `LocalSet`.
    pub fn execute(
        &mut self,
        tracker: &mut ProcessTracker,
        line: &str,
    ) -> Result<ProcessId, ShellError> {
        let registry = Rc::clone(&self.registry);
        let (descriptor, args) = registry.resolve(line)?;
        self.invoke(tracker, descriptor, args)
    }

    /// Validate `args` against the descriptor and start its handler as the
    /// foreground process. Must be called inside a `LocalSet`.
    pub fn invoke(
        &mut self,
        tracker: &mut ProcessTracker,
        descriptor: &CommandDescriptor,
        args: Vec<String>,
    ) -> Result<ProcessId, ShellError> {
        if !descriptor.arity().accepts(args.len()) {
            return Err(ShellError::ArgumentError {
                command: descriptor.id().to_owned(),
                expected: descriptor.arity(),
                got: args.len(),
            });
        }

        self.next_pid += 1;
        let pid = ProcessId::from_raw(self.next_pid);
        let cancel = CancelToken::new();
        let (handle, signal) = ProcessHandle::new(pid, descriptor.id(), cancel.clone());
        tracker.begin(handle)?;

        let ctx = CommandContext::new(pid, descriptor.id(), args, self.output.clone(), cancel);
        tokio::task::spawn_local(supervise(
            descriptor.handler(),
            ctx,
            self.output.clone(),
            signal,
        ));
        Ok(pid)
    }
}

async fn supervise(
    handler: Rc<dyn CommandHandler>,
    ctx: CommandContext,
    output: Output,
    signal: ExitSignal,
) {
    let command = ctx.command().to_owned();
    let pid = signal.pid();
    let task = tokio::task::spawn_local(async move { handler.run(ctx).await });
    let status = match task.await {
        Ok(Ok(())) => ExitStatus::Success,
        Ok(Err(err)) if is_interrupt(&err) => ExitStatus::Interrupted,
        Ok(Err(err)) => {
            debug!("process {pid} ({command}) failed: {err:#}");
            output.write_line(&format!("{command}: {err:#}"));
            ExitStatus::Failed
        }
        Err(err) if err.is_panic() => {
            warn!("process {pid} ({command}) panicked");
            output.write_line(&format!("{command}: terminated unexpectedly"));
            ExitStatus::Panicked
        }
        Err(_) => ExitStatus::Interrupted,
    };
    debug!("process {pid} ({command}) exited: {status:?}");
    signal.send(status);
}

fn is_interrupt(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<HandlerError>(), Some(HandlerError::Interrupted))
}
