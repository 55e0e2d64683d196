// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Built-in commands registered with the info terminal shell.
// Author: Lukas Bower

//! Built-in commands.

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use infosh_core::{
    Arity, CommandContext, CommandDescriptor, CommandRegistry, HandlerFuture, ShellError,
};

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

const PROFILE_UPDATED: &str = "2025-06-01";

/// `(label, value)` rows printed by `whoami`.
const PROFILE: &[(&str, &str)] = &[
    ("name", "guest operator"),
    ("current position", "visitor of this info terminal"),
    ("location", "somewhere on the network"),
    ("fav languages", "[rust, shell]"),
    ("hobbies", "[reading manuals, pressing ctrl+c]"),
    (
        "about",
        "this terminal answers a handful of commands; type \"help\" to list them.",
    ),
];

/// Wrap `text` in the green ANSI colour used for labels.
pub fn colorize_green(text: &str) -> String {
    format!("{GREEN}{text}{RESET}")
}

async fn whoami(ctx: CommandContext) -> Result<()> {
    let out = ctx.output();
    for (label, value) in PROFILE {
        out.write_line(&format!("{}{value}", colorize_green(&format!("{label}: "))));
    }
    out.write_line(&format!(
        "{}{PROFILE_UPDATED}",
        colorize_green("last update: ")
    ));
    Ok(())
}

async fn echo(ctx: CommandContext) -> Result<()> {
    ctx.output().write_line(&ctx.args().join(" "));
    Ok(())
}

async fn sleep(ctx: CommandContext) -> Result<()> {
    let raw = ctx.arg(0).unwrap_or_default();
    let millis: u64 = raw
        .parse()
        .with_context(|| format!("invalid duration {raw:?}, expected milliseconds"))?;
    ctx.sleep(Duration::from_millis(millis)).await?;
    Ok(())
}

async fn clear(ctx: CommandContext) -> Result<()> {
    ctx.output().clear();
    Ok(())
}

fn help(listing: Rc<[(String, String)]>) -> impl Fn(CommandContext) -> HandlerFuture {
    move |ctx: CommandContext| {
        let listing = Rc::clone(&listing);
        let future: HandlerFuture = Box::pin(async move {
            let width = listing.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
            ctx.output().write_line("available commands:");
            for (id, description) in listing.iter() {
                ctx.output().write_line(&format!(
                    "  {} {description}",
                    colorize_green(&format!("{id:<width$}"))
                ));
            }
            Ok(())
        });
        future
    }
}

/// Registry holding every built-in command.
pub fn builtin_registry() -> Result<CommandRegistry, ShellError> {
    let mut registry = CommandRegistry::new();
    registry.register(
        CommandDescriptor::new("whoami", Arity::Exactly(0), whoami)
            .with_description("display effective developer info"),
    )?;
    registry.register(
        CommandDescriptor::new("echo", Arity::Any, echo)
            .with_description("print the arguments separated by spaces"),
    )?;
    registry.register(
        CommandDescriptor::new("sleep", Arity::Exactly(1), sleep)
            .with_description("wait <ms> milliseconds (ctrl+c interrupts)"),
    )?;
    registry.register(
        CommandDescriptor::new("clear", Arity::Exactly(0), clear)
            .with_description("clear the terminal screen"),
    )?;

    let help_description = "list the available commands";
    let mut listing: Vec<(String, String)> = registry
        .iter()
        .map(|command| (command.id().to_owned(), command.description().to_owned()))
        .collect();
    listing.push(("help".to_owned(), help_description.to_owned()));
    listing.sort();
    registry.register(
        CommandDescriptor::new("help", Arity::Exactly(0), help(listing.into()))
            .with_description(help_description),
    )?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_every_builtin() {
        let registry = builtin_registry().unwrap();
        let ids: Vec<&str> = registry.iter().map(CommandDescriptor::id).collect();
        assert_eq!(ids, ["clear", "echo", "help", "sleep", "whoami"]);
        assert!(registry.iter().all(|command| !command.description().is_empty()));
    }

    #[test]
    fn colorize_wraps_text() {
        assert_eq!(colorize_green("x"), "\x1b[32mx\x1b[0m");
    }
}
