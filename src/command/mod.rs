//! Command definitions: what the application can run and how actions are invoked.
//!
//! Built-in commands live in submodules; plugins contribute more through
//! [`crate::internal::plugin::Plugin::commands`].

pub mod env;
pub mod init;

use std::sync::Arc;

use async_trait::async_trait;
use clap::{Arg, ArgMatches};

use crate::internal::{config::SharedConfig, context::InvocationContext, flag::FlagDefinition};

/// Id of the trailing positional argument every leaf command accepts.
///
/// Hyphenated words are only taken once a plain value has been seen, so an
/// undefined `--flag` right after the command is a usage error.
pub const ARGS_ID: &str = "args";

/// Everything an action can see while it runs.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub invocation: &'a InvocationContext,
    /// Matches of the command being run, including its own flags.
    pub matches: &'a ArgMatches,
    pub config: &'a SharedConfig,
}

impl CommandContext<'_> {
    /// Positional arguments given after the command name.
    pub fn args(&self) -> Vec<String> {
        self.matches
            .try_get_many::<String>(ARGS_ID)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }

    /// A flag owned by the command itself.
    pub fn string(&self, name: &str) -> Option<String> {
        self.matches
            .try_get_one::<String>(name)
            .ok()
            .flatten()
            .filter(|value| !value.is_empty())
            .cloned()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.matches
            .try_get_one::<bool>(name)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, ctx: CommandContext<'_>) -> anyhow::Result<()>;
}

/// Adapts a synchronous closure into a [`CommandHandler`].
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext<'_>) -> anyhow::Result<()> + Send + Sync,
{
    async fn run(&self, ctx: CommandContext<'_>) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub usage: String,
    pub flags: Vec<FlagDefinition>,
    pub subcommands: Vec<Command>,
    pub action: Option<Arc<dyn CommandHandler>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("flags", &self.flags)
            .field("subcommands", &self.subcommands)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            flags: Vec::new(),
            subcommands: Vec::new(),
            action: None,
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn flag(mut self, flag: FlagDefinition) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn action(mut self, handler: impl CommandHandler + 'static) -> Self {
        self.action = Some(Arc::new(handler));
        self
    }

    /// Shorthand for a synchronous action.
    pub fn action_fn<F>(self, f: F) -> Self
    where
        F: Fn(CommandContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action(FnHandler(f))
    }

    /// Builds the clap subcommand, placed at `display_order` in help output.
    pub fn to_clap(&self, display_order: usize) -> clap::Command {
        let mut cmd = clap::Command::new(self.name.clone())
            .about(self.usage.clone())
            .display_order(display_order)
            .args(self.flags.iter().map(FlagDefinition::to_arg));

        if self.subcommands.is_empty() {
            cmd = cmd.arg(
                Arg::new(ARGS_ID)
                    .num_args(0..)
                    .trailing_var_arg(true)
                    .hide(true),
            );
        } else {
            for (i, sub) in self.subcommands.iter().enumerate() {
                cmd = cmd.subcommand(sub.to_clap(i));
            }
            if self.action.is_none() {
                cmd = cmd.subcommand_required(true).arg_required_else_help(true);
            }
        }
        cmd
    }

    /// Walks `matches` down to the deepest matched subcommand.
    pub fn resolve<'a>(&'a self, matches: &'a ArgMatches) -> (&'a Command, &'a ArgMatches) {
        if let Some((name, sub_matches)) = matches.subcommand()
            && let Some(child) = self.subcommands.iter().find(|c| c.name == name)
        {
            return child.resolve(sub_matches);
        }
        (self, matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_command_collects_trailing_args() {
        let cmd = Command::new("run").usage("Run a service");
        let clap_cmd = clap::Command::new("micro").subcommand(cmd.to_clap(0));
        let matches = clap_cmd
            .try_get_matches_from(["micro", "run", "helloworld", "--port", "9000"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let args: Vec<&String> = sub.get_many::<String>(ARGS_ID).unwrap().collect();
        assert_eq!(args, ["helloworld", "--port", "9000"]);
    }

    #[test]
    fn test_leaf_command_rejects_undefined_flag() {
        let cmd = Command::new("init").action_fn(|_| Ok(()));
        let clap_cmd = clap::Command::new("micro").subcommand(cmd.to_clap(0));
        let err = clap_cmd
            .try_get_matches_from(["micro", "init", "--bogus"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_resolve_nested() {
        let cmd = Command::new("store")
            .subcommand(Command::new("read").action_fn(|_| Ok(())))
            .subcommand(Command::new("list").action_fn(|_| Ok(())));
        let clap_cmd = clap::Command::new("micro").subcommand(cmd.to_clap(0));
        let matches = clap_cmd
            .try_get_matches_from(["micro", "store", "list", "users"])
            .unwrap();
        let (_, store_matches) = matches.subcommand().unwrap();
        let (resolved, leaf) = cmd.resolve(store_matches);
        assert_eq!(resolved.name, "list");
        assert_eq!(
            leaf.get_many::<String>(ARGS_ID).unwrap().collect::<Vec<_>>(),
            ["users"]
        );
    }

    #[test]
    fn test_group_without_action_requires_subcommand() {
        let cmd = Command::new("store").subcommand(Command::new("read").action_fn(|_| Ok(())));
        let clap_cmd = clap::Command::new("micro").subcommand(cmd.to_clap(0));
        assert!(clap_cmd.try_get_matches_from(["micro", "store"]).is_err());
    }
}
