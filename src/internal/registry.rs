//! Command table: merges every command source and fixes the display order.

use std::collections::HashMap;

use super::flag::{CLAP_OWNER, FlagRegistry};
use crate::{
    command::Command,
    error::{MicroError, Result},
};

/// Orders commands by their position in `priority`; unlisted names keep
/// their registration order after every listed one.
pub fn order<S: AsRef<str>>(commands: &mut [Command], priority: &[S]) {
    let rank: HashMap<&str, usize> = priority
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_ref(), i))
        .rev() // first occurrence wins on duplicates
        .collect();
    // `sort_by_key` is stable, which keeps equal ranks in registration order.
    commands.sort_by_key(|cmd| rank.get(cmd.name.as_str()).copied().unwrap_or(usize::MAX));
}

/// Accumulates commands during composition.
///
/// `help` is taken by clap at every level.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Vec<Command>,
    owners: HashMap<String, String>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            owners: HashMap::from([("help".to_string(), CLAP_OWNER.to_string())]),
        }
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `command`, checking its name here and its own flags and
    /// subcommands at every nested level.
    pub fn register(&mut self, owner: &str, command: Command) -> Result<()> {
        if let Some(existing) = self.owners.get(&command.name) {
            return Err(MicroError::CommandConflict {
                name: command.name,
                owner: owner.to_string(),
                existing: existing.clone(),
            });
        }
        validate(&command)?;
        tracing::debug!(command = %command.name, owner, "registered command");
        self.owners.insert(command.name.clone(), owner.to_string());
        self.commands.push(command);
        Ok(())
    }

    pub fn register_all(&mut self, owner: &str, commands: Vec<Command>) -> Result<()> {
        commands
            .into_iter()
            .try_for_each(|command| self.register(owner, command))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Freezes the registry into a table ordered by `priority`.
    pub fn finish<S: AsRef<str>>(mut self, priority: &[S]) -> CommandTable {
        order(&mut self.commands, priority);
        let index = self
            .commands
            .iter()
            .enumerate()
            .map(|(i, cmd)| (cmd.name.clone(), i))
            .collect();
        CommandTable {
            commands: self.commands,
            index,
        }
    }
}

fn validate(command: &Command) -> Result<()> {
    let owner = format!("command `{}`", command.name);
    FlagRegistry::new().register(&owner, command.flags.clone())?;
    let mut children = CommandRegistry::new();
    command
        .subcommands
        .iter()
        .try_for_each(|sub| children.register(&owner, sub.clone()))
}

/// Immutable, ordered command table of a built application.
#[derive(Debug, Default)]
pub struct CommandTable {
    commands: Vec<Command>,
    index: HashMap<String, usize>,
}

impl CommandTable {
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|cmd| cmd.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::flag::FlagDefinition;

    fn commands(names: &[&str]) -> Vec<Command> {
        names.iter().map(|name| Command::new(*name)).collect()
    }

    fn names(commands: &[Command]) -> Vec<&str> {
        commands.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_help_command_is_reserved() {
        let err = CommandRegistry::new()
            .register("plugin `docs`", Command::new("help"))
            .unwrap_err();
        assert!(matches!(
            err,
            MicroError::CommandConflict { ref name, ref existing, .. }
                if name == "help" && existing == CLAP_OWNER
        ));
    }

    #[test]
    fn test_nested_clashes_are_conflicts() {
        let store = Command::new("store")
            .subcommand(Command::new("read"))
            .subcommand(Command::new("read"));
        let err = CommandRegistry::new().register("plugin `store`", store).unwrap_err();
        assert!(matches!(
            err,
            MicroError::CommandConflict { ref name, ref owner, .. }
                if name == "read" && owner == "command `store`"
        ));

        let run = Command::new("run")
            .flag(FlagDefinition::string("image"))
            .flag(FlagDefinition::string("image"));
        let err = CommandRegistry::new().register("built-in commands", run).unwrap_err();
        assert!(matches!(
            err,
            MicroError::FlagConflict { ref owner, .. } if owner == "command `run`"
        ));

        let help = Command::new("run").flag(FlagDefinition::bool("help"));
        assert!(CommandRegistry::new().register("built-in commands", help).is_err());
    }

    #[test]
    fn test_order_listed_then_unlisted_in_registration_order() {
        let mut cmds = commands(&["zeta", "call", "alpha", "server", "omega", "run"]);
        order(&mut cmds, &["server", "new", "run", "call"]);
        assert_eq!(names(&cmds), ["server", "run", "call", "zeta", "alpha", "omega"]);
    }

    #[test]
    fn test_order_empty_priority_is_identity() {
        let mut cmds = commands(&["c", "a", "b"]);
        order::<&str>(&mut cmds, &[]);
        assert_eq!(names(&cmds), ["c", "a", "b"]);
    }

    #[test]
    fn test_order_duplicate_priority_entry_uses_first_position() {
        let mut cmds = commands(&["b", "a"]);
        order(&mut cmds, &["a", "b", "a"]);
        assert_eq!(names(&cmds), ["a", "b"]);
    }

    #[test]
    fn test_order_property_over_permutations() {
        let priority = ["store", "run", "auth"];
        let pool = ["auth", "x", "run", "y", "store", "z"];
        // Rotations give a spread of registration orders.
        for shift in 0..pool.len() {
            let mut registered: Vec<&str> = pool.to_vec();
            registered.rotate_left(shift);
            let mut cmds = commands(&registered);
            order(&mut cmds, &priority);

            let listed: Vec<&str> = registered
                .iter()
                .copied()
                .filter(|n| priority.contains(n))
                .collect();
            let mut expected: Vec<&str> = priority
                .iter()
                .copied()
                .filter(|n| listed.contains(n))
                .collect();
            expected.extend(registered.iter().copied().filter(|n| !priority.contains(n)));
            assert_eq!(names(&cmds), expected, "registration order {registered:?}");
        }
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = CommandRegistry::new();
        registry.register("built-in commands", Command::new("run")).unwrap();
        let err = registry
            .register("plugin `runner`", Command::new("run"))
            .unwrap_err();
        assert!(err.is_configuration_conflict());
        assert!(err.to_string().contains("plugin `runner`"));
        assert!(err.to_string().contains("built-in commands"));
    }

    #[test]
    fn test_finish_builds_lookup() {
        let mut registry = CommandRegistry::new();
        registry
            .register_all("built-in commands", commands(&["logs", "server"]))
            .unwrap();
        let table = registry.finish(&["server"]);
        assert_eq!(table.names(), ["server", "logs"]);
        assert_eq!(table.get("logs").map(|c| c.name.as_str()), Some("logs"));
        assert!(table.get("missing").is_none());
    }
}
