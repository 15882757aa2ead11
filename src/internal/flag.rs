//! Flag definitions and the registry that merges base and plugin flags.

use std::collections::HashMap;

use clap::{Arg, ArgAction, builder::BoolishValueParser};
use serde::Serialize;

use crate::error::{MicroError, Result};

/// Value kind of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Bool,
    String,
}

/// A single command line flag.
///
/// Resolution order at parse time is: explicit flag, first environment
/// variable, remaining environment variables in order, default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagDefinition {
    pub name: String,
    pub kind: FlagKind,
    pub usage: String,
    pub env_vars: Vec<String>,
    pub aliases: Vec<String>,
    pub default: Option<String>,
}

impl FlagDefinition {
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Bool)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String)
    }

    fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            kind,
            usage: String::new(),
            env_vars: Vec::new(),
            aliases: Vec::new(),
            default: None,
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env_vars.push(var.into());
        self
    }

    /// Single characters become short flags (`-e`), longer names become long aliases.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Builds the clap argument for this flag.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(self.usage.clone());

        for alias in &self.aliases {
            let mut chars = alias.chars();
            arg = match (chars.next(), chars.next()) {
                (Some(short), None) => arg.short(short),
                _ => arg.visible_alias(alias.clone()),
            };
        }

        if let Some(var) = self.env_vars.first() {
            arg = arg.env(var.clone());
        }

        arg = match self.kind {
            // `--flag`, `--flag=false` and `MICRO_FLAG=true` all parse.
            FlagKind::Bool => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(BoolishValueParser::new()),
            FlagKind::String => arg.action(ArgAction::Set).num_args(1),
        };

        match &self.default {
            Some(value) => arg.default_value(value.clone()),
            None => arg,
        }
    }

    /// Value from the secondary environment variables, if any is set.
    pub(crate) fn fallback_env_value(&self) -> Option<String> {
        self.env_vars
            .iter()
            .skip(1)
            .find_map(|var| std::env::var(var).ok())
    }
}

/// The immutable flag table of a built application, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    flags: Vec<FlagDefinition>,
    index: HashMap<String, usize>,
}

impl FlagSet {
    pub fn get(&self, name: &str) -> Option<&FlagDefinition> {
        self.index.get(name).map(|&i| &self.flags[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn to_args(&self) -> Vec<Arg> {
        self.flags.iter().map(FlagDefinition::to_arg).collect()
    }
}

/// Owner of the flags and commands clap generates on its own.
pub(crate) const CLAP_OWNER: &str = "the command line";

/// Collects global flags from the base set and every plugin, rejecting duplicates.
///
/// Every spelling is claimed: the flag name, each long alias and each short
/// alias. `--help`, `--version`, `-h` and `-V` are claimed up front.
#[derive(Debug)]
pub struct FlagRegistry {
    set: FlagSet,
    owners: HashMap<String, String>,
}

impl Default for FlagRegistry {
    fn default() -> Self {
        let owners = ["help", "version", "-h", "-V"]
            .into_iter()
            .map(|spelling| (spelling.to_string(), CLAP_OWNER.to_string()))
            .collect();
        Self {
            set: FlagSet::default(),
            owners,
        }
    }
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `flags` on behalf of `owner` (used in conflict messages).
    pub fn register(&mut self, owner: &str, flags: Vec<FlagDefinition>) -> Result<()> {
        for flag in flags {
            let spellings = spellings(&flag);
            for (i, spelling) in spellings.iter().enumerate() {
                let existing = match self.owners.get(spelling) {
                    Some(existing) => Some(existing.clone()),
                    None => spellings[..i].contains(spelling).then(|| owner.to_string()),
                };
                if let Some(existing) = existing {
                    return Err(MicroError::FlagConflict {
                        name: spelling.clone(),
                        owner: owner.to_string(),
                        existing,
                    });
                }
            }
            tracing::debug!(flag = %flag.name, owner, "registered flag");
            for spelling in spellings {
                self.owners.insert(spelling, owner.to_string());
            }
            self.set.index.insert(flag.name.clone(), self.set.flags.len());
            self.set.flags.push(flag);
        }
        Ok(())
    }

    /// Owner of a flag name, long alias or short alias (written `-e`).
    pub fn owner(&self, spelling: &str) -> Option<&str> {
        self.owners.get(spelling).map(String::as_str)
    }

    pub fn finish(self) -> FlagSet {
        self.set
    }
}

/// Keys a flag occupies: long spellings bare, short ones as `-c`.
fn spellings(flag: &FlagDefinition) -> Vec<String> {
    std::iter::once(flag.name.clone())
        .chain(flag.aliases.iter().map(|alias| {
            if alias.chars().count() == 1 {
                format!("-{alias}")
            } else {
                alias.clone()
            }
        }))
        .collect()
}
