//! Per-invocation view over parsed flag values and positional arguments.

use std::sync::Arc;

use clap::{ArgMatches, parser::ValueSource};

use super::flag::FlagSet;

/// Parsed global flags plus the raw positional arguments of one run.
///
/// The positional sequence starts with the invoked command name, so
/// `micro store list` yields `["store", "list"]` and an unmatched
/// `micro orders --port 1` yields `["orders", "--port", "1"]`.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    matches: ArgMatches,
    flags: Arc<FlagSet>,
    args: Vec<String>,
}

impl InvocationContext {
    pub fn new(matches: ArgMatches, flags: Arc<FlagSet>, args: Vec<String>) -> Self {
        Self {
            matches,
            flags,
            args,
        }
    }

    /// Resolved value of a string flag; empty values count as unset.
    pub fn string(&self, name: &str) -> Option<String> {
        self.explicit::<String>(name)
            .or_else(|| self.flags.get(name).and_then(|f| f.fallback_env_value()))
            .or_else(|| self.stored::<String>(name))
            .filter(|value| !value.is_empty())
    }

    /// Resolved value of a boolean flag; unset is `false`.
    pub fn bool(&self, name: &str) -> bool {
        if let Some(value) = self.explicit::<bool>(name) {
            return value;
        }
        if let Some(raw) = self.flags.get(name).and_then(|f| f.fallback_env_value()) {
            return parse_bool(&raw);
        }
        self.stored::<bool>(name).unwrap_or(false)
    }

    /// True when the flag came from the command line or an environment variable.
    pub fn is_set(&self, name: &str) -> bool {
        self.explicit_source(name).is_some()
            || self
                .flags
                .get(name)
                .and_then(|f| f.fallback_env_value())
                .is_some()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn first(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    pub fn matches(&self) -> &ArgMatches {
        &self.matches
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    fn explicit_source(&self, name: &str) -> Option<ValueSource> {
        if !self.matches.try_contains_id(name).unwrap_or(false) {
            return None;
        }
        match self.matches.value_source(name) {
            Some(source @ (ValueSource::CommandLine | ValueSource::EnvVariable)) => Some(source),
            _ => None,
        }
    }

    fn explicit<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<T> {
        self.explicit_source(name)?;
        self.stored(name)
    }

    fn stored<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Option<T> {
        self.matches.try_get_one::<T>(name).ok().flatten().cloned()
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true" | "y" | "yes" | "on"
    )
}
