//! Plugins extend the application with flags, commands and an init hook.

use async_trait::async_trait;

use super::{context::InvocationContext, flag::FlagDefinition};
use crate::command::Command;

/// A unit of functionality composed into the application at build time.
///
/// The application only ever calls the three capabilities below; `name`
/// identifies the plugin in error messages and logs.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Global flags added after the base set.
    fn flags(&self) -> Vec<FlagDefinition> {
        Vec::new()
    }

    /// Commands merged into the command table.
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Runs before any command; an error aborts the invocation.
    async fn init(&self, _ctx: &InvocationContext) -> anyhow::Result<()> {
        Ok(())
    }
}

pub(crate) fn owner(plugin: &dyn Plugin) -> String {
    format!("plugin `{}`", plugin.name())
}
