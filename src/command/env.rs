//! `env`: show the configuration the current invocation resolved to.

use serde_json::json;

use super::{Command, CommandContext};
use crate::internal::{config::ENVIRONMENTS, flag::FlagDefinition};

pub fn command() -> Command {
    Command::new("env")
        .usage("Show the selected environment and the resolved service configuration")
        .flag(FlagDefinition::bool("list").usage("List the known environments instead"))
        .action_fn(execute)
}

fn execute(ctx: CommandContext<'_>) -> anyhow::Result<()> {
    if ctx.bool("list") {
        let current = ctx.config.env.as_deref().unwrap_or_default();
        for env in ENVIRONMENTS {
            let marker = if env.name == current { "*" } else { " " };
            println!("{marker} {:<10} {}", env.name, env.proxy_address);
        }
        return Ok(());
    }

    let report = json!({
        "env": ctx.config.env,
        "config": ctx.config,
        "store": ctx.config.store.options(),
        "auth": ctx.config.auth.identity(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
