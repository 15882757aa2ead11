//! The synthetic `init` command, which hands control to the platform operator.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandContext, CommandHandler};

pub const INIT_COMMAND: &str = "init";

/// Bootstraps the platform services once configuration is bound.
#[async_trait]
pub trait Operator: Send + Sync {
    async fn init(&self, ctx: CommandContext<'_>) -> anyhow::Result<()>;
}

/// Default operator: reports the bound service addresses.
#[derive(Debug, Default)]
pub struct PlatformOperator;

#[async_trait]
impl Operator for PlatformOperator {
    async fn init(&self, ctx: CommandContext<'_>) -> anyhow::Result<()> {
        let config = ctx.config;
        tracing::info!(
            api = %config.api.address,
            proxy = %config.proxy.address,
            web = %config.web.address,
            network = %config.network.address,
            tunnel = %config.tunnel.address,
            "starting platform operator"
        );
        println!(
            "operator ready: api {} proxy {} web {}",
            config.api.address, config.proxy.address, config.web.address
        );
        Ok(())
    }
}

struct InitAction {
    operator: Arc<dyn Operator>,
}

#[async_trait]
impl CommandHandler for InitAction {
    async fn run(&self, ctx: CommandContext<'_>) -> anyhow::Result<()> {
        self.operator.init(ctx).await
    }
}

/// The `init` command bound to `operator`. Takes no flags.
pub fn command(operator: Arc<dyn Operator>) -> Command {
    Command::new(INIT_COMMAND)
        .usage("Run the micro operator")
        .action(InitAction { operator })
}
