//! Startup hook chain.
//!
//! Hooks run in order before the resolved command (or the fallback
//! dispatcher) executes. The first failing hook stops the chain; the error
//! kind tells the entry point whether to surface it as a command error or
//! to terminate immediately ([`MicroError::ChainFatal`]).

pub mod steps;

use std::sync::Arc;

use async_trait::async_trait;

use super::{config::SharedConfig, context::InvocationContext, plugin::Plugin};
use crate::error::Result;
pub use steps::{BeforeFn, BindFlags, BootstrapAuth, DefaultStore, InitPlugins, PriorHook};

/// Position of the chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HookStage {
    Idle,
    FlagBinding,
    PluginInit,
    PriorWrapped,
    StoreDefaulting,
    AuthBootstrap,
    Ready,
}

/// State a hook may read or write.
pub struct HookContext<'a> {
    pub app_name: &'a str,
    pub invocation: &'a InvocationContext,
    pub config: &'a mut SharedConfig,
    pub plugins: &'a [Arc<dyn Plugin>],
    /// Last stage entered; stays on the failing stage when the chain stops early.
    pub stage: HookStage,
}

impl<'a> HookContext<'a> {
    pub fn new(
        app_name: &'a str,
        invocation: &'a InvocationContext,
        config: &'a mut SharedConfig,
        plugins: &'a [Arc<dyn Plugin>],
    ) -> Self {
        Self {
            app_name,
            invocation,
            config,
            plugins,
            stage: HookStage::Idle,
        }
    }
}

#[async_trait]
pub trait Hook: Send + Sync {
    fn stage(&self) -> HookStage;

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()>;
}

/// A hook installed before this chain was composed over it.
#[async_trait]
pub trait BeforeHook: Send + Sync {
    async fn before(&self, ctx: &InvocationContext) -> anyhow::Result<()>;
}

pub struct HookChain {
    hooks: Vec<Box<dyn Hook>>,
}

impl HookChain {
    pub fn new(hooks: Vec<Box<dyn Hook>>) -> Self {
        Self { hooks }
    }

    /// The standard five-step chain, wrapping `prior` if one was installed.
    pub fn standard(prior: Option<Arc<dyn BeforeHook>>) -> Self {
        Self::new(vec![
            Box::new(BindFlags),
            Box::new(InitPlugins),
            Box::new(PriorHook::new(prior)),
            Box::new(DefaultStore),
            Box::new(BootstrapAuth),
        ])
    }

    pub fn stages(&self) -> Vec<HookStage> {
        self.hooks.iter().map(|hook| hook.stage()).collect()
    }

    pub async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        for hook in &self.hooks {
            ctx.stage = hook.stage();
            tracing::debug!(stage = ?ctx.stage, "running hook");
            if let Err(err) = hook.run(ctx).await {
                tracing::debug!(stage = ?ctx.stage, %err, "hook chain stopped");
                return Err(err);
            }
        }
        ctx.stage = HookStage::Ready;
        Ok(())
    }
}
