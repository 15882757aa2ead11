//! The five standard hooks.

use std::sync::Arc;

use async_trait::async_trait;

use super::{BeforeHook, Hook, HookContext, HookStage};
use crate::{
    error::{MicroError, Result},
    internal::{
        auth::{jwt::JWT_IDENTITY, system_rules},
        config::ConfigBinder,
        context::InvocationContext,
        plugin::owner,
        store::StoreOption,
    },
};

/// Copies supplied address and namespace flags into the shared configuration.
pub struct BindFlags;

#[async_trait]
impl Hook for BindFlags {
    fn stage(&self) -> HookStage {
        HookStage::FlagBinding
    }

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        let bound = ConfigBinder::bind(ctx.invocation, ctx.config);
        if !bound.is_empty() {
            tracing::debug!(?bound, "bound flags to configuration");
        }
        Ok(())
    }
}

/// Calls every plugin's init in registration order, stopping at the first error.
pub struct InitPlugins;

#[async_trait]
impl Hook for InitPlugins {
    fn stage(&self) -> HookStage {
        HookStage::PluginInit
    }

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        for plugin in ctx.plugins {
            plugin
                .init(ctx.invocation)
                .await
                .map_err(|source| MicroError::PluginInit {
                    plugin: owner(plugin.as_ref()),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Runs the previously installed hook. Its failure is process-fatal.
pub struct PriorHook {
    inner: Option<Arc<dyn BeforeHook>>,
}

impl PriorHook {
    pub fn new(inner: Option<Arc<dyn BeforeHook>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Hook for PriorHook {
    fn stage(&self) -> HookStage {
        HookStage::PriorWrapped
    }

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        match &self.inner {
            Some(hook) => hook
                .before(ctx.invocation)
                .await
                .map_err(MicroError::ChainFatal),
            None => Ok(()),
        }
    }
}

/// Adapts a synchronous closure into a [`BeforeHook`].
pub struct BeforeFn<F>(pub F);

#[async_trait]
impl<F> BeforeHook for BeforeFn<F>
where
    F: Fn(&InvocationContext) -> anyhow::Result<()> + Send + Sync,
{
    async fn before(&self, ctx: &InvocationContext) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

/// Gives each invocation its own store partition unless one was configured.
///
/// Database defaults to the application name; table defaults to the first
/// positional argument, or the application name when there is none.
pub struct DefaultStore;

impl DefaultStore {
    pub fn defaults(app_name: &str, invocation: &InvocationContext) -> Vec<StoreOption> {
        let mut options = Vec::new();
        if invocation.string("store_database").is_none() {
            options.push(StoreOption::Database(app_name.to_string()));
        }
        if invocation.string("store_table").is_none() {
            let table = invocation
                .first()
                .filter(|name| !name.is_empty())
                .unwrap_or(app_name);
            options.push(StoreOption::Table(table.to_string()));
        }
        options
    }
}

#[async_trait]
impl Hook for DefaultStore {
    fn stage(&self) -> HookStage {
        HookStage::StoreDefaulting
    }

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        let options = Self::defaults(ctx.app_name, ctx.invocation);
        if options.is_empty() {
            return Ok(());
        }
        tracing::debug!(?options, "applying store defaults");
        ctx.config.store.init(&options).await?;
        Ok(())
    }
}

/// Loads the system rules into the embedded auth backend.
///
/// Other backends fetch rules from the auth service and are left alone.
pub struct BootstrapAuth;

#[async_trait]
impl Hook for BootstrapAuth {
    fn stage(&self) -> HookStage {
        HookStage::AuthBootstrap
    }

    async fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        if ctx.config.auth.identity() != JWT_IDENTITY {
            return Ok(());
        }
        for rule in system_rules() {
            ctx.config
                .auth
                .grant(&rule)
                .await
                .map_err(|source| MicroError::AuthBootstrap {
                    rule: rule.id.clone(),
                    source,
                })?;
        }
        tracing::debug!("system rules granted on embedded auth");
        Ok(())
    }
}
