//! Composition of the application and the per-invocation run loop.
//!
//! [`AppBuilder`] owns every input (base flags, built-in commands, plugins in
//! their intended order, collaborators) and [`AppBuilder::build`] validates
//! them into an immutable [`App`].

use std::{collections::HashSet, ffi::OsString, sync::Arc};

use clap::ArgMatches;

use super::{
    auth::{AuthBackend, JwtAuth},
    config::SharedConfig,
    context::InvocationContext,
    dispatch::Dispatcher,
    flag::{FlagDefinition, FlagRegistry, FlagSet},
    hooks::{BeforeHook, HookChain, HookContext, HookStage},
    plugin::{Plugin, owner},
    registry::{CommandRegistry, CommandTable},
    store::{MemoryStore, Store},
};
use crate::{
    command::{
        ARGS_ID, Command, CommandContext,
        init::{self, Operator, PlatformOperator},
    },
    error::{MicroError, Result},
};

const BASE_FLAGS_OWNER: &str = "base flags";
const BUILT_IN_OWNER: &str = "built-in commands";
const SYNTHETIC_OWNER: &str = "the synthetic init command";

pub struct AppBuilder {
    name: String,
    description: String,
    version: Option<String>,
    flags: Vec<FlagDefinition>,
    commands: Vec<Command>,
    plugins: Vec<Arc<dyn Plugin>>,
    priority: Vec<String>,
    operator: Arc<dyn Operator>,
    prior: Option<Arc<dyn BeforeHook>>,
    store: Box<dyn Store>,
    auth: Box<dyn AuthBackend>,
}

impl AppBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: None,
            flags: Vec::new(),
            commands: Vec::new(),
            plugins: Vec::new(),
            priority: Vec::new(),
            operator: Arc::new(PlatformOperator),
            prior: None,
            store: Box::new(MemoryStore::new()),
            auth: Box::new(JwtAuth::new()),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Base global flags, registered before any plugin flag.
    pub fn flags(mut self, flags: Vec<FlagDefinition>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a plugin; plugins are composed in the order they are added.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Display order of commands; unlisted commands follow in registration order.
    pub fn priority<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.priority = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn operator(mut self, operator: impl Operator + 'static) -> Self {
        self.operator = Arc::new(operator);
        self
    }

    /// Installs the hook this application's chain wraps.
    pub fn before(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.prior = Some(Arc::new(hook));
        self
    }

    pub fn store(mut self, store: impl Store + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn auth(mut self, auth: impl AuthBackend + 'static) -> Self {
        self.auth = Box::new(auth);
        self
    }

    /// Merges every flag and command source, failing on the first name clash.
    pub fn build(self) -> Result<App> {
        let mut flags = FlagRegistry::new();
        flags.register(BASE_FLAGS_OWNER, self.flags)?;
        for plugin in &self.plugins {
            let contributed = plugin.flags();
            if !contributed.is_empty() {
                flags.register(&owner(plugin.as_ref()), contributed)?;
            }
        }
        let flags = Arc::new(flags.finish());

        let mut commands = CommandRegistry::new();
        commands.register_all(BUILT_IN_OWNER, self.commands)?;
        commands.register(SYNTHETIC_OWNER, init::command(self.operator))?;
        for plugin in &self.plugins {
            commands.register_all(&owner(plugin.as_ref()), plugin.commands())?;
        }
        let commands = commands.finish(&self.priority);

        let mut cli = clap::Command::new(self.name.clone())
            .about(self.description)
            .args(flags.to_args())
            .allow_external_subcommands(true)
            .external_subcommand_value_parser(clap::value_parser!(String));
        if let Some(version) = self.version {
            cli = cli.version(version);
        }
        for (i, command) in commands.iter().enumerate() {
            cli = cli.subcommand(command.to_clap(i));
        }
        ensure_unique(&cli)?;

        tracing::debug!(
            flags = flags.len(),
            commands = commands.len(),
            plugins = self.plugins.len(),
            "application composed"
        );
        Ok(App {
            name: self.name,
            cli,
            flags,
            commands,
            plugins: self.plugins,
            chain: HookChain::standard(self.prior),
            config: SharedConfig::new(self.store, self.auth),
            stage: HookStage::Idle,
        })
    }
}

pub struct App {
    name: String,
    cli: clap::Command,
    flags: Arc<FlagSet>,
    commands: CommandTable,
    plugins: Vec<Arc<dyn Plugin>>,
    chain: HookChain,
    config: SharedConfig,
    stage: HookStage,
}

impl App {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn chain(&self) -> &HookChain {
        &self.chain
    }

    /// Stage the hook chain reached on the last run.
    pub fn stage(&self) -> HookStage {
        self.stage
    }

    pub fn cli(&self) -> &clap::Command {
        &self.cli
    }

    /// Parses `argv` (program name first), runs the hook chain, then the
    /// matched command or the fallback dispatcher.
    pub async fn run<I, T>(&mut self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.cli.clone().try_get_matches_from(argv)?;
        let args = positional_args(&matches);
        let invocation = InvocationContext::new(matches, Arc::clone(&self.flags), args);

        let mut hook_ctx =
            HookContext::new(&self.name, &invocation, &mut self.config, &self.plugins);
        let chained = self.chain.run(&mut hook_ctx).await;
        self.stage = hook_ctx.stage;
        chained?;

        let matched = invocation
            .matches()
            .subcommand()
            .and_then(|(name, sub)| Some((self.commands.get(name)?, sub)));
        match matched {
            Some((command, sub)) => self.execute(command, sub, &invocation).await,
            None => Dispatcher::new(&self.name).dispatch(invocation.args()).await,
        }
    }

    async fn execute(
        &self,
        command: &Command,
        matches: &ArgMatches,
        invocation: &InvocationContext,
    ) -> Result<()> {
        let (leaf, leaf_matches) = command.resolve(matches);
        let Some(action) = &leaf.action else {
            return Err(MicroError::Command(anyhow::anyhow!(
                "command `{}` has nothing to run",
                leaf.name
            )));
        };
        tracing::debug!(command = %leaf.name, "running command");
        action
            .run(CommandContext {
                invocation,
                matches: leaf_matches,
                config: &self.config,
            })
            .await
            .map_err(MicroError::Command)
    }
}

/// Rejects any name clap would otherwise panic on (debug) or shadow (release).
fn ensure_unique(cmd: &clap::Command) -> Result<()> {
    let owner = format!("command `{}`", cmd.get_name());
    let conflict = |name: String| MicroError::FlagConflict {
        name,
        owner: owner.clone(),
        existing: owner.clone(),
    };

    let mut seen = HashSet::new();
    for arg in cmd.get_arguments() {
        let longs = arg.get_long().into_iter().chain(arg.get_all_aliases().unwrap_or_default());
        let shorts = arg
            .get_short()
            .into_iter()
            .chain(arg.get_all_short_aliases().unwrap_or_default())
            .map(|short| format!("-{short}"));
        let ids = std::iter::once(format!("id {}", arg.get_id()));
        for key in ids.chain(longs.map(str::to_string)).chain(shorts) {
            if !seen.insert(key.clone()) {
                return Err(conflict(key));
            }
        }
    }

    let mut names = HashSet::new();
    for sub in cmd.get_subcommands() {
        for name in std::iter::once(sub.get_name()).chain(sub.get_all_aliases()) {
            if !names.insert(name) {
                return Err(MicroError::CommandConflict {
                    name: name.to_string(),
                    owner: owner.clone(),
                    existing: owner.clone(),
                });
            }
        }
        ensure_unique(sub)?;
    }
    Ok(())
}

/// Command path followed by its raw arguments, e.g. `["store", "list", "users"]`.
fn positional_args(matches: &ArgMatches) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        args.push(name.to_string());
        current = sub;
    }
    if !std::ptr::eq(current, matches) {
        // External subcommands keep their arguments under the empty id.
        for id in [ARGS_ID, ""] {
            if let Ok(Some(values)) = current.try_get_many::<String>(id) {
                args.extend(values.cloned());
            }
        }
    }
    args
}
