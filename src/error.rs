//! Error taxonomy for composing and running the command line.

use thiserror::Error;

use crate::internal::{auth::AuthError, store::StoreError};

/// Errors produced while composing the application or running one invocation.
///
/// Only the binary entry point turns these into process termination, via
/// [`MicroError::exit_code`].
#[derive(Debug, Error)]
pub enum MicroError {
    /// Two flag definitions share a name.
    #[error("flag `{name}` from {owner} conflicts with the flag already registered by {existing}")]
    FlagConflict {
        name: String,
        owner: String,
        existing: String,
    },

    /// Two commands share a name.
    #[error(
        "command `{name}` from {owner} conflicts with the command already registered by {existing}"
    )]
    CommandConflict {
        name: String,
        owner: String,
        existing: String,
    },

    /// A plugin's init hook failed.
    #[error("plugin {plugin}: {source}")]
    PluginInit {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    /// The wrapped prior hook failed. Printed without decoration, then the process exits.
    #[error("{0}")]
    ChainFatal(anyhow::Error),

    /// Applying the store defaults failed.
    #[error("store initialisation failed: {0}")]
    StoreInit(#[from] StoreError),

    /// A system rule could not be granted on the embedded auth backend.
    #[error("failed to grant system rule {rule}: {source}")]
    AuthBootstrap {
        rule: String,
        #[source]
        source: AuthError,
    },

    /// No positional argument was given.
    #[error("{usage}")]
    MissingCommand { usage: String },

    /// The first positional argument is neither a command nor on the search path.
    #[error("{message}")]
    UnexpectedCommand { command: String, message: String },

    /// The fallback child exited unsuccessfully; its status is passed through.
    #[error("{command} exited with status {code}")]
    Delegated { command: String, code: i32 },

    /// The fallback child could not be started.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Argument parsing failed, or help/version was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// A command action returned an error.
    #[error("{0}")]
    Command(anyhow::Error),
}

impl MicroError {
    /// Process exit status for this error.
    ///
    /// Help and version output exit 0; every usage error exits 1 like any
    /// other failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            MicroError::Delegated { code, .. } => *code,
            MicroError::Cli(err) if !err.use_stderr() => 0,
            _ => 1,
        }
    }

    /// Composition-time conflicts that must stop the process before any command runs.
    pub fn is_configuration_conflict(&self) -> bool {
        matches!(
            self,
            MicroError::FlagConflict { .. } | MicroError::CommandConflict { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MicroError>;
