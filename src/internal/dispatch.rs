//! Fallback for invocations whose first argument names no registered command.
//!
//! The argument is looked up on `PATH` and executed with the remaining
//! arguments, sharing the parent's standard streams.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::{
    error::{MicroError, Result},
    utils::path::find_executable,
};

pub struct Dispatcher<'a> {
    app_name: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(app_name: &'a str) -> Self {
        Self { app_name }
    }

    /// Runs `args[0]` as an external program and waits for it.
    ///
    /// Returns [`MicroError::Delegated`] with the child's exit status when it fails.
    pub async fn dispatch(&self, args: &[String]) -> Result<()> {
        let Some((command, rest)) = args.split_first() else {
            return Err(MicroError::MissingCommand {
                usage: format!(
                    "No command provided to {name}. Please refer to '{name} help'",
                    name = self.app_name
                ),
            });
        };

        let Some(program) = find_executable(command) else {
            return Err(MicroError::UnexpectedCommand {
                command: command.clone(),
                message: format!(
                    "Unrecognized {name} command: {command}. Please refer to '{name} help'",
                    name = self.app_name
                ),
            });
        };

        tracing::debug!(
            program = %program.display(),
            args = ?rest,
            "delegating to external command"
        );
        let status = Command::new(&program)
            .args(rest)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| MicroError::Spawn {
                command: command.clone(),
                source,
            })?;

        if status.success() {
            return Ok(());
        }
        Err(MicroError::Delegated {
            command: command.clone(),
            code: exit_code(status),
        })
    }
}

/// Exit code to report for a finished child.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_args_is_missing_command() {
        let err = Dispatcher::new("micro").dispatch(&[]).await.unwrap_err();
        assert!(matches!(err, MicroError::MissingCommand { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("No command provided to micro"));
    }

    #[tokio::test]
    async fn test_unknown_program_is_unexpected_command() {
        let err = Dispatcher::new("micro")
            .dispatch(&["does-not-exist-xyz".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, MicroError::UnexpectedCommand { .. }));
        assert!(err.to_string().contains("does-not-exist-xyz"));
    }

    #[tokio::test]
    async fn test_child_status_passes_through() {
        let args = ["/bin/sh", "-c", "exit 7"].map(String::from);
        let err = Dispatcher::new("micro").dispatch(&args).await.unwrap_err();
        assert_eq!(err.exit_code(), 7);

        let args = ["/bin/sh", "-c", "exit 0"].map(String::from);
        assert!(Dispatcher::new("micro").dispatch(&args).await.is_ok());
    }

    #[tokio::test]
    async fn test_signal_maps_to_128_plus_signal() {
        let args = ["/bin/sh", "-c", "kill -9 $$"].map(String::from);
        let err = Dispatcher::new("micro").dispatch(&args).await.unwrap_err();
        assert_eq!(err.exit_code(), 128 + 9);
    }
}
