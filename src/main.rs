//! This is the main entry point for micro.

use colored::Colorize;
use micro::{MicroError, cli};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so delegated commands own stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MICRO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli::parse(None) {
        report(&err);
        std::process::exit(err.exit_code());
    }
}

fn report(err: &MicroError) {
    match render(err) {
        Some((Stream::Stdout, text)) => print!("{text}"),
        Some((Stream::Stderr, text)) => eprint!("{text}"),
        None => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Text reported for `err` and the stream it goes to; `None` prints nothing.
fn render(err: &MicroError) -> Option<(Stream, String)> {
    let text = match err {
        // Help and version go to stdout, usage errors to stderr.
        MicroError::Cli(e) => {
            let stream = if e.use_stderr() {
                Stream::Stderr
            } else {
                Stream::Stdout
            };
            let mut text = e.render().to_string();
            if !text.ends_with('\n') {
                text.push('\n');
            }
            return Some((stream, text));
        }
        // The child already wrote whatever it had to say.
        MicroError::Delegated { .. } => return None,
        MicroError::ChainFatal(_)
        | MicroError::MissingCommand { .. }
        | MicroError::UnexpectedCommand { .. } => format!("{err}\n"),
        _ if err.is_configuration_conflict() => format!("{} {err}\n", "fatal:".red()),
        _ => format!("{} {err}\n", "error:".red()),
    };
    Some((Stream::Stderr, text))
}

#[cfg(test)]
mod tests {
    use micro::internal::auth::AuthError;

    use super::*;

    fn plain(err: MicroError) -> Option<(Stream, String)> {
        colored::control::set_override(false);
        render(&err)
    }

    #[test]
    fn test_chain_fatal_is_printed_undecorated() {
        let err = MicroError::ChainFatal(anyhow::anyhow!("registry unreachable"));
        assert_eq!(
            plain(err),
            Some((Stream::Stderr, "registry unreachable\n".to_string()))
        );
    }

    #[test]
    fn test_plugin_init_is_decorated() {
        let err = MicroError::PluginInit {
            plugin: "stats".to_string(),
            source: anyhow::anyhow!("no collector"),
        };
        assert_eq!(
            plain(err),
            Some((Stream::Stderr, "error: plugin stats: no collector\n".to_string()))
        );
    }

    #[test]
    fn test_auth_bootstrap_is_decorated() {
        let err = MicroError::AuthBootstrap {
            rule: "system-auth-token".to_string(),
            source: AuthError::Unavailable("rules table locked".to_string()),
        };
        let (stream, text) = plain(err).unwrap();
        assert_eq!(stream, Stream::Stderr);
        assert!(text.starts_with("error: failed to grant system rule system-auth-token"));
    }

    #[test]
    fn test_conflict_is_fatal() {
        let err = MicroError::FlagConflict {
            name: "-e".to_string(),
            owner: "plugin `extra`".to_string(),
            existing: "base flags".to_string(),
        };
        let (_, text) = plain(err).unwrap();
        assert!(text.starts_with("fatal: flag `-e`"));
    }

    #[test]
    fn test_delegated_prints_nothing() {
        let err = MicroError::Delegated {
            command: "micro-stub".to_string(),
            code: 7,
        };
        assert_eq!(plain(err), None);
    }

    #[test]
    fn test_help_goes_to_stdout() {
        let help = clap::Command::new("micro")
            .try_get_matches_from(["micro", "--help"])
            .unwrap_err();
        let (stream, _) = plain(MicroError::Cli(help)).unwrap();
        assert_eq!(stream, Stream::Stdout);
    }
}
