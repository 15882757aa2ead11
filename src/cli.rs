//! CLI entry for micro: the base flag set, built-in commands and command
//! order, and the parse-and-run entry point used by the binary.

use std::ffi::OsString;

use crate::{
    command,
    error::MicroError,
    internal::{
        app::{App, AppBuilder},
        flag::FlagDefinition,
    },
};

pub const NAME: &str = "micro";

pub const DESCRIPTION: &str =
    "A microservice runtime\n\n\t Use `micro [command] --help` to see command specific help.";

pub const DEFAULT_UPDATE_URL: &str = "https://go.micro.mu/update";

/// Order in which commands are displayed.
pub const COMMAND_ORDER: &[&str] = &[
    "server", "new", "env", "login", "run", "logs", "call", "update", "kill", "store", "config",
    "auth", "status", "stream", "file",
];

/// Crate version, with the build date when one was injected at compile time.
pub fn version() -> String {
    match option_env!("MICRO_BUILD_DATE") {
        Some(date) if !date.is_empty() => format!("{} ({date})", env!("CARGO_PKG_VERSION")),
        _ => env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Global flags every invocation understands.
pub fn base_flags() -> Vec<FlagDefinition> {
    vec![
        FlagDefinition::bool("local").usage("Enable local only development: Defaults to true."),
        FlagDefinition::bool("enable_acme")
            .usage("Enables ACME support via Let's Encrypt. ACME hosts should also be specified.")
            .env("MICRO_ENABLE_ACME"),
        FlagDefinition::string("acme_hosts")
            .usage("Comma separated list of hostnames to manage ACME certs for")
            .env("MICRO_ACME_HOSTS"),
        FlagDefinition::string("acme_provider")
            .usage("The provider that will be used to communicate with Let's Encrypt. Valid options: autocert, certmagic")
            .env("MICRO_ACME_PROVIDER"),
        FlagDefinition::bool("enable_tls")
            .usage("Enable TLS support. Expects cert and key file to be specified")
            .env("MICRO_ENABLE_TLS"),
        FlagDefinition::string("tls_cert_file")
            .usage("Path to the TLS Certificate file")
            .env("MICRO_TLS_CERT_FILE"),
        FlagDefinition::string("tls_key_file")
            .usage("Path to the TLS Key file")
            .env("MICRO_TLS_KEY_FILE"),
        FlagDefinition::string("tls_client_ca_file")
            .usage("Path to the TLS CA file to verify clients against")
            .env("MICRO_TLS_CLIENT_CA_FILE"),
        FlagDefinition::string("api_address")
            .usage("Set the api address e.g 0.0.0.0:8080")
            .env("MICRO_API_ADDRESS"),
        FlagDefinition::string("namespace")
            .usage("Set the micro service namespace")
            .env("MICRO_NAMESPACE")
            .default_value("micro"),
        FlagDefinition::string("proxy_address")
            .usage("Proxy requests via the HTTP address specified")
            .env("MICRO_PROXY_ADDRESS"),
        FlagDefinition::string("web_address")
            .usage("Set the web UI address e.g 0.0.0.0:8082")
            .env("MICRO_WEB_ADDRESS"),
        FlagDefinition::string("network")
            .usage("Set the micro network name: local, go.micro")
            .env("MICRO_NETWORK"),
        FlagDefinition::string("network_address")
            .usage("Set the micro network address e.g. :9093")
            .env("MICRO_NETWORK_ADDRESS"),
        FlagDefinition::string("gateway_address")
            .usage("Set the micro default gateway address e.g. :9094")
            .env("MICRO_GATEWAY_ADDRESS"),
        FlagDefinition::string("tunnel_address")
            .usage("Set the micro tunnel address e.g. :8083")
            .env("MICRO_TUNNEL_ADDRESS"),
        FlagDefinition::string("api_handler")
            .usage("Specify the request handler to be used for mapping HTTP requests to services; {api, proxy, rpc}")
            .env("MICRO_API_HANDLER"),
        FlagDefinition::string("api_namespace")
            .usage("Set the namespace used by the API e.g. com.example.api")
            .env("MICRO_API_NAMESPACE"),
        FlagDefinition::string("web_namespace")
            .usage("Set the namespace used by the Web proxy e.g. com.example.web")
            .env("MICRO_WEB_NAMESPACE"),
        FlagDefinition::string("web_url")
            .usage("Set the host used for the web dashboard e.g web.example.com")
            .env("MICRO_WEB_HOST"),
        FlagDefinition::bool("enable_stats")
            .usage("Enable stats")
            .env("MICRO_ENABLE_STATS"),
        FlagDefinition::bool("auto_update")
            .usage("Enable automatic updates")
            .env("MICRO_AUTO_UPDATE"),
        FlagDefinition::string("update_url")
            .usage("Set the url to retrieve system updates from")
            .env("MICRO_UPDATE_URL")
            .default_value(DEFAULT_UPDATE_URL),
        FlagDefinition::bool("report_usage")
            .usage("Report usage statistics")
            .env("MICRO_REPORT_USAGE")
            .default_value("true"),
        FlagDefinition::string("env")
            .alias("e")
            .usage("Override environment")
            .env("MICRO_ENV"),
        FlagDefinition::string("store_database")
            .usage("Database option for the underlying store")
            .env("MICRO_STORE_DATABASE"),
        FlagDefinition::string("store_table")
            .usage("Table option for the underlying store")
            .env("MICRO_STORE_TABLE"),
    ]
}

/// Builder preloaded with micro's metadata, base flags and built-in commands.
///
/// Callers add plugins and collaborators before calling `build`.
pub fn builder() -> AppBuilder {
    AppBuilder::new(NAME)
        .description(DESCRIPTION)
        .version(version())
        .flags(base_flags())
        .command(command::env::command())
        .priority(COMMAND_ORDER.iter().copied())
}

/// The application as shipped in the `micro` binary.
pub fn app() -> Result<App, MicroError> {
    builder().build()
}

/// Parses the command line and runs the matched command or fallback.
/// - Caution: This is a `synchronous` function, it's declared as `async` to be able to use `[tokio::main]`
/// - `args`: parse from the process arguments if `None`, otherwise from the given args (program name first)
#[tokio::main(flavor = "current_thread")]
pub async fn parse(args: Option<Vec<OsString>>) -> Result<(), MicroError> {
    let mut app = app()?;
    match args {
        Some(args) => app.run(args).await,
        None => app.run(std::env::args_os()).await,
    }
}

/// Verifies the composed CLI is well formed, see
/// [clap debug_assert](https://docs.rs/clap/latest/clap/struct.Command.html#method.debug_assert)
#[test]
fn verify_cli() {
    app().unwrap().cli().clone().debug_assert()
}
