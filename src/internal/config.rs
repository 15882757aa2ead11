//! Configuration shared with the services the command line starts.
//!
//! Written once by the hook chain, read-only afterwards.

use serde::Serialize;

use super::{
    auth::{AuthBackend, JwtAuth},
    context::InvocationContext,
    store::{MemoryStore, Store},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiConfig {
    pub address: String,
    pub namespace: String,
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyConfig {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebConfig {
    pub address: String,
    pub namespace: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelConfig {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct SharedConfig {
    pub api: ApiConfig,
    pub proxy: ProxyConfig,
    pub web: WebConfig,
    pub network: NetworkConfig,
    pub tunnel: TunnelConfig,
    /// Environment selected with `--env`.
    pub env: Option<String>,
    #[serde(skip)]
    pub store: Box<dyn Store>,
    #[serde(skip)]
    pub auth: Box<dyn AuthBackend>,
}

impl SharedConfig {
    pub fn new(store: Box<dyn Store>, auth: Box<dyn AuthBackend>) -> Self {
        Self {
            api: ApiConfig {
                address: ":8080".to_string(),
                namespace: "go.micro.api".to_string(),
                handler: "meta".to_string(),
            },
            proxy: ProxyConfig {
                address: ":8081".to_string(),
            },
            web: WebConfig {
                address: ":8082".to_string(),
                namespace: "go.micro.web".to_string(),
                host: String::new(),
            },
            network: NetworkConfig {
                address: ":8085".to_string(),
            },
            tunnel: TunnelConfig {
                address: ":8083".to_string(),
            },
            env: None,
            store,
            auth,
        }
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(Box::new(MemoryStore::new()), Box::new(JwtAuth::new()))
    }
}

/// A named deployment the command line can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub name: &'static str,
    pub proxy_address: &'static str,
}

pub const ENVIRONMENTS: &[Environment] = &[
    Environment {
        name: "local",
        proxy_address: "127.0.0.1:8081",
    },
    Environment {
        name: "platform",
        proxy_address: "proxy.micro.mu:443",
    },
];

pub fn environment(name: &str) -> Option<&'static Environment> {
    ENVIRONMENTS.iter().find(|env| env.name == name)
}

type Field = fn(&mut SharedConfig) -> &mut String;

/// Flags that overwrite a configuration field when supplied.
const BINDINGS: &[(&str, Field)] = &[
    ("api_handler", |c| &mut c.api.handler),
    ("api_address", |c| &mut c.api.address),
    ("proxy_address", |c| &mut c.proxy.address),
    ("web_address", |c| &mut c.web.address),
    ("network_address", |c| &mut c.network.address),
    ("tunnel_address", |c| &mut c.tunnel.address),
    ("api_namespace", |c| &mut c.api.namespace),
    ("web_namespace", |c| &mut c.web.namespace),
    ("web_url", |c| &mut c.web.host),
];

/// Copies supplied flag values into the shared configuration.
pub struct ConfigBinder;

impl ConfigBinder {
    /// Returns the names of the fields that were overwritten.
    pub fn bind(ctx: &InvocationContext, config: &mut SharedConfig) -> Vec<&'static str> {
        let mut bound = Vec::new();
        for &(flag, field) in BINDINGS {
            if let Some(value) = ctx.string(flag) {
                *field(config) = value;
                bound.push(flag);
            }
        }

        if let Some(name) = ctx.string("env") {
            match environment(&name) {
                Some(env) if ctx.string("proxy_address").is_none() => {
                    config.proxy.address = env.proxy_address.to_string();
                }
                Some(_) => {}
                None => {
                    tracing::warn!(env = %name, "unknown environment, keeping configured addresses")
                }
            }
            config.env = Some(name);
            bound.push("env");
        }
        bound
    }
}
