//! Authorization backend collaborator and the rules the command line preloads.

pub mod jwt;
pub mod rules;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use jwt::JwtAuth;
pub use rules::system_rules;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("access to {0} is forbidden")]
    Forbidden(Resource),

    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
}

/// Something an account may be allowed to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub kind: String,
    pub name: String,
    pub endpoint: String,
}

impl Resource {
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Whether this pattern covers `other`; `*` matches any value of a field.
    pub fn covers(&self, other: &Resource) -> bool {
        fn field(pattern: &str, value: &str) -> bool {
            pattern == "*" || pattern == value
        }
        field(&self.kind, &other.kind)
            && field(&self.name, &other.name)
            && field(&self.endpoint, &other.endpoint)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.name, self.endpoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    /// Account scope the rule applies to; `*` means any caller, including anonymous ones.
    pub scope: String,
    pub resource: Resource,
    pub access: Access,
    pub priority: i32,
}

#[async_trait]
pub trait AuthBackend: Send + Sync + fmt::Debug {
    /// Name of the implementation, e.g. `jwt` for the embedded backend.
    fn identity(&self) -> &str;

    async fn grant(&mut self, rule: &Rule) -> Result<(), AuthError>;

    /// Checks whether an anonymous caller may access `resource`.
    async fn verify(&self, resource: &Resource) -> Result<(), AuthError>;
}
