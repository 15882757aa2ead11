//! Rules required by the platform's own services.
//!
//! The embedded backend has no rules service to fetch these from, so the
//! command line grants them itself before any command runs.

use super::{Access, Resource, Rule};

const SYSTEM_RESOURCES: &[(&str, &str, &str, &str)] = &[
    ("auth-generate", "service", "go.micro.auth", "Auth.Generate"),
    ("auth-token", "service", "go.micro.auth", "Auth.Token"),
    ("auth-inspect", "service", "go.micro.auth", "Auth.Inspect"),
    ("registry-get", "service", "go.micro.registry", "Registry.GetService"),
    ("registry-list", "service", "go.micro.registry", "Registry.ListServices"),
    ("runtime-read", "service", "go.micro.runtime", "Runtime.Read"),
    ("web-public", "web", "go.micro.web", "*"),
];

/// The fixed set of system rules, in grant order.
pub fn system_rules() -> Vec<Rule> {
    SYSTEM_RESOURCES
        .iter()
        .map(|&(id, kind, name, endpoint)| Rule {
            id: format!("system-{id}"),
            scope: "*".to_string(),
            resource: Resource::new(kind, name, endpoint),
            access: Access::Granted,
            priority: 1,
        })
        .collect()
}
