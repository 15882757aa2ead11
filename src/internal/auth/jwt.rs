//! Embedded JWT-style backend: rules live in process memory.

use async_trait::async_trait;

use super::{Access, AuthBackend, AuthError, Resource, Rule};

pub const JWT_IDENTITY: &str = "jwt";

#[derive(Debug, Default)]
pub struct JwtAuth {
    rules: Vec<Rule>,
}

impl JwtAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[async_trait]
impl AuthBackend for JwtAuth {
    fn identity(&self) -> &str {
        JWT_IDENTITY
    }

    async fn grant(&mut self, rule: &Rule) -> Result<(), AuthError> {
        if rule.id.is_empty() {
            return Err(AuthError::InvalidRule("missing id".to_string()));
        }
        if rule.scope.is_empty() {
            return Err(AuthError::InvalidRule(format!("{} has no scope", rule.id)));
        }
        // Granting an existing id replaces it.
        self.rules.retain(|existing| existing.id != rule.id);
        self.rules.push(rule.clone());
        Ok(())
    }

    async fn verify(&self, resource: &Resource) -> Result<(), AuthError> {
        let decisive = self
            .rules
            .iter()
            .filter(|rule| rule.scope == "*" && rule.resource.covers(resource))
            // Denials win ties at the same priority.
            .max_by_key(|rule| (rule.priority, rule.access == Access::Denied));

        match decisive {
            Some(rule) if rule.access == Access::Granted => Ok(()),
            _ => Err(AuthError::Forbidden(resource.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, endpoint: &str, access: Access, priority: i32) -> Rule {
        Rule {
            id: id.to_string(),
            scope: "*".to_string(),
            resource: Resource::new("service", "go.micro.store", endpoint),
            access,
            priority,
        }
    }

    #[tokio::test]
    async fn test_verify_without_rules_is_forbidden() {
        let auth = JwtAuth::new();
        let err = auth
            .verify(&Resource::new("service", "go.micro.store", "Store.Read"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_higher_priority_denial_wins() {
        let mut auth = JwtAuth::new();
        auth.grant(&rule("all", "*", Access::Granted, 1)).await.unwrap();
        auth.grant(&rule("no-delete", "Store.Delete", Access::Denied, 2))
            .await
            .unwrap();

        let read = Resource::new("service", "go.micro.store", "Store.Read");
        let delete = Resource::new("service", "go.micro.store", "Store.Delete");
        assert!(auth.verify(&read).await.is_ok());
        assert!(auth.verify(&delete).await.is_err());
    }

    #[tokio::test]
    async fn test_grant_replaces_same_id() {
        let mut auth = JwtAuth::new();
        auth.grant(&rule("r", "Store.Read", Access::Denied, 1)).await.unwrap();
        auth.grant(&rule("r", "Store.Read", Access::Granted, 1)).await.unwrap();
        assert_eq!(auth.rules().len(), 1);
        assert!(auth
            .verify(&Resource::new("service", "go.micro.store", "Store.Read"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_grant_rejects_rule_without_id() {
        let mut auth = JwtAuth::new();
        let err = auth
            .grant(&rule("", "*", Access::Granted, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidRule(_)));
    }
}
