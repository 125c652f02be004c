//! REST client seams
//!
//! The backend owns all storage; the widgets only see these traits. The
//! browser build implements them over reqwasm, the CLI over reqwest, and the
//! tests with in-memory fakes. Futures are `?Send` because everything runs on
//! a single event loop.

use async_trait::async_trait;
use std::rc::Rc;

use crate::auth::{Credential, Role, User};
use crate::rules::{Ruleset, RulesetLang, RulesetType};
use crate::Result;

/// Status code the rules resource answers a successful delete with
pub const DELETE_OK_STATUS: u16 = 204;

/// Filters for listing rulesets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesetQuery {
    pub fully_populate: bool,
    pub languages: Vec<RulesetLang>,
}

impl RulesetQuery {
    /// Query string (without leading `?`)
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if self.fully_populate {
            parts.push("fullyPopulate=true".to_string());
        }
        for lang in &self.languages {
            parts.push(format!("language={}", lang.as_str()));
        }
        parts.join("&")
    }
}

#[async_trait(?Send)]
pub trait RulesClient {
    async fn list_tenant_rulesets(&self, realm: &str, query: &RulesetQuery) -> Result<Vec<Ruleset>>;

    async fn list_global_rulesets(&self, query: &RulesetQuery) -> Result<Vec<Ruleset>>;

    /// Returns the raw response status; only [`DELETE_OK_STATUS`] is a success
    async fn delete_ruleset(&self, ruleset_type: RulesetType, id: i64) -> Result<u16>;

    /// Save a new ruleset and return its id
    async fn create_ruleset(&self, ruleset: &Ruleset) -> Result<i64>;
}

#[async_trait(?Send)]
pub trait UserClient {
    async fn list_users(&self, realm: &str) -> Result<Vec<User>>;

    async fn list_roles(&self, realm: &str) -> Result<Vec<Role>>;

    async fn get_user_roles(&self, realm: &str, user_id: &str) -> Result<Vec<Role>>;

    async fn create_user(&self, realm: &str, user: &User) -> Result<User>;

    async fn update_user(&self, realm: &str, user: &User) -> Result<()>;

    async fn delete_user(&self, realm: &str, user_id: &str) -> Result<()>;

    async fn reset_password(&self, realm: &str, user_id: &str, credential: &Credential) -> Result<()>;

    async fn update_user_roles(&self, realm: &str, user_id: &str, roles: &[Role]) -> Result<()>;
}

#[async_trait(?Send)]
impl<T: RulesClient + ?Sized> RulesClient for Rc<T> {
    async fn list_tenant_rulesets(&self, realm: &str, query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        (**self).list_tenant_rulesets(realm, query).await
    }

    async fn list_global_rulesets(&self, query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        (**self).list_global_rulesets(query).await
    }

    async fn delete_ruleset(&self, ruleset_type: RulesetType, id: i64) -> Result<u16> {
        (**self).delete_ruleset(ruleset_type, id).await
    }

    async fn create_ruleset(&self, ruleset: &Ruleset) -> Result<i64> {
        (**self).create_ruleset(ruleset).await
    }
}

#[async_trait(?Send)]
impl<T: UserClient + ?Sized> UserClient for Rc<T> {
    async fn list_users(&self, realm: &str) -> Result<Vec<User>> {
        (**self).list_users(realm).await
    }

    async fn list_roles(&self, realm: &str) -> Result<Vec<Role>> {
        (**self).list_roles(realm).await
    }

    async fn get_user_roles(&self, realm: &str, user_id: &str) -> Result<Vec<Role>> {
        (**self).get_user_roles(realm, user_id).await
    }

    async fn create_user(&self, realm: &str, user: &User) -> Result<User> {
        (**self).create_user(realm, user).await
    }

    async fn update_user(&self, realm: &str, user: &User) -> Result<()> {
        (**self).update_user(realm, user).await
    }

    async fn delete_user(&self, realm: &str, user_id: &str) -> Result<()> {
        (**self).delete_user(realm, user_id).await
    }

    async fn reset_password(&self, realm: &str, user_id: &str, credential: &Credential) -> Result<()> {
        (**self).reset_password(realm, user_id, credential).await
    }

    async fn update_user_roles(&self, realm: &str, user_id: &str, roles: &[Role]) -> Result<()> {
        (**self).update_user_roles(realm, user_id, roles).await
    }
}

/// Resource paths relative to the API base, shared by every transport
pub mod paths {
    use super::RulesetQuery;
    use crate::rules::RulesetType;

    fn enc(segment: &str) -> String {
        urlencoding::encode(segment).into_owned()
    }

    pub fn users(realm: &str) -> String {
        format!("/user/{}/users", enc(realm))
    }

    pub fn user(realm: &str, user_id: &str) -> String {
        format!("/user/{}/users/{}", enc(realm), enc(user_id))
    }

    pub fn roles(realm: &str) -> String {
        format!("/user/{}/roles", enc(realm))
    }

    pub fn user_roles(realm: &str, user_id: &str) -> String {
        format!("/user/{}/userRoles/{}", enc(realm), enc(user_id))
    }

    pub fn reset_password(realm: &str, user_id: &str) -> String {
        format!("/user/{}/reset-password/{}", enc(realm), enc(user_id))
    }

    pub fn tenant_rulesets(realm: &str, query: &RulesetQuery) -> String {
        with_query(format!("/rules/tenant/for/{}", enc(realm)), query)
    }

    pub fn global_rulesets(query: &RulesetQuery) -> String {
        with_query("/rules/global".to_string(), query)
    }

    pub fn ruleset(ruleset_type: RulesetType, id: i64) -> String {
        format!("/rules/{}/{}", ruleset_type.as_str(), id)
    }

    pub fn create_ruleset(ruleset_type: RulesetType) -> String {
        format!("/rules/{}", ruleset_type.as_str())
    }

    fn with_query(path: String, query: &RulesetQuery) -> String {
        let query = query.to_query_string();
        if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        }
    }
}
