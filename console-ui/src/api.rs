//! API client for the manager REST backend

use async_trait::async_trait;
use reqwasm::http::{Request, Response};
use serde::{de::DeserializeOwned, Serialize};

use console_common::auth::{Credential, Role, User};
use console_common::client::{paths, RulesClient, RulesetQuery, UserClient};
use console_common::rules::{Ruleset, RulesetType};

use crate::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// REST client rooted at `{origin}/api/{realm}`
#[derive(Clone, Debug)]
pub struct ConsoleApi {
    base: String,
    token: Option<String>,
}

impl ConsoleApi {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Client for the page's own origin, authenticated against `realm`
    pub fn for_origin(realm: &str, token: Option<String>) -> Self {
        let origin = web_sys::window()
            .and_then(|w| w.location().origin().ok())
            .unwrap_or_default();
        Self::new(format!("{}/api/{}", origin, realm), token)
    }

    fn request(&self, method: Method, path: &str) -> Request {
        let url = format!("{}{}", self.base, path);
        let request = match method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Put => Request::put(&url),
            Method::Delete => Request::delete(&url),
        };
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send(&self, request: Request) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::network(e.to_string()))?;
        if response.ok() {
            Ok(response)
        } else {
            let details = response.text().await.ok();
            Err(ApiError::from_status(response.status(), details))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::Get, path)).await?;
        response.json().await.map_err(|e| ApiError::network(e.to_string()))
    }

    async fn send_json<B: Serialize>(&self, method: Method, path: &str, body: &B) -> Result<Response, ApiError> {
        let request = self
            .request(method, path)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(body)?);
        self.send(request).await
    }
}

#[async_trait(?Send)]
impl RulesClient for ConsoleApi {
    async fn list_tenant_rulesets(&self, realm: &str, query: &RulesetQuery) -> console_common::Result<Vec<Ruleset>> {
        Ok(self.get_json(&paths::tenant_rulesets(realm, query)).await?)
    }

    async fn list_global_rulesets(&self, query: &RulesetQuery) -> console_common::Result<Vec<Ruleset>> {
        Ok(self.get_json(&paths::global_rulesets(query)).await?)
    }

    async fn delete_ruleset(&self, ruleset_type: RulesetType, id: i64) -> console_common::Result<u16> {
        // The status is judged by the caller, so non-2xx is not an error here
        let response = self
            .request(Method::Delete, &paths::ruleset(ruleset_type, id))
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))?;
        Ok(response.status())
    }

    async fn create_ruleset(&self, ruleset: &Ruleset) -> console_common::Result<i64> {
        let response = self
            .send_json(Method::Post, &paths::create_ruleset(ruleset.ruleset_type), ruleset)
            .await?;
        response
            .json()
            .await
            .map_err(|e| console_common::Error::Decode(e.to_string()))
    }
}

#[async_trait(?Send)]
impl UserClient for ConsoleApi {
    async fn list_users(&self, realm: &str) -> console_common::Result<Vec<User>> {
        Ok(self.get_json(&paths::users(realm)).await?)
    }

    async fn list_roles(&self, realm: &str) -> console_common::Result<Vec<Role>> {
        Ok(self.get_json(&paths::roles(realm)).await?)
    }

    async fn get_user_roles(&self, realm: &str, user_id: &str) -> console_common::Result<Vec<Role>> {
        Ok(self.get_json(&paths::user_roles(realm, user_id)).await?)
    }

    async fn create_user(&self, realm: &str, user: &User) -> console_common::Result<User> {
        let response = self.send_json(Method::Post, &paths::users(realm), user).await?;
        response
            .json()
            .await
            .map_err(|e| console_common::Error::Decode(e.to_string()))
    }

    async fn update_user(&self, realm: &str, user: &User) -> console_common::Result<()> {
        let id = user.id.as_deref().unwrap_or_default();
        self.send_json(Method::Put, &paths::user(realm, id), user).await?;
        Ok(())
    }

    async fn delete_user(&self, realm: &str, user_id: &str) -> console_common::Result<()> {
        self.send(self.request(Method::Delete, &paths::user(realm, user_id))).await?;
        Ok(())
    }

    async fn reset_password(&self, realm: &str, user_id: &str, credential: &Credential) -> console_common::Result<()> {
        self.send_json(Method::Put, &paths::reset_password(realm, user_id), credential)
            .await?;
        Ok(())
    }

    async fn update_user_roles(&self, realm: &str, user_id: &str, roles: &[Role]) -> console_common::Result<()> {
        self.send_json(Method::Put, &paths::user_roles(realm, user_id), &roles)
            .await?;
        Ok(())
    }
}
