///! API client for the manager REST backend

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use console_common::auth::{Credential, Role, User};
use console_common::client::{paths, RulesClient, RulesetQuery, UserClient};
use console_common::rules::{Ruleset, RulesetType};
use console_common::{Error, Result};

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
    token: Option<String>,
}

impl ApiClient {
    /// Client for `{server}/api/{realm}`
    pub fn new(server: &str, realm: &str) -> Self {
        Self {
            base_url: format!("{}/api/{}", server.trim_end_matches('/'), realm),
            client: reqwest::Client::new(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Build request with authentication header
    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "API request");
        let request = self.client.request(method, &url);

        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| Error::Http(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::NotAuthenticated);
        }
        let message = response.text().await.unwrap_or_default();
        Err(Error::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.build_request(Method::GET, path)).await?;
        response.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    async fn send_json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> Result<Response> {
        self.send(self.build_request(method, path).json(body)).await
    }
}

#[async_trait(?Send)]
impl RulesClient for ApiClient {
    async fn list_tenant_rulesets(&self, realm: &str, query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        self.get(&paths::tenant_rulesets(realm, query)).await
    }

    async fn list_global_rulesets(&self, query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        self.get(&paths::global_rulesets(query)).await
    }

    async fn delete_ruleset(&self, ruleset_type: RulesetType, id: i64) -> Result<u16> {
        // Any status is handed back; the caller decides what counts as deleted
        let response = self
            .build_request(Method::DELETE, &paths::ruleset(ruleset_type, id))
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(response.status().as_u16())
    }

    async fn create_ruleset(&self, ruleset: &Ruleset) -> Result<i64> {
        let response = self
            .send_json(Method::POST, &paths::create_ruleset(ruleset.ruleset_type), ruleset)
            .await?;
        response.json().await.map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait(?Send)]
impl UserClient for ApiClient {
    async fn list_users(&self, realm: &str) -> Result<Vec<User>> {
        self.get(&paths::users(realm)).await
    }

    async fn list_roles(&self, realm: &str) -> Result<Vec<Role>> {
        self.get(&paths::roles(realm)).await
    }

    async fn get_user_roles(&self, realm: &str, user_id: &str) -> Result<Vec<Role>> {
        self.get(&paths::user_roles(realm, user_id)).await
    }

    async fn create_user(&self, realm: &str, user: &User) -> Result<User> {
        let response = self.send_json(Method::POST, &paths::users(realm), user).await?;
        response.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    async fn update_user(&self, realm: &str, user: &User) -> Result<()> {
        let id = user
            .id
            .as_deref()
            .ok_or_else(|| Error::NotFound(user.username.clone()))?;
        self.send_json(Method::PUT, &paths::user(realm, id), user).await?;
        Ok(())
    }

    async fn delete_user(&self, realm: &str, user_id: &str) -> Result<()> {
        self.send(self.build_request(Method::DELETE, &paths::user(realm, user_id)))
            .await?;
        Ok(())
    }

    async fn reset_password(&self, realm: &str, user_id: &str, credential: &Credential) -> Result<()> {
        self.send_json(Method::PUT, &paths::reset_password(realm, user_id), credential)
            .await?;
        Ok(())
    }

    async fn update_user_roles(&self, realm: &str, user_id: &str, roles: &[Role]) -> Result<()> {
        self.send_json(Method::PUT, &paths::user_roles(realm, user_id), roles)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_joins_realm() {
        let client = ApiClient::new("https://manager.example.com/", "building");
        assert_eq!(client.base_url, "https://manager.example.com/api/building");
    }
}
