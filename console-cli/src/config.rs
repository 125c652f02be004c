///! CLI configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use console_common::auth::ClientRole;
use console_common::rule_list::RulesControls;
use console_common::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: String,
    /// Realm the token was issued for
    pub realm: String,
    pub username: Option<String>,
    pub token: Option<String>,
    pub super_user: bool,
    /// Client roles granted to the token
    pub roles: Vec<String>,
    pub default_output: String,
    pub rules: RulesControls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "http://localhost:8080".to_string(),
            realm: "master".to_string(),
            username: None,
            token: None,
            super_user: false,
            roles: [
                ClientRole::ReadRules,
                ClientRole::WriteRules,
                ClientRole::ReadUsers,
                ClientRole::WriteUser,
            ]
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
            default_output: "table".to_string(),
            rules: RulesControls::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Write the config, returning where it went
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;

        Ok(config_path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".config/consolectl/cli.toml"))
    }

    /// Session for the configured login, looking at `display_realm` when given
    pub fn session(&self, display_realm: Option<&str>) -> Session {
        let mut session = Session::new(&self.realm);
        if self.token.is_some() || self.username.is_some() {
            session.authenticate(
                self.username.clone().unwrap_or_else(|| "consolectl".to_string()),
                self.roles.iter().cloned(),
            );
        }
        session.set_super_user(self.super_user);
        if let Some(realm) = display_realm {
            session.set_display_realm(realm);
        }
        session.mark_ready();
        session
    }
}
