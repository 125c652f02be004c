///! User, role and credential types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User account in a realm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    /// Fields we don't model are kept so updates don't drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Blank row for the "add user" action
    pub fn new_enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

/// Realm role; composite roles aggregate permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub composite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned: Option<bool>,
}

impl Role {
    pub fn is_assigned(&self) -> bool {
        self.assigned.unwrap_or(false)
    }
}

/// Password credential for the reset-password call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub value: String,
    pub temporary: bool,
}

impl Credential {
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            credential_type: "password".to_string(),
            value: value.into(),
            temporary: false,
        }
    }
}

/// Client roles checked by the console widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientRole {
    ReadRules,
    WriteRules,
    ReadUsers,
    WriteUser,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::ReadRules => "read:rules",
            ClientRole::WriteRules => "write:rules",
            ClientRole::ReadUsers => "read:users",
            ClientRole::WriteUser => "write:user",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_keeps_unknown_fields() {
        let json = r#"{
            "id": "u-1",
            "realm": "building",
            "username": "alice",
            "email": "alice@example.com",
            "firstName": "Alice",
            "enabled": true,
            "serviceAccount": false
        }"#;

        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Alice"));
        assert!(user.is_saved());
        assert_eq!(user.extra.get("serviceAccount"), Some(&Value::Bool(false)));

        let out = serde_json::to_value(&user).unwrap();
        assert_eq!(out["serviceAccount"], false);
        assert_eq!(out["firstName"], "Alice");
    }

    #[test]
    fn test_new_user_row() {
        let user = User::new_enabled();
        assert!(user.enabled);
        assert!(!user.is_saved());
        assert!(user.username.is_empty());
    }

    #[test]
    fn test_credential_wire_format() {
        let out = serde_json::to_value(Credential::password("s3cret")).unwrap();
        assert_eq!(out["type"], "password");
        assert_eq!(out["value"], "s3cret");
        assert_eq!(out["temporary"], false);
    }
}
