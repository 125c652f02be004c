///! Ruleset types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Meta key holding the optional validity window of a ruleset
pub const VALIDITY_META_KEY: &str = "urn:openremote:rule:meta:validity";

/// Name given to freshly added rulesets
pub const DEFAULT_RULESET_NAME: &str = "New Rule";

/// Language a ruleset is written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RulesetLang {
    Json,
    Groovy,
    Javascript,
    Flow,
}

impl RulesetLang {
    /// Languages offered when the rules config does not restrict them
    pub const DEFAULT_ALLOWED: [RulesetLang; 4] = [
        RulesetLang::Json,
        RulesetLang::Groovy,
        RulesetLang::Javascript,
        RulesetLang::Flow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetLang::Json => "JSON",
            RulesetLang::Groovy => "GROOVY",
            RulesetLang::Javascript => "JAVASCRIPT",
            RulesetLang::Flow => "FLOW",
        }
    }
}

impl fmt::Display for RulesetLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RulesetLang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "JSON" => Ok(RulesetLang::Json),
            "GROOVY" => Ok(RulesetLang::Groovy),
            "JAVASCRIPT" => Ok(RulesetLang::Javascript),
            "FLOW" => Ok(RulesetLang::Flow),
            _ => Err(Error::InvalidLanguage(s.to_string())),
        }
    }
}

/// Scope a ruleset is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesetType {
    Asset,
    Tenant,
    Global,
}

impl RulesetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulesetType::Asset => "asset",
            RulesetType::Tenant => "tenant",
            RulesetType::Global => "global",
        }
    }
}

impl fmt::Display for RulesetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validity window stored in ruleset meta (timestamps in epoch millis)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<String>,
}

/// Ruleset record as served by the rules resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruleset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub ruleset_type: RulesetType,
    pub name: String,
    pub lang: RulesetLang,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Ruleset {
    /// Unsaved ruleset skeleton
    pub fn new(ruleset_type: RulesetType, name: impl Into<String>, lang: RulesetLang) -> Self {
        Self {
            id: None,
            ruleset_type,
            name: name.into(),
            lang,
            enabled: true,
            realm: None,
            asset_id: None,
            meta: None,
            created_on: None,
            last_modified: None,
            status: None,
            error: None,
            rules: None,
        }
    }

    /// Validity window from meta, if present and well formed
    pub fn validity(&self) -> Option<CalendarEvent> {
        let value = self.meta.as_ref()?.get(VALIDITY_META_KEY)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set_validity(&mut self, validity: &CalendarEvent) {
        let value = serde_json::to_value(validity).unwrap_or(Value::Null);
        self.meta
            .get_or_insert_with(Map::new)
            .insert(VALIDITY_META_KEY.to_string(), value);
    }

    /// Clone suitable for saving as a new ruleset: server-assigned fields are
    /// stripped and the name gets a " copy" suffix.
    pub fn copy_of(&self) -> Ruleset {
        let mut copy = self.clone();
        copy.id = None;
        copy.created_on = None;
        copy.last_modified = None;
        copy.status = None;
        copy.error = None;
        copy.name = format!("{} copy", self.name);
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruleset_wire_format() {
        let json = r#"{
            "id": 12,
            "type": "tenant",
            "name": "Lights off",
            "lang": "GROOVY",
            "enabled": false,
            "realm": "building",
            "createdOn": 1600000000000,
            "lastModified": 1600000001000,
            "status": "DEPLOYED"
        }"#;

        let ruleset: Ruleset = serde_json::from_str(json).unwrap();
        assert_eq!(ruleset.id, Some(12));
        assert_eq!(ruleset.ruleset_type, RulesetType::Tenant);
        assert_eq!(ruleset.lang, RulesetLang::Groovy);
        assert!(!ruleset.enabled);
        assert_eq!(ruleset.created_on, Some(1_600_000_000_000));

        let out = serde_json::to_value(&ruleset).unwrap();
        assert_eq!(out["type"], "tenant");
        assert_eq!(out["lastModified"], 1_600_000_001_000i64);
        assert!(out.get("assetId").is_none());
    }

    #[test]
    fn test_enabled_defaults_to_true() {
        let ruleset: Ruleset =
            serde_json::from_str(r#"{"type":"global","name":"g","lang":"FLOW"}"#).unwrap();
        assert!(ruleset.enabled);
        assert_eq!(ruleset.id, None);
    }

    #[test]
    fn test_validity_from_meta() {
        let json = r#"{
            "id": 1, "type": "tenant", "name": "r", "lang": "JSON",
            "meta": {"urn:openremote:rule:meta:validity": {"start": 10, "end": 20}}
        }"#;
        let ruleset: Ruleset = serde_json::from_str(json).unwrap();
        let validity = ruleset.validity().unwrap();
        assert_eq!(validity.start, Some(10));
        assert_eq!(validity.end, Some(20));
        assert_eq!(validity.recurrence, None);
    }

    #[test]
    fn test_malformed_validity_is_ignored() {
        let json = r#"{
            "id": 1, "type": "tenant", "name": "r", "lang": "JSON",
            "meta": {"urn:openremote:rule:meta:validity": "tomorrow"}
        }"#;
        let ruleset: Ruleset = serde_json::from_str(json).unwrap();
        assert!(ruleset.validity().is_none());
    }

    #[test]
    fn test_copy_strips_server_fields() {
        let mut ruleset = Ruleset::new(RulesetType::Tenant, "Heating", RulesetLang::Json);
        ruleset.id = Some(7);
        ruleset.created_on = Some(1);
        ruleset.last_modified = Some(2);
        ruleset.status = Some("DEPLOYED".to_string());
        ruleset.error = Some("bad".to_string());
        ruleset.realm = Some("master".to_string());
        ruleset.rules = Some("{}".to_string());

        let copy = ruleset.copy_of();
        assert_eq!(copy.name, "Heating copy");
        assert_eq!(copy.id, None);
        assert_eq!(copy.created_on, None);
        assert_eq!(copy.last_modified, None);
        assert_eq!(copy.status, None);
        assert_eq!(copy.error, None);
        assert_eq!(copy.realm.as_deref(), Some("master"));
        assert_eq!(copy.rules.as_deref(), Some("{}"));
    }

    #[test]
    fn test_lang_parse() {
        assert_eq!("javascript".parse::<RulesetLang>().unwrap(), RulesetLang::Javascript);
        assert!(matches!(
            "python".parse::<RulesetLang>(),
            Err(Error::InvalidLanguage(_))
        ));
    }
}
