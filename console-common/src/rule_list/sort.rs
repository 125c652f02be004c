///! Sort keys for the rule list

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::RulesetNode;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    CreatedOn,
    Lang,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::CreatedOn => "createdOn",
            SortKey::Lang => "lang",
        }
    }

    /// Keys offered in the sort menu; `Lang` only makes sense when there is
    /// more than one language to tell apart.
    pub fn options(language_count: usize) -> Vec<SortKey> {
        let mut options = vec![SortKey::Name, SortKey::CreatedOn];
        if language_count > 1 {
            options.push(SortKey::Lang);
        }
        options
    }

    pub fn compare(&self, a: &RulesetNode, b: &RulesetNode) -> Ordering {
        match self {
            SortKey::Name => a.ruleset.name.cmp(&b.ruleset.name),
            SortKey::CreatedOn => a.ruleset.created_on.cmp(&b.ruleset.created_on),
            SortKey::Lang => a.ruleset.lang.as_str().cmp(b.ruleset.lang.as_str()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "createdOn" | "created_on" | "created-on" => Ok(SortKey::CreatedOn),
            "lang" | "language" => Ok(SortKey::Lang),
            _ => Err(Error::InvalidSortKey(s.to_string())),
        }
    }
}

/// Stable sort; exact ties keep their current order
pub fn sort_nodes(nodes: &mut [RulesetNode], key: SortKey) {
    nodes.sort_by(|a, b| key.compare(a, b));
}
