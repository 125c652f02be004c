///! Add, copy and delete of rulesets

use super::RulesConfig;
use crate::client::{RulesClient, DELETE_OK_STATUS};
use crate::events::AddDetail;
use crate::rules::{Ruleset, RulesetLang, RulesetType, DEFAULT_RULESET_NAME};

/// Build the add payload, giving the add handler a chance to veto or edit it
pub fn add_candidate(
    config: &RulesConfig,
    lang: RulesetLang,
    global: bool,
    realm: &str,
) -> Option<AddDetail> {
    let ruleset_type = if global {
        RulesetType::Global
    } else {
        RulesetType::Tenant
    };
    let mut ruleset = Ruleset::new(ruleset_type, DEFAULT_RULESET_NAME, lang);
    ruleset.realm = Some(realm.to_string());

    if let Some(handler) = &config.ruleset_add_handler {
        if !handler(&mut ruleset) {
            tracing::debug!("add vetoed by handler");
            return None;
        }
    }

    // The handler may edit the payload but not move a tenant ruleset
    if ruleset_type == RulesetType::Tenant {
        ruleset.realm = Some(realm.to_string());
    }

    Some(AddDetail {
        ruleset,
        source_ruleset: None,
        is_copy: false,
    })
}

/// Build the copy payload for `source`
pub fn copy_candidate(config: &RulesConfig, source: &Ruleset) -> Option<AddDetail> {
    let mut ruleset = source.copy_of();

    if let Some(handler) = &config.ruleset_copy_handler {
        if !handler(&mut ruleset) {
            tracing::debug!(source = ?source.id, "copy vetoed by handler");
            return None;
        }
    }

    Some(AddDetail {
        ruleset,
        source_ruleset: Some(source.clone()),
        is_copy: true,
    })
}

/// Tally of a batch delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DeleteOutcome {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Delete `rulesets` one after another.
///
/// Each call finishes before the next starts. A failure (transport error or
/// any status other than 204) is logged and counted but does not stop the
/// batch; nothing is rolled back or retried.
pub async fn delete_rulesets<C>(client: &C, config: &RulesConfig, rulesets: &[Ruleset]) -> DeleteOutcome
where
    C: RulesClient + ?Sized,
{
    let mut outcome = DeleteOutcome::default();

    for ruleset in rulesets {
        if let Some(handler) = &config.ruleset_delete_handler {
            if !handler(ruleset) {
                outcome.skipped += 1;
                continue;
            }
        }

        let Some(id) = ruleset.id else {
            tracing::error!(name = %ruleset.name, "cannot delete ruleset without id");
            outcome.failed += 1;
            continue;
        };

        match client.delete_ruleset(ruleset.ruleset_type, id).await {
            Ok(DELETE_OK_STATUS) => {
                tracing::debug!(id, ruleset_type = %ruleset.ruleset_type, "deleted ruleset");
                outcome.deleted += 1;
            }
            Ok(status) => {
                tracing::error!(id, status, "delete ruleset returned unexpected status");
                outcome.failed += 1;
            }
            Err(e) => {
                tracing::error!(id, error = %e, "failed to delete ruleset");
                outcome.failed += 1;
            }
        }
    }

    outcome
}
