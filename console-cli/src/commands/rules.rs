///! Ruleset commands
///!
///! Each command drives the same rule list state the browser widget uses,
///! so language gating, delete batching and copy naming behave identically.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use tabled::Tabled;

use console_common::client::RulesClient;
use console_common::events::{AddDetail, Cancellable, RuleListListener};
use console_common::rule_list::{current_status, RuleList, RulesConfig, RulesetNode};
use console_common::rules::RulesetLang;

use super::{CliDialogs, Context};
use crate::api::ApiClient;
use crate::output;
use crate::RulesCommands;

#[derive(Tabled)]
struct RulesetRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "TYPE")]
    ruleset_type: String,
    #[tabled(rename = "LANG")]
    lang: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CREATED")]
    created: String,
}

impl From<&RulesetNode> for RulesetRow {
    fn from(node: &RulesetNode) -> Self {
        Self {
            id: node.id(),
            name: output::truncate(&node.ruleset.name, 40),
            ruleset_type: node.ruleset.ruleset_type.to_string(),
            lang: node.ruleset.lang.to_string(),
            status: output::status_label(current_status(&node.ruleset)).to_string(),
            created: output::format_millis(node.ruleset.created_on),
        }
    }
}

/// Saves added rulesets right away, the way the rules page does
struct CliListener {
    api: ApiClient,
    name: Option<String>,
    result: RefCell<Option<console_common::Result<i64>>>,
}

impl CliListener {
    fn new(api: ApiClient, name: Option<String>) -> Self {
        Self {
            api,
            name,
            result: RefCell::new(None),
        }
    }

    fn take_result(&self) -> Option<console_common::Result<i64>> {
        self.result.borrow_mut().take()
    }
}

#[async_trait(?Send)]
impl RuleListListener for CliListener {
    async fn request_add(&self, mut detail: AddDetail) -> Cancellable<AddDetail> {
        if let Some(name) = &self.name {
            detail.ruleset.name = name.clone();
        }
        Cancellable::allow(detail)
    }

    async fn added(&self, detail: AddDetail) {
        let result = self.api.create_ruleset(&detail.ruleset).await;
        match &result {
            Ok(id) => output::print_created("Ruleset", &detail.ruleset.name, &id.to_string()),
            Err(e) => tracing::error!(name = %detail.ruleset.name, error = %e, "failed to save ruleset"),
        }
        *self.result.borrow_mut() = Some(result);
    }
}

type CliRuleList = RuleList<ApiClient, Rc<CliListener>, CliDialogs>;

fn rule_list(ctx: &Context, listener: Rc<CliListener>, dialogs: CliDialogs) -> CliRuleList {
    let config = RulesConfig {
        controls: ctx.config.rules.clone(),
        ..Default::default()
    };
    RuleList::new(ctx.api.clone(), listener, dialogs, ctx.session(), config)
}

/// Switch to global rules if asked and fetch the list
async fn load(list: &CliRuleList, global: bool) -> Result<()> {
    if global {
        if !list.session().borrow().is_super_user() {
            bail!("Only super users can manage global rules");
        }
        list.set_global(true).await?;
    } else {
        list.load().await?;
    }
    Ok(())
}

fn ensure_writable(list: &CliRuleList) -> Result<()> {
    let session = list.session().borrow();
    if list.state().is_readonly(&session) {
        bail!("Missing client role: write:rules");
    }
    Ok(())
}

/// Requested ids that did not match any listed ruleset
fn missing_ids(requested: &[i64], selected: &[i64]) -> Vec<i64> {
    requested
        .iter()
        .copied()
        .filter(|id| !selected.contains(id))
        .collect()
}

pub async fn handle_rules_command(command: RulesCommands, ctx: &Context) -> Result<()> {
    match command {
        RulesCommands::List { global, sort } => {
            let list = rule_list(ctx, Rc::new(CliListener::new(ctx.api.clone(), None)), CliDialogs::default());
            list.set_sort(sort);
            load(&list, global).await?;

            let state = list.state();
            let nodes = state.nodes().unwrap_or_default();
            let rows: Vec<RulesetRow> = nodes.iter().map(RulesetRow::from).collect();
            let raw: Vec<_> = nodes.iter().map(|n| &n.ruleset).collect();
            output::print_output(rows, &raw, ctx.format)?;
        }

        RulesCommands::Delete { ids, global, yes } => {
            let list = rule_list(
                ctx,
                Rc::new(CliListener::new(ctx.api.clone(), None)),
                CliDialogs { assume_yes: yes },
            );
            load(&list, global).await?;
            ensure_writable(&list)?;

            list.select(&ids);
            let selected = list.state().selected_ids().to_vec();
            for id in missing_ids(&ids, &selected) {
                output::print_warning(&format!("No ruleset with ID {}", id));
            }
            if selected.is_empty() {
                bail!("Nothing to delete");
            }

            match list.delete().await {
                Some(outcome) if outcome.has_failures() => {
                    bail!("{} deleted, {} failed", outcome.deleted, outcome.failed);
                }
                Some(outcome) => {
                    output::print_success(&format!("Deleted {} ruleset(s)", outcome.deleted));
                    if outcome.skipped > 0 {
                        output::print_warning(&format!("{} skipped by the delete hook", outcome.skipped));
                    }
                }
                None => println!("Deletion cancelled"),
            }
        }

        RulesCommands::Copy { id, global } => {
            let listener = Rc::new(CliListener::new(ctx.api.clone(), None));
            let list = rule_list(ctx, listener.clone(), CliDialogs::default());
            load(&list, global).await?;
            ensure_writable(&list)?;

            list.select(&[id]);
            if list.state().selected_ids().is_empty() {
                bail!("No ruleset with ID {}", id);
            }
            if !list.copy().await {
                bail!("Ruleset {} can't be copied", id);
            }
            listener
                .take_result()
                .ok_or_else(|| anyhow!("Copy was not saved"))??;
        }

        RulesCommands::Add { lang, name, global } => {
            let listener = Rc::new(CliListener::new(ctx.api.clone(), name));
            let list = rule_list(ctx, listener.clone(), CliDialogs::default());
            if global {
                load(&list, true).await?;
            }
            ensure_writable(&list)?;

            let allowed = {
                let session = list.session().borrow();
                list.state().allowed_languages(&session)
            };
            if !allowed.contains(&lang) {
                bail!("{} rules are not allowed here; choose one of {}", lang, join(&allowed));
            }
            if !list.add(Some(lang)).await {
                bail!("Ruleset was not added");
            }
            listener
                .take_result()
                .ok_or_else(|| anyhow!("Ruleset was not saved"))??;
        }
    }

    Ok(())
}

fn join(languages: &[RulesetLang]) -> String {
    languages
        .iter()
        .map(RulesetLang::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_common::rules::{Ruleset, RulesetType};

    #[test]
    fn test_missing_ids() {
        assert_eq!(missing_ids(&[1, 2, 3], &[2]), vec![1, 3]);
        assert!(missing_ids(&[4], &[4]).is_empty());
    }

    #[test]
    fn test_row_from_node() {
        let mut ruleset = Ruleset::new(RulesetType::Tenant, "Lights off", RulesetLang::Flow);
        ruleset.id = Some(7);
        ruleset.enabled = false;
        let row = RulesetRow::from(&RulesetNode::new(ruleset));

        assert_eq!(row.id, 7);
        assert_eq!(row.lang, "FLOW");
        assert_eq!(row.created, "-");
        assert!(row.status.contains("disabled"));
    }

    #[test]
    fn test_join_languages() {
        assert_eq!(join(&[RulesetLang::Json, RulesetLang::Flow]), "JSON, FLOW");
    }

    #[tokio::test]
    async fn test_listener_renames_added_ruleset() {
        let listener = CliListener::new(ApiClient::new("http://localhost:8080", "master"), Some("Pump".to_string()));
        let detail = AddDetail {
            ruleset: Ruleset::new(RulesetType::Tenant, "New Rule", RulesetLang::Json),
            source_ruleset: None,
            is_copy: false,
        };
        let answer = listener.request_add(detail).await;
        assert!(answer.allow);
        assert_eq!(answer.detail.ruleset.name, "Pump");
    }
}
