//! Rules page: the rule list plus a summary of the selected ruleset

use async_trait::async_trait;
use leptos::*;
use std::rc::Rc;

use console_common::client::RulesClient;
use console_common::events::{AddDetail, RuleListListener, SelectionChange};
use console_common::rule_list::current_status;
use console_common::rules::Ruleset;

use crate::api::ConsoleApi;
use crate::components::RuleListView;
use crate::error::{ApiError, ErrorAlert};
use crate::session::use_console;

/// Saves added rulesets and tracks the selection for the detail panel
struct PageListener {
    api: ConsoleApi,
    set_selected: WriteSignal<Vec<Ruleset>>,
    set_selected_ids: WriteSignal<Vec<i64>>,
    set_reload: WriteSignal<u64>,
    set_error: WriteSignal<Option<ApiError>>,
}

#[async_trait(?Send)]
impl RuleListListener for PageListener {
    fn selection_changed(&self, change: &SelectionChange) {
        self.set_selected
            .set(change.new_nodes.iter().map(|n| n.ruleset.clone()).collect());
    }

    async fn added(&self, detail: AddDetail) {
        match self.api.create_ruleset(&detail.ruleset).await {
            Ok(id) => {
                logging::log!("Saved ruleset '{}' as {}", detail.ruleset.name, id);
                self.set_error.set(None);
                self.set_selected_ids.set(vec![id]);
                self.set_reload.update(|v| *v += 1);
            }
            Err(e) => {
                logging::error!("Failed to save ruleset '{}': {}", detail.ruleset.name, e);
                self.set_error.set(Some(ApiError::from(&e)));
            }
        }
    }
}

fn format_millis(millis: Option<i64>) -> String {
    millis
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[component]
fn RulesetSummary(ruleset: Ruleset) -> impl IntoView {
    let status = current_status(&ruleset);
    let validity = ruleset.validity();
    let start = format_millis(validity.as_ref().and_then(|v| v.start));
    let end = format_millis(validity.as_ref().and_then(|v| v.end));
    let recurrence = validity.and_then(|v| v.recurrence).unwrap_or_else(|| "-".to_string());

    view! {
        <div class="ruleset-summary">
            <h2>{ruleset.name.clone()}</h2>
            <dl>
                <dt>"Type"</dt><dd>{ruleset.ruleset_type.as_str()}</dd>
                <dt>"Language"</dt><dd>{ruleset.lang.as_str()}</dd>
                <dt>"Status"</dt>
                <dd>
                    <span class=format!("status-dot {}", status.class())></span>
                    {status.label()}
                </dd>
                <dt>"Valid from"</dt><dd>{start}</dd>
                <dt>"Valid until"</dt><dd>{end}</dd>
                <dt>"Recurrence"</dt><dd>{recurrence}</dd>
                <dt>"Created"</dt><dd>{format_millis(ruleset.created_on)}</dd>
                <dt>"Last modified"</dt><dd>{format_millis(ruleset.last_modified)}</dd>
            </dl>
            {ruleset.error.clone().map(|error| view! { <p class="ruleset-error">{error}</p> })}
        </div>
    }
}

#[component]
pub fn RulesPage() -> impl IntoView {
    let console = use_console();
    let (selected, set_selected) = create_signal(Vec::<Ruleset>::new());
    let (selected_ids, set_selected_ids) = create_signal(Vec::<i64>::new());
    let (reload, set_reload) = create_signal(0u64);
    let (error, set_error) = create_signal(None::<ApiError>);

    let listener: Rc<dyn RuleListListener> = Rc::new(PageListener {
        api: console.api.clone(),
        set_selected,
        set_selected_ids,
        set_reload,
        set_error,
    });

    view! {
        <div class="rules-page">
            <div class="page-header">
                <h1>"Rules"</h1>
                <p class="description">{move || format!("Realm: {}", console.display_realm.get())}</p>
            </div>

            {move || error.get().map(|e| view! {
                <ErrorAlert error=e on_dismiss=Callback::new(move |_| set_error.set(None))/>
            })}

            <div class="rules-layout">
                <aside class="rules-sidebar">
                    <RuleListView listener=listener selected_ids=selected_ids reload=reload/>
                </aside>
                <section class="rules-detail">
                    {move || {
                        let selected = selected.get();
                        match selected.len() {
                            0 => view! { <p class="hint">"Select a rule to see its details."</p> }.into_view(),
                            1 => view! { <RulesetSummary ruleset=selected[0].clone()/> }.into_view(),
                            n => view! { <p class="hint">{format!("{} rules selected", n)}</p> }.into_view(),
                        }
                    }}
                </section>
            </div>
        </div>
    }
}
