//! Rules list widget

use async_trait::async_trait;
use leptos::*;
use std::rc::Rc;
use std::str::FromStr;

use console_common::events::{AddDetail, AllowAll, Cancellable, RuleListListener, SelectionChange};
use console_common::rule_list::{current_status, RuleList, RulesConfig, RulesetNode, SortKey};
use console_common::rules::{Ruleset, RulesetLang};

use crate::api::ConsoleApi;
use crate::dialogs::BrowserDialogs;
use crate::error::EmptyState;
use crate::session::use_console;

/// Forwards to the host's listener and redraws on every state change
struct ViewListener {
    inner: Rc<dyn RuleListListener>,
    version: WriteSignal<u64>,
}

#[async_trait(?Send)]
impl RuleListListener for ViewListener {
    async fn request_selection(&self, change: SelectionChange) -> Cancellable<SelectionChange> {
        self.inner.request_selection(change).await
    }

    fn selection_changed(&self, change: &SelectionChange) {
        self.inner.selection_changed(change);
    }

    async fn request_add(&self, detail: AddDetail) -> Cancellable<AddDetail> {
        self.inner.request_add(detail).await
    }

    async fn added(&self, detail: AddDetail) {
        self.inner.added(detail).await;
    }

    async fn request_delete(&self, rulesets: Vec<Ruleset>) -> Cancellable<Vec<Ruleset>> {
        self.inner.request_delete(rulesets).await
    }

    fn state_changed(&self) {
        self.inner.state_changed();
        self.version.update(|v| *v += 1);
    }
}

type ViewRuleList = RuleList<ConsoleApi, ViewListener, BrowserDialogs>;

/// Everything the header and body need for one render
struct Snapshot {
    nodes: Option<Vec<RulesetNode>>,
    languages: Vec<RulesetLang>,
    language: Option<RulesetLang>,
    sort_options: Vec<SortKey>,
    sort_by: SortKey,
    readonly: bool,
    disabled: bool,
    global: bool,
    selected: usize,
}

fn snapshot(list: &ViewRuleList) -> Snapshot {
    let session = list.session().borrow();
    let state = list.state();
    Snapshot {
        nodes: state.nodes().map(<[RulesetNode]>::to_vec),
        languages: state.allowed_languages(&session),
        language: state.language,
        sort_options: state.sort_options(&session),
        sort_by: state.sort_by(),
        readonly: state.is_readonly(&session),
        disabled: state.is_disabled(),
        global: state.is_global(),
        selected: state.selected_nodes().len(),
    }
}

/// Ctrl or Cmd adds to the selection; any other click replaces it
fn toggles_selection(ctrl: bool, meta: bool) -> bool {
    ctrl || meta
}

#[component]
pub fn RuleListView(
    #[prop(optional)]
    config: Option<RulesConfig>,
    #[prop(optional)]
    readonly: bool,
    /// Receives selection, add and delete events
    #[prop(optional)]
    listener: Option<Rc<dyn RuleListListener>>,
    /// Bound selection; reordering the same ids is ignored
    #[prop(optional, into)]
    selected_ids: Option<Signal<Vec<i64>>>,
    /// Bump to force a refetch
    #[prop(optional, into)]
    reload: Option<Signal<u64>>,
) -> impl IntoView {
    let console = use_console();
    let (version, set_version) = create_signal(0u64);

    let listener = ViewListener {
        inner: listener.unwrap_or_else(|| Rc::new(AllowAll)),
        version: set_version,
    };
    let list = Rc::new(RuleList::new(
        console.api.clone(),
        listener,
        BrowserDialogs,
        console.session.clone(),
        config.unwrap_or_default(),
    ));
    list.update(|state, _| state.readonly = readonly);
    let list = store_value(list);

    create_effect(move |_| {
        if let Some(reload) = reload {
            reload.track();
        }
        let list = list.get_value();
        spawn_local(async move {
            match list.load().await {
                // Ids bound before the reload may only exist after it
                Ok(()) => {
                    if let Some(ids) = selected_ids {
                        list.select(&ids.get_untracked());
                    }
                }
                Err(e) => logging::error!("Failed to load rules: {}", e),
            }
        });
    });

    if let Some(selected_ids) = selected_ids {
        create_effect(move |_| {
            let ids = selected_ids.get();
            list.with_value(|list| list.select(&ids));
        });
    }

    console.on_realm_change(move || {
        let list = list.get_value();
        spawn_local(async move {
            if let Err(e) = list.realm_changed().await {
                logging::error!("Failed to reload rules for realm: {}", e);
            }
        });
    });

    let on_click = move |id: i64, ev: ev::MouseEvent| {
        let modifier = toggles_selection(ev.ctrl_key(), ev.meta_key());
        let list = list.get_value();
        spawn_local(async move {
            list.click(id, modifier).await;
        });
    };

    let on_add = move |_| {
        let list = list.get_value();
        spawn_local(async move {
            list.add(None).await;
        });
    };

    let on_copy = move |_| {
        let list = list.get_value();
        spawn_local(async move {
            list.copy().await;
        });
    };

    let on_delete = move |_| {
        let list = list.get_value();
        spawn_local(async move {
            list.delete().await;
        });
    };

    let on_language = move |ev: ev::Event| {
        if let Ok(lang) = RulesetLang::from_str(&event_target_value(&ev)) {
            list.with_value(|list| list.update(|state, _| state.language = Some(lang)));
        }
    };

    let on_sort = move |ev: ev::Event| match SortKey::from_str(&event_target_value(&ev)) {
        Ok(key) => list.with_value(|list| list.set_sort(key)),
        Err(e) => logging::warn!("{}", e),
    };

    let on_global = move |ev: ev::Event| {
        let global = event_target_checked(&ev);
        let list = list.get_value();
        spawn_local(async move {
            if let Err(e) = list.set_global(global).await {
                logging::error!("Failed to load global rules: {}", e);
            }
        });
    };

    let super_user = console.is_super_user();

    view! {
        {move || {
            version.track();
            let snap = list.with_value(|list| snapshot(list));
            let wrapper_class = if snap.disabled { "rule-list disabled" } else { "rule-list" };

            let header = view! {
                <div class="rule-list-header">
                    {super_user.then(|| view! {
                        <label class="global-toggle">
                            <input type="checkbox" prop:checked=snap.global on:change=on_global/>
                            "Global rules"
                        </label>
                    })}
                    <select class="sort-select" on:change=on_sort>
                        {snap.sort_options.iter().map(|key| view! {
                            <option value=key.as_str() selected={*key == snap.sort_by}>
                                {key.as_str()}
                            </option>
                        }).collect_view()}
                    </select>
                    {(!snap.readonly).then(|| view! {
                        <div class="rule-list-actions">
                            {(snap.languages.len() > 1).then(|| view! {
                                <select class="lang-select" on:change=on_language>
                                    {snap.languages.iter().map(|lang| view! {
                                        <option value=lang.as_str() selected={Some(*lang) == snap.language}>
                                            {lang.as_str()}
                                        </option>
                                    }).collect_view()}
                                </select>
                            })}
                            <button class="btn btn-primary btn-sm" on:click=on_add>"Add"</button>
                            <button class="btn btn-secondary btn-sm" disabled={snap.selected != 1} on:click=on_copy>
                                "Copy"
                            </button>
                            <button class="btn btn-danger btn-sm" disabled={snap.selected == 0} on:click=on_delete>
                                "Delete"
                            </button>
                        </div>
                    })}
                </div>
            };

            let body = match snap.nodes {
                None => view! { <p class="loading">"Loading rules..."</p> }.into_view(),
                Some(nodes) if nodes.is_empty() => view! {
                    <EmptyState
                        icon="📜"
                        title="No rules".to_string()
                        description="There are no rules in this realm yet.".to_string()
                    />
                }.into_view(),
                Some(nodes) => view! {
                    <ul class="rule-nodes">
                        {nodes.into_iter().map(|node| {
                            let id = node.id();
                            let status = current_status(&node.ruleset);
                            let class = if node.selected { "rule-node selected" } else { "rule-node" };
                            view! {
                                <li class=class on:click=move |ev| on_click(id, ev)>
                                    <span class=format!("status-dot {}", status.class()) title=status.label()></span>
                                    <span class="rule-name">{node.ruleset.name.clone()}</span>
                                    <span class="rule-lang">{node.ruleset.lang.as_str()}</span>
                                </li>
                            }
                        }).collect_view()}
                    </ul>
                }.into_view(),
            };

            view! {
                <div class=wrapper_class>
                    {header}
                    {body}
                </div>
            }
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_selection_on_ctrl_or_meta() {
        assert!(toggles_selection(true, false));
        assert!(toggles_selection(false, true));
        assert!(!toggles_selection(false, false));
    }
}
