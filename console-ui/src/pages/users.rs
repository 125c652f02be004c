//! User management page
//!
//! One editable row per user of the displayed realm. Saved rows update in
//! place; the trailing unsaved row creates a new user.

use leptos::*;
use std::collections::HashMap;
use std::rc::Rc;

use console_common::auth::{Role, User};
use console_common::user_table::{UserRow, UserTable};
use console_common::Error;

use crate::api::ConsoleApi;
use crate::dialogs::BrowserDialogs;
use crate::error::{ApiError, ErrorAlert, FieldError};
use crate::session::use_console;

type Table = UserTable<ConsoleApi, BrowserDialogs>;

/// Report a failed write unless it is the local password check, which the
/// row shows as helper text instead
fn report(set_error: WriteSignal<Option<ApiError>>, result: Result<(), Error>) {
    match result {
        Ok(()) => set_error.set(None),
        Err(Error::PasswordMismatch) => {}
        Err(e) => {
            logging::error!("User update failed: {}", e);
            set_error.set(Some(ApiError::from(&e)));
        }
    }
}

/// Unsaved edits per row, keyed by user id. They outlive the row views,
/// which are rebuilt on every table change.
type Drafts = StoredValue<HashMap<String, UserRow>>;

/// Draft key of the trailing unsaved row
const NEW_ROW: &str = "";

/// Draft key for a row; unsaved users share the trailing row's key
fn draft_key(user: &User) -> String {
    user.id.clone().unwrap_or_else(|| NEW_ROW.to_string())
}

/// Remember `current` unless it matches what the table already holds
fn keep_draft(drafts: &mut HashMap<String, UserRow>, key: String, current: UserRow, pristine: &UserRow) {
    if current == *pristine {
        drafts.remove(&key);
    } else {
        drafts.insert(key, current);
    }
}

#[component]
fn UserRowView(
    table: StoredValue<Rc<Table>>,
    user: User,
    roles: Vec<Role>,
    current_role: Option<String>,
    readonly: bool,
    valid_password: bool,
    drafts: Drafts,
    set_version: WriteSignal<u64>,
    set_error: WriteSignal<Option<ApiError>>,
) -> impl IntoView {
    let saved = user.is_saved();
    let can_change_role = table.with_value(|t| t.can_change_role(&user));
    let key = store_value(draft_key(&user));
    let pristine = UserRow::new(user.clone());
    let draft = drafts
        .with_value(|d| d.get(&key.get_value()).cloned())
        .unwrap_or_else(|| pristine.clone());
    let selected_role = draft.role.clone().or(current_role);
    let row = create_rw_signal(draft.clone());

    // Keep only rows that differ from what the table holds
    create_effect(move |_| {
        let current = row.get();
        drafts.update_value(|d| keep_draft(d, key.get_value(), current, &pristine));
    });

    let discard_draft = move || {
        drafts.update_value(|d| {
            d.remove(&key.get_value());
        });
        set_version.update(|v| *v += 1);
    };

    let on_save = move |_| {
        let table = table.get_value();
        let row = row.get_untracked();
        spawn_local(async move {
            let result = if saved {
                table.update(row).await
            } else {
                table.create(row).await.map(|_| ())
            };
            if result.is_ok() {
                discard_draft();
            }
            report(set_error, result);
        });
    };

    let delete_target = user.clone();
    let on_delete = move |_| {
        let table = table.get_value();
        let user = delete_target.clone();
        spawn_local(async move {
            let result = table.delete(&user).await;
            if matches!(result, Ok(true)) {
                discard_draft();
            }
            report(set_error, result.map(|_| ()));
        });
    };

    let on_cancel = move |_| {
        drafts.update_value(|d| {
            d.remove(NEW_ROW);
        });
        table.with_value(|t| t.cancel_row());
    };

    view! {
        <tr class="user-row">
            <td colspan="4">
                <div class="user-form">
                    <div class="user-fields">
                        <input type="text" placeholder="Username" prop:readonly=readonly prop:value=draft.user.username.clone()
                            on:input=move |ev| row.update(|r| r.user.username = event_target_value(&ev))/>
                        <input type="email" placeholder="Email" prop:readonly=readonly prop:value=draft.user.email.clone().unwrap_or_default()
                            on:input=move |ev| row.update(|r| r.user.email = Some(event_target_value(&ev)))/>
                        <input type="text" placeholder="First name" prop:readonly=readonly prop:value=draft.user.first_name.clone().unwrap_or_default()
                            on:input=move |ev| row.update(|r| r.user.first_name = Some(event_target_value(&ev)))/>
                        <input type="text" placeholder="Surname" prop:readonly=readonly prop:value=draft.user.last_name.clone().unwrap_or_default()
                            on:input=move |ev| row.update(|r| r.user.last_name = Some(event_target_value(&ev)))/>
                    </div>
                    <div class="user-fields">
                        <select prop:disabled={readonly || !can_change_role}
                            on:change=move |ev| {
                                let value = event_target_value(&ev);
                                row.update(|r| r.role = (!value.is_empty()).then_some(value));
                            }>
                            <option value="">"Role"</option>
                            {roles.into_iter().map(|role| {
                                let selected = selected_role.as_deref() == Some(role.id.as_str());
                                view! { <option value=role.id.clone() selected=selected>{role.name.clone()}</option> }
                            }).collect_view()}
                        </select>
                        <input type="password" placeholder="Password" prop:readonly=readonly prop:value=draft.passwords.reset_password.clone()
                            on:input=move |ev| row.update(|r| r.passwords.reset_password = event_target_value(&ev))/>
                        <div class="field">
                            <input type="password" placeholder="Repeat password" prop:readonly=readonly prop:value=draft.passwords.repeat_password.clone()
                                on:input=move |ev| row.update(|r| r.passwords.repeat_password = event_target_value(&ev))/>
                            {(!valid_password).then(|| view! {
                                <FieldError message="Passwords must match".to_string()/>
                            })}
                        </div>
                        <label>
                            <input type="checkbox" prop:disabled=readonly prop:checked=draft.user.enabled
                                on:change=move |ev| row.update(|r| r.user.enabled = event_target_checked(&ev))/>
                            "Enabled"
                        </label>
                    </div>
                    {(!readonly).then(|| if saved {
                        view! {
                            <div class="row-actions">
                                <button class="btn btn-danger btn-sm" on:click=on_delete>"Delete"</button>
                                <button class="btn btn-primary btn-sm" on:click=on_save>"Save"</button>
                            </div>
                        }
                    } else {
                        view! {
                            <div class="row-actions">
                                <button class="btn btn-ghost btn-sm" on:click=on_cancel>"Cancel"</button>
                                <button class="btn btn-primary btn-sm" on:click=on_save>"Save"</button>
                            </div>
                        }
                    })}
                </div>
            </td>
        </tr>
    }
}

#[component]
pub fn UsersPage() -> impl IntoView {
    let console = use_console();
    let (version, set_version) = create_signal(0u64);
    let (error, set_error) = create_signal(None::<ApiError>);

    let (authenticated, identity_provider) = {
        let session = console.session.borrow();
        (session.is_authenticated(), session.has_identity_provider())
    };
    if !authenticated {
        return view! { <p class="not-authenticated">"Not authenticated"</p> }.into_view();
    }
    if !identity_provider {
        return view! { <p class="not-supported">"User management is not supported for this login"</p> }.into_view();
    }

    let table = Rc::new(
        UserTable::new(console.api.clone(), BrowserDialogs, console.session.clone())
            .with_on_change(move || set_version.update(|v| *v += 1)),
    );
    let table = store_value(table);
    let drafts: Drafts = store_value(HashMap::new());

    let load = move || {
        let table = table.get_value();
        spawn_local(async move {
            if let Err(e) = table.load().await {
                set_error.set(Some(ApiError::from(&e)));
            }
        });
    };
    load();

    console.on_realm_change(move || {
        drafts.update_value(|d| d.clear());
        let table = table.get_value();
        spawn_local(async move {
            if let Err(e) = table.realm_changed().await {
                set_error.set(Some(ApiError::from(&e)));
            }
        });
    });

    let on_add = move |_| {
        table.with_value(|t| t.add_row());
    };

    view! {
        <div class="users-page">
            <div class="page-header">
                <h1>"Users"</h1>
                <p class="description">{move || format!("Realm: {}", console.display_realm.get())}</p>
            </div>

            {move || error.get().map(|e| view! {
                <ErrorAlert
                    error=e
                    on_retry=Callback::new(move |_| load())
                    on_dismiss=Callback::new(move |_| set_error.set(None))
                />
            })}

            {move || {
                version.track();
                let table_ref = table.get_value();
                let readonly = table_ref.is_readonly();
                let state = table_ref.state();
                if !state.is_loaded() {
                    return view! { <p class="loading">"Loading users..."</p> }.into_view();
                }

                let rows = state.users().iter().map(|user| {
                    let current_role = user
                        .id
                        .as_deref()
                        .and_then(|id| state.role_of(id))
                        .map(|r| r.id.clone());
                    view! {
                        <UserRowView
                            table=table
                            user=user.clone()
                            roles=state.composite_roles().to_vec()
                            current_role=current_role
                            readonly=readonly
                            valid_password=state.valid_password
                            drafts=drafts
                            set_version=set_version
                            set_error=set_error
                        />
                    }
                }).collect_view();
                let can_add = !readonly && state.can_add_row();

                view! {
                    <table class="data-table users-table">
                        <thead>
                            <tr>
                                <th>"Username"</th>
                                <th>"Email"</th>
                                <th>"Role"</th>
                                <th>"Status"</th>
                            </tr>
                        </thead>
                        <tbody>
                            {rows}
                            {can_add.then(|| view! {
                                <tr class="add-row">
                                    <td colspan="4">
                                        <a class="button" on:click=on_add>"+ Add user"</a>
                                    </td>
                                </tr>
                            })}
                        </tbody>
                    </table>
                }.into_view()
            }}
        </div>
    }
    .into_view()
}
