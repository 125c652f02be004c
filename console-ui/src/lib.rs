use leptos::*;
use leptos_meta::*;
use leptos_router::*;

mod api;
mod components;
mod dialogs;
pub mod error;
mod pages;
pub mod session;

use console_common::auth::ClientRole;
use pages::{RulesPage, UsersPage};
use session::{provide_console_context, ConsoleContext};

/// Realm picker shown to super users
#[component]
fn RealmSwitcher(console: ConsoleContext) -> impl IntoView {
    let current = console.display_realm;
    let on_change = move |ev: ev::Event| {
        let realm = event_target_value(&ev).trim().to_string();
        if !realm.is_empty() {
            console.set_display_realm(realm);
        }
    };

    view! {
        <div class="realm-switcher">
            <span class="navbar-item">"Realm"</span>
            <input type="text" prop:value=move || current.get() on:change=on_change/>
        </div>
    }
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();
    let console = provide_console_context();
    let super_user = console.is_super_user();
    let can_read_users = console.has_role(ClientRole::ReadUsers);

    view! {
        <Stylesheet id="leptos" href="/pkg/console-ui.css"/>
        <Title text="Realm Console"/>
        <Meta name="description" content="Users and rules administration"/>

        <Router>
            <nav class="navbar">
                <div class="navbar-brand">
                    <h1>"Console"</h1>
                </div>
                <div class="navbar-menu">
                    <A href="/rules" class="navbar-item">"Rules"</A>
                    {can_read_users.then(|| view! { <A href="/users" class="navbar-item">"Users"</A> })}
                </div>
                {super_user.then(|| view! { <RealmSwitcher console=console.clone()/> })}
            </nav>

            <main class="container">
                <Routes>
                    <Route path="/" view=RulesPage/>
                    <Route path="/rules" view=RulesPage/>
                    <Route path="/users" view=UsersPage/>
                </Routes>
            </main>
        </Router>
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
