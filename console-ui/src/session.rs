//! Session bootstrap and context
//!
//! The login flow stores a small JSON document in local storage; this module
//! turns it into the shared [`Session`] and provides it to every page together
//! with the REST client.

use leptos::*;
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;

use console_common::auth::ClientRole;
use console_common::session::{Session, SessionEvent};

use crate::api::ConsoleApi;

pub const STORAGE_KEY: &str = "console.session";
const DEFAULT_REALM: &str = "master";

/// Login details as written by the identity provider callback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredLogin {
    pub realm: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub super_user: bool,
    pub token: Option<String>,
    pub identity_provider: Option<bool>,
}

impl StoredLogin {
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(login) => Some(login),
            Err(e) => {
                logging::warn!("Ignoring unreadable stored login: {}", e);
                None
            }
        }
    }

    fn load() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        let raw = storage.get_item(STORAGE_KEY).ok()??;
        Self::parse(&raw)
    }

    pub fn into_session(self) -> Session {
        let mut session = Session::new(self.realm.as_deref().unwrap_or(DEFAULT_REALM));
        if let Some(username) = self.username {
            session.authenticate(username, self.roles);
        }
        session.set_super_user(self.super_user);
        if let Some(enabled) = self.identity_provider {
            session.set_identity_provider(enabled);
        }
        session.mark_ready();
        session
    }
}

/// Shared by every page through the Leptos context
#[derive(Clone)]
pub struct ConsoleContext {
    pub session: Rc<RefCell<Session>>,
    pub api: ConsoleApi,
    /// Bumped whenever the displayed realm changes
    pub display_realm: RwSignal<String>,
}

impl ConsoleContext {
    pub fn from_storage() -> Self {
        let login = StoredLogin::load().unwrap_or_default();
        let token = login.token.clone();
        let session = login.into_session();
        let api = ConsoleApi::for_origin(session.realm(), token);
        let display_realm = create_rw_signal(session.display_realm().to_string());

        Self {
            session: Rc::new(RefCell::new(session)),
            api,
            display_realm,
        }
    }

    pub fn has_role(&self, role: ClientRole) -> bool {
        self.session.borrow().has_role(role)
    }

    pub fn is_super_user(&self) -> bool {
        self.session.borrow().is_super_user()
    }

    /// Super users switch the realm they are looking at
    pub fn set_display_realm(&self, realm: String) {
        self.session.borrow_mut().set_display_realm(realm.clone());
        self.display_realm.set(realm);
    }

    /// Run `on_change` on every display realm switch while the calling
    /// component is mounted
    pub fn on_realm_change(&self, on_change: impl Fn() + 'static) {
        let id = self.session.borrow_mut().subscribe(move |event| {
            if let SessionEvent::DisplayRealmChanged(_) = event {
                on_change();
            }
        });
        let session = self.session.clone();
        on_cleanup(move || session.borrow_mut().unsubscribe(id));
    }
}

pub fn provide_console_context() -> ConsoleContext {
    let context = ConsoleContext::from_storage();
    provide_context(context.clone());
    context
}

pub fn use_console() -> ConsoleContext {
    expect_context::<ConsoleContext>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_login_into_session() {
        let login = StoredLogin::parse(
            r#"{"realm":"building","username":"admin","roles":["write:rules"],"superUser":false}"#,
        )
        .unwrap();
        let session = login.into_session();

        assert_eq!(session.realm(), "building");
        assert!(session.is_authenticated());
        assert!(session.has_role(ClientRole::WriteRules));
        assert!(!session.has_role(ClientRole::WriteUser));
        assert!(session.is_ready());
    }

    #[test]
    fn test_missing_login_is_anonymous() {
        let session = StoredLogin::default().into_session();
        assert_eq!(session.realm(), DEFAULT_REALM);
        assert!(!session.is_authenticated());
    }
}
