///! Session context
///!
///! Replaces the process-wide manager object: the active realm, the realm
///! being displayed, the logged-in user's roles, and a subscribe/notify
///! channel that widgets use to learn about realm switches.

use std::collections::HashSet;

use crate::auth::ClientRole;

/// Events published by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Authentication finished and the session can be used
    Ready,
    /// A super user switched the realm being displayed
    DisplayRealmChanged(String),
}

/// Handle returned by [`Session::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&SessionEvent)>;

pub struct Session {
    realm: String,
    display_realm: String,
    username: Option<String>,
    roles: HashSet<String>,
    super_user: bool,
    authenticated: bool,
    identity_provider: bool,
    ready: bool,
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("realm", &self.realm)
            .field("display_realm", &self.display_realm)
            .field("username", &self.username)
            .field("super_user", &self.super_user)
            .field("authenticated", &self.authenticated)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Session {
    pub fn new(realm: impl Into<String>) -> Self {
        let realm = realm.into();
        Self {
            display_realm: realm.clone(),
            realm,
            username: None,
            roles: HashSet::new(),
            super_user: false,
            authenticated: false,
            identity_provider: true,
            ready: false,
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Mark the session as logged in with the given client roles
    pub fn authenticate<I, S>(&mut self, username: impl Into<String>, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.username = Some(username.into());
        self.roles = roles.into_iter().map(Into::into).collect();
        self.authenticated = true;
    }

    pub fn set_super_user(&mut self, super_user: bool) {
        self.super_user = super_user;
    }

    /// Users are only manageable when an identity provider backs the realm
    pub fn set_identity_provider(&mut self, enabled: bool) {
        self.identity_provider = enabled;
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn display_realm(&self) -> &str {
        &self.display_realm
    }

    /// Realm the widgets should operate on: super users follow the displayed
    /// realm, everyone else is pinned to their own.
    pub fn effective_realm(&self) -> &str {
        if self.super_user {
            &self.display_realm
        } else {
            &self.realm
        }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_super_user(&self) -> bool {
        self.super_user
    }

    pub fn has_identity_provider(&self) -> bool {
        self.identity_provider
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn has_role(&self, role: ClientRole) -> bool {
        self.super_user || self.roles.contains(role.as_str())
    }

    pub fn subscribe(&mut self, listener: impl Fn(&SessionEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn mark_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;
        self.notify(&SessionEvent::Ready);
    }

    /// Switch the displayed realm; listeners are only told about real changes
    pub fn set_display_realm(&mut self, realm: impl Into<String>) {
        let realm = realm.into();
        if realm == self.display_realm {
            return;
        }
        tracing::debug!(from = %self.display_realm, to = %realm, "display realm changed");
        self.display_realm = realm.clone();
        self.notify(&SessionEvent::DisplayRealmChanged(realm));
    }

    fn notify(&self, event: &SessionEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_display_realm_change_notifies() {
        let mut session = Session::new("master");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        session.set_display_realm("building");
        session.set_display_realm("building");

        assert_eq!(
            *seen.borrow(),
            vec![SessionEvent::DisplayRealmChanged("building".to_string())]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut session = Session::new("master");
        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        let id = session.subscribe(move |_| *sink.borrow_mut() += 1);

        session.mark_ready();
        session.unsubscribe(id);
        session.set_display_realm("other");

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_effective_realm() {
        let mut session = Session::new("master");
        session.set_display_realm("building");
        assert_eq!(session.effective_realm(), "master");

        session.set_super_user(true);
        assert_eq!(session.effective_realm(), "building");
    }

    #[test]
    fn test_roles() {
        let mut session = Session::new("building");
        session.authenticate("bob", ["read:rules", "write:rules"]);
        assert!(session.is_authenticated());
        assert!(session.has_role(ClientRole::WriteRules));
        assert!(!session.has_role(ClientRole::WriteUser));

        session.set_super_user(true);
        assert!(session.has_role(ClientRole::WriteUser));
    }
}
