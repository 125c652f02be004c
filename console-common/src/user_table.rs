//! User table state
//!
//! Lists the users of the displayed realm with their composite role and runs
//! the per-row create, update, role assignment and delete calls. Password
//! fields are checked locally first; a mismatch never reaches the backend.

use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::auth::{ClientRole, Credential, Role, User};
use crate::client::UserClient;
use crate::events::Dialogs;
use crate::session::Session;
use crate::{Error, Result};

/// Password and repeat entered on a row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passwords {
    pub reset_password: String,
    pub repeat_password: String,
}

impl Passwords {
    pub fn new(reset_password: impl Into<String>, repeat_password: impl Into<String>) -> Self {
        Self {
            reset_password: reset_password.into(),
            repeat_password: repeat_password.into(),
        }
    }

    /// Credential to send, if both fields are filled in and match. Leaving
    /// either field empty means the password is not touched.
    pub fn credential(&self) -> Result<Option<Credential>> {
        if self.reset_password.is_empty() || self.repeat_password.is_empty() {
            return Ok(None);
        }
        if self.reset_password != self.repeat_password {
            return Err(Error::PasswordMismatch);
        }
        Ok(Some(Credential::password(&self.reset_password)))
    }
}

/// Edits collected on a row before it is saved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRow {
    pub user: User,
    pub passwords: Passwords,
    /// Composite role id picked in the role selector
    pub role: Option<String>,
}

impl UserRow {
    pub fn new(user: User) -> Self {
        Self {
            user,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserTableState {
    users: Vec<User>,
    composite_roles: Vec<Role>,
    user_roles: HashMap<String, Role>,
    pub valid_password: bool,
    loaded: bool,
}

impl Default for UserTableState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            composite_roles: Vec::new(),
            user_roles: HashMap::new(),
            valid_password: true,
            loaded: false,
        }
    }
}

impl UserTableState {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn composite_roles(&self) -> &[Role] {
        &self.composite_roles
    }

    /// Composite role currently assigned to `user_id`
    pub fn role_of(&self, user_id: &str) -> Option<&Role> {
        self.user_roles.get(user_id)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// A new row may only be added once every row is saved
    pub fn can_add_row(&self) -> bool {
        self.users.last().map_or(true, User::is_saved)
    }

    fn clear(&mut self) {
        self.users.clear();
        self.user_roles.clear();
        self.loaded = false;
    }
}

pub struct UserTable<C, D> {
    client: C,
    dialogs: D,
    session: Rc<RefCell<Session>>,
    state: RefCell<UserTableState>,
    on_change: Option<Box<dyn Fn()>>,
}

impl<C, D> UserTable<C, D>
where
    C: UserClient,
    D: Dialogs,
{
    pub fn new(client: C, dialogs: D, session: Rc<RefCell<Session>>) -> Self {
        Self {
            client,
            dialogs,
            session,
            state: RefCell::new(UserTableState::default()),
            on_change: None,
        }
    }

    /// Called after every state change so the view can redraw
    pub fn with_on_change(mut self, on_change: impl Fn() + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    pub fn state(&self) -> Ref<'_, UserTableState> {
        self.state.borrow()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_readonly(&self) -> bool {
        !self.session.borrow().has_role(ClientRole::WriteUser)
    }

    /// The logged-in user can't change their own role
    pub fn can_change_role(&self, user: &User) -> bool {
        !self.is_readonly() && self.session.borrow().username() != Some(user.username.as_str())
    }

    fn changed(&self) {
        if let Some(on_change) = &self.on_change {
            on_change();
        }
    }

    fn realm(&self) -> String {
        self.session.borrow().effective_realm().to_string()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_readonly() {
            return Err(Error::Forbidden(ClientRole::WriteUser.as_str()));
        }
        Ok(())
    }

    /// Fetch composite roles, users and each user's assigned composite role.
    /// A failed read leaves the current rows in place.
    pub async fn load(&self) -> Result<()> {
        {
            let session = self.session.borrow();
            if !session.is_authenticated() {
                return Err(Error::NotAuthenticated);
            }
            if !session.has_identity_provider() {
                return Err(Error::Unsupported("user management without identity provider".to_string()));
            }
        }
        let realm = self.realm();

        let roles = self.client.list_roles(&realm).await.map_err(|e| {
            tracing::error!(realm = %realm, error = %e, "failed to load roles");
            e
        })?;
        let users = self.client.list_users(&realm).await.map_err(|e| {
            tracing::error!(realm = %realm, error = %e, "failed to load users");
            e
        })?;

        let mut user_roles = HashMap::new();
        for user in &users {
            let Some(id) = &user.id else { continue };
            match self.client.get_user_roles(&realm, id).await {
                Ok(assigned) => {
                    if let Some(role) = assigned.into_iter().find(|r| r.composite && r.is_assigned()) {
                        user_roles.insert(id.clone(), role);
                    }
                }
                Err(e) => tracing::warn!(realm = %realm, user = %user.username, error = %e, "failed to load user roles"),
            }
        }

        tracing::debug!(realm = %realm, count = users.len(), "loaded users");
        {
            let mut state = self.state.borrow_mut();
            state.composite_roles = roles.into_iter().filter(|r| r.composite).collect();
            state.users = users;
            state.user_roles = user_roles;
            state.loaded = true;
        }
        self.changed();
        Ok(())
    }

    /// Discard the rows and refetch for the newly displayed realm
    pub async fn realm_changed(&self) -> Result<()> {
        self.state.borrow_mut().clear();
        self.changed();
        self.load().await
    }

    /// Append a blank enabled row
    pub fn add_row(&self) -> bool {
        if self.is_readonly() || !self.state.borrow().can_add_row() {
            return false;
        }
        self.state.borrow_mut().users.push(User::new_enabled());
        self.changed();
        true
    }

    /// Drop the trailing unsaved row
    pub fn cancel_row(&self) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            match state.users.last() {
                Some(user) if !user.is_saved() => state.users.pop().is_some(),
                _ => false,
            }
        };
        if removed {
            self.changed();
        }
        removed
    }

    /// Check the row's passwords, flagging a mismatch for the view
    fn check_passwords(&self, passwords: &Passwords) -> Result<Option<Credential>> {
        let result = passwords.credential();
        let valid = !matches!(result, Err(Error::PasswordMismatch));
        let flipped = {
            let mut state = self.state.borrow_mut();
            let flipped = state.valid_password != valid;
            state.valid_password = valid;
            flipped
        };
        if flipped {
            self.changed();
        }
        result
    }

    /// Save a new user, then set its password and role
    pub async fn create(&self, row: UserRow) -> Result<User> {
        self.ensure_writable()?;
        let credential = self.check_passwords(&row.passwords)?;
        let realm = self.realm();

        let created = self.client.create_user(&realm, &row.user).await.map_err(|e| {
            tracing::error!(realm = %realm, username = %row.user.username, error = %e, "failed to create user");
            e
        })?;
        let id = created
            .id
            .clone()
            .ok_or_else(|| Error::Decode("created user has no id".to_string()))?;
        tracing::info!(realm = %realm, username = %created.username, "created user");

        if let Some(credential) = credential {
            self.client.reset_password(&realm, &id, &credential).await?;
        }

        let assigned = match &row.role {
            Some(role_id) => self.assign_role(&created, role_id).await?,
            None => false,
        };
        if !assigned {
            self.load().await?;
        }
        Ok(created)
    }

    /// Save edits to an existing user. The saved record replaces the row;
    /// a role change runs last so its reload sees the updated user.
    pub async fn update(&self, row: UserRow) -> Result<()> {
        self.ensure_writable()?;
        let credential = self.check_passwords(&row.passwords)?;
        let realm = self.realm();
        let id = row
            .user
            .id
            .clone()
            .ok_or_else(|| Error::NotFound(row.user.username.clone()))?;

        if let Some(credential) = credential {
            self.client.reset_password(&realm, &id, &credential).await?;
        }

        self.client.update_user(&realm, &row.user).await.map_err(|e| {
            tracing::error!(realm = %realm, username = %row.user.username, error = %e, "failed to update user");
            e
        })?;
        tracing::info!(realm = %realm, username = %row.user.username, "updated user");

        {
            let mut state = self.state.borrow_mut();
            if let Some(stored) = state.users.iter_mut().find(|u| u.id.as_deref() == Some(id.as_str())) {
                *stored = row.user.clone();
            }
        }
        self.changed();

        if let Some(role_id) = &row.role {
            self.assign_role(&row.user, role_id).await?;
        }
        Ok(())
    }

    /// Give `user` the composite role `role_id` and reload. Returns false
    /// without calling the backend when the role is unknown or the user may
    /// not change it.
    pub async fn assign_role(&self, user: &User, role_id: &str) -> Result<bool> {
        self.ensure_writable()?;
        if !self.can_change_role(user) {
            return Ok(false);
        }
        let Some(id) = user.id.clone() else {
            return Ok(false);
        };
        let role = self
            .state
            .borrow()
            .composite_roles
            .iter()
            .find(|r| r.id == role_id)
            .cloned();
        let Some(mut role) = role else {
            tracing::debug!(role_id, "unknown composite role");
            return Ok(false);
        };
        role.assigned = Some(true);

        let realm = self.realm();
        self.client
            .update_user_roles(&realm, &id, std::slice::from_ref(&role))
            .await?;
        self.state.borrow_mut().user_roles.insert(id, role);
        self.changed();

        self.load().await?;
        Ok(true)
    }

    /// Delete `user` after confirmation; the row is removed without a refetch
    pub async fn delete(&self, user: &User) -> Result<bool> {
        self.ensure_writable()?;
        let Some(id) = user.id.clone() else {
            return Ok(false);
        };
        if !self
            .dialogs
            .confirm("Delete", "Are you sure you want to delete this user?")
            .await
        {
            return Ok(false);
        }

        let realm = self.realm();
        if let Err(e) = self.client.delete_user(&realm, &id).await {
            tracing::error!(realm = %realm, username = %user.username, error = %e, "failed to delete user");
            return Err(e);
        }
        tracing::info!(realm = %realm, username = %user.username, "deleted user");

        {
            let mut state = self.state.borrow_mut();
            state.users.retain(|u| u.id.as_deref() != Some(id.as_str()));
            state.user_roles.remove(&id);
        }
        self.changed();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{role, user, FakeUserClient, RecordingDialogs};
    use std::cell::Cell;

    type TestTable = UserTable<Rc<FakeUserClient>, Rc<RecordingDialogs>>;

    fn fixture(roles: &[&str]) -> (TestTable, Rc<FakeUserClient>, Rc<RecordingDialogs>) {
        let client = Rc::new(FakeUserClient::default());
        client.set_roles(vec![role("r-admin", "admin", true), role("r-read", "read", false)]);
        client.set_users(vec![user("u1", "alice"), user("u2", "bob")]);
        client.assign("u2", role("r-admin", "admin", true));

        let mut session = Session::new("building");
        session.authenticate("alice", roles.iter().copied());
        let dialogs = Rc::new(RecordingDialogs::confirming());
        let table = UserTable::new(client.clone(), dialogs.clone(), Rc::new(RefCell::new(session)));
        (table, client, dialogs)
    }

    #[tokio::test]
    async fn test_load_keeps_composite_roles_and_assignments() {
        let (table, _, _) = fixture(&["write:user"]);
        table.load().await.unwrap();

        let state = table.state();
        assert_eq!(state.users().len(), 2);
        assert_eq!(state.composite_roles().len(), 1);
        assert_eq!(state.role_of("u2").map(|r| r.name.as_str()), Some("admin"));
        assert!(state.role_of("u1").is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_rows() {
        let (table, client, _) = fixture(&["write:user"]);
        table.load().await.unwrap();
        client.fail_reads(true);

        assert!(table.load().await.is_err());
        assert_eq!(table.state().users().len(), 2);
    }

    #[tokio::test]
    async fn test_unauthenticated_load_makes_no_calls() {
        let client = Rc::new(FakeUserClient::default());
        let table = UserTable::new(
            client.clone(),
            Rc::new(RecordingDialogs::confirming()),
            Rc::new(RefCell::new(Session::new("building"))),
        );
        assert!(matches!(table.load().await, Err(Error::NotAuthenticated)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_mismatched_passwords_makes_no_calls() {
        let (table, client, _) = fixture(&["write:user"]);
        let changes = Rc::new(Cell::new(0));
        let counter = changes.clone();
        let table = table.with_on_change(move || counter.set(counter.get() + 1));

        let row = UserRow {
            user: User::new_enabled(),
            passwords: Passwords::new("secret", "secre7"),
            role: None,
        };

        assert!(matches!(table.create(row).await, Err(Error::PasswordMismatch)));
        assert!(client.calls().is_empty());
        assert!(!table.state().valid_password);
        assert_eq!(changes.get(), 1);
    }

    #[tokio::test]
    async fn test_update_with_mismatched_passwords_makes_no_calls() {
        let (table, client, _) = fixture(&["write:user"]);
        let row = UserRow {
            user: user("u2", "bob"),
            passwords: Passwords::new("a", "b"),
            role: Some("r-admin".to_string()),
        };
        assert!(table.update(row).await.is_err());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_sets_password_and_role() {
        let (table, client, _) = fixture(&["write:user"]);
        table.load().await.unwrap();
        client.clear_calls();

        let mut new_user = User::new_enabled();
        new_user.username = "carol".to_string();
        let row = UserRow {
            user: new_user,
            passwords: Passwords::new("pw", "pw"),
            role: Some("r-admin".to_string()),
        };
        let created = table.create(row).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls[0], "create_user carol");
        assert_eq!(calls[1], format!("reset_password {}", created.id.as_deref().unwrap()));
        assert_eq!(calls[2], format!("update_user_roles {} r-admin", created.id.as_deref().unwrap()));
        assert_eq!(calls.iter().filter(|c| c.starts_with("list_users")).count(), 1);
        assert!(table.state().valid_password);
    }

    #[tokio::test]
    async fn test_create_without_password_or_role_reloads() {
        let (table, client, _) = fixture(&["write:user"]);
        let mut new_user = User::new_enabled();
        new_user.username = "dave".to_string();

        table.create(UserRow::new(new_user)).await.unwrap();

        let calls = client.calls();
        assert_eq!(calls[0], "create_user dave");
        assert!(!calls.iter().any(|c| c.starts_with("reset_password")));
        assert!(calls.iter().any(|c| c.starts_with("list_users")));
    }

    #[tokio::test]
    async fn test_update_shows_saved_values() {
        let (table, _, _) = fixture(&["write:user"]);
        table.load().await.unwrap();

        let mut bob = user("u2", "bob");
        bob.email = Some("bob@new".to_string());
        table.update(UserRow::new(bob)).await.unwrap();

        let state = table.state();
        let row = state.users().iter().find(|u| u.id.as_deref() == Some("u2")).unwrap();
        assert_eq!(row.email.as_deref(), Some("bob@new"));
    }

    #[tokio::test]
    async fn test_update_with_role_reloads_after_saving() {
        let (table, client, _) = fixture(&["write:user"]);
        table.load().await.unwrap();
        client.clear_calls();

        let mut bob = user("u2", "bob");
        bob.email = Some("bob@new".to_string());
        let row = UserRow {
            user: bob,
            passwords: Passwords::default(),
            role: Some("r-admin".to_string()),
        };
        table.update(row).await.unwrap();

        let calls = client.calls();
        let update_at = calls.iter().position(|c| c == "update_user u2").unwrap();
        let reload_at = calls.iter().position(|c| c.starts_with("list_users")).unwrap();
        assert!(update_at < reload_at);

        let state = table.state();
        let row = state.users().iter().find(|u| u.id.as_deref() == Some("u2")).unwrap();
        assert_eq!(row.email.as_deref(), Some("bob@new"));
    }

    #[tokio::test]
    async fn test_readonly_rejects_writes() {
        let (table, client, _) = fixture(&["read:users"]);
        table.load().await.unwrap();
        client.clear_calls();

        assert!(table.is_readonly());
        assert!(!table.add_row());
        assert!(matches!(
            table.update(UserRow::new(user("u1", "alice"))).await,
            Err(Error::Forbidden("write:user"))
        ));
        assert!(table.delete(&user("u1", "alice")).await.is_err());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_own_role_cannot_change() {
        let (table, client, _) = fixture(&["write:user"]);
        table.load().await.unwrap();
        client.clear_calls();

        assert!(!table.can_change_role(&user("u1", "alice")));
        assert!(!table.assign_role(&user("u1", "alice"), "r-admin").await.unwrap());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_assign_unknown_role_is_noop() {
        let (table, client, _) = fixture(&["write:user"]);
        assert!(!table.assign_role(&user("u2", "bob"), "r-admin").await.unwrap());

        table.load().await.unwrap();
        client.clear_calls();
        assert!(!table.assign_role(&user("u2", "bob"), "r-read").await.unwrap());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_cancel_row() {
        let (table, _, _) = fixture(&["write:user"]);
        table.load().await.unwrap();

        assert!(table.add_row());
        assert!(!table.add_row());
        assert_eq!(table.state().users().len(), 3);
        assert!(table.state().users()[2].enabled);

        assert!(table.cancel_row());
        assert!(!table.cancel_row());
        assert_eq!(table.state().users().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_confirms_and_removes_locally() {
        let (table, client, dialogs) = fixture(&["write:user"]);
        table.load().await.unwrap();
        client.clear_calls();

        dialogs.set_confirm(false);
        assert!(!table.delete(&user("u2", "bob")).await.unwrap());
        assert!(client.calls().is_empty());

        dialogs.set_confirm(true);
        assert!(table.delete(&user("u2", "bob")).await.unwrap());
        assert_eq!(client.calls(), vec!["delete_user u2".to_string()]);
        assert_eq!(table.state().users().len(), 1);
        assert!(table.state().role_of("u2").is_none());
    }

    #[test]
    fn test_passwords_credential() {
        assert_eq!(Passwords::default().credential().unwrap(), None);
        assert_eq!(Passwords::new("x", "").credential().unwrap(), None);
        assert!(matches!(Passwords::new("x", "y").credential(), Err(Error::PasswordMismatch)));
        let credential = Passwords::new("x", "x").credential().unwrap().unwrap();
        assert_eq!(credential.value, "x");
    }
}
