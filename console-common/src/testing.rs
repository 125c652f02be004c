//! In-memory fakes for the client, listener and dialog seams

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use crate::auth::{Credential, Role, User};
use crate::client::{RulesClient, RulesetQuery, UserClient, DELETE_OK_STATUS};
use crate::events::{AddDetail, Cancellable, Dialogs, RuleListListener, SelectionChange};
use crate::rules::{Ruleset, RulesetLang, RulesetType};
use crate::{Error, Result};

/// Saved, enabled tenant JSON ruleset
pub fn ruleset(id: i64, name: &str) -> Ruleset {
    let mut ruleset = Ruleset::new(RulesetType::Tenant, name, RulesetLang::Json);
    ruleset.id = Some(id);
    ruleset.realm = Some("building".to_string());
    ruleset
}

pub fn user(id: &str, username: &str) -> User {
    User {
        id: Some(id.to_string()),
        username: username.to_string(),
        enabled: true,
        ..Default::default()
    }
}

pub fn role(id: &str, name: &str, composite: bool) -> Role {
    Role {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        composite,
        assigned: None,
    }
}

#[derive(Default)]
pub struct FakeRulesClient {
    rulesets: RefCell<Vec<Ruleset>>,
    fail_list: Cell<bool>,
    failing: RefCell<HashSet<i64>>,
    statuses: RefCell<HashMap<i64, u16>>,
    remove_on_delete: Cell<bool>,
    delete_calls: RefCell<Vec<i64>>,
    tenant_realms: RefCell<Vec<String>>,
    global_calls: Cell<usize>,
    created: RefCell<Vec<Ruleset>>,
}

impl FakeRulesClient {
    pub fn set_rulesets(&self, rulesets: Vec<Ruleset>) {
        *self.rulesets.borrow_mut() = rulesets;
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.set(fail);
    }

    pub fn fail_delete(&self, id: i64) {
        self.failing.borrow_mut().insert(id);
    }

    pub fn delete_status(&self, id: i64, status: u16) {
        self.statuses.borrow_mut().insert(id, status);
    }

    pub fn remove_on_delete(&self, remove: bool) {
        self.remove_on_delete.set(remove);
    }

    /// Ids passed to delete, in call order, including failed ones
    pub fn deleted_ids(&self) -> Vec<i64> {
        self.delete_calls.borrow().clone()
    }

    pub fn tenant_realms(&self) -> Vec<String> {
        self.tenant_realms.borrow().clone()
    }

    pub fn global_calls(&self) -> usize {
        self.global_calls.get()
    }

    pub fn list_calls(&self) -> usize {
        self.tenant_realms.borrow().len() + self.global_calls.get()
    }

    pub fn created(&self) -> Vec<Ruleset> {
        self.created.borrow().clone()
    }

    fn listing(&self) -> Result<Vec<Ruleset>> {
        if self.fail_list.get() {
            return Err(Error::Http("connection refused".to_string()));
        }
        Ok(self.rulesets.borrow().clone())
    }
}

#[async_trait(?Send)]
impl RulesClient for FakeRulesClient {
    async fn list_tenant_rulesets(&self, realm: &str, _query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        self.tenant_realms.borrow_mut().push(realm.to_string());
        self.listing()
    }

    async fn list_global_rulesets(&self, _query: &RulesetQuery) -> Result<Vec<Ruleset>> {
        self.global_calls.set(self.global_calls.get() + 1);
        self.listing()
    }

    async fn delete_ruleset(&self, _ruleset_type: RulesetType, id: i64) -> Result<u16> {
        self.delete_calls.borrow_mut().push(id);
        if self.failing.borrow().contains(&id) {
            return Err(Error::Http("connection reset".to_string()));
        }
        let status = self.statuses.borrow().get(&id).copied().unwrap_or(DELETE_OK_STATUS);
        if status == DELETE_OK_STATUS && self.remove_on_delete.get() {
            self.rulesets.borrow_mut().retain(|r| r.id != Some(id));
        }
        Ok(status)
    }

    async fn create_ruleset(&self, ruleset: &Ruleset) -> Result<i64> {
        let mut created = self.created.borrow_mut();
        created.push(ruleset.clone());
        Ok(1000 + created.len() as i64)
    }
}

/// Listener that records what it was told and can veto requests
#[derive(Default)]
pub struct RecordingListener {
    veto_selection: Cell<bool>,
    veto_delete: Cell<bool>,
    rename_added: RefCell<Option<String>>,
    selection_changes: RefCell<Vec<SelectionChange>>,
    added: RefCell<Vec<AddDetail>>,
    state_changes: Cell<usize>,
}

impl RecordingListener {
    pub fn veto_selection(&self, veto: bool) {
        self.veto_selection.set(veto);
    }

    pub fn veto_delete(&self, veto: bool) {
        self.veto_delete.set(veto);
    }

    /// Replace the name of every add request's ruleset
    pub fn rename_added_to(&self, name: &str) {
        *self.rename_added.borrow_mut() = Some(name.to_string());
    }

    pub fn selection_changes(&self) -> Vec<SelectionChange> {
        self.selection_changes.borrow().clone()
    }

    pub fn added_details(&self) -> Vec<AddDetail> {
        self.added.borrow().clone()
    }

    pub fn state_changes(&self) -> usize {
        self.state_changes.get()
    }
}

#[async_trait(?Send)]
impl RuleListListener for RecordingListener {
    async fn request_selection(&self, change: SelectionChange) -> Cancellable<SelectionChange> {
        if self.veto_selection.get() {
            Cancellable::deny(change)
        } else {
            Cancellable::allow(change)
        }
    }

    fn selection_changed(&self, change: &SelectionChange) {
        self.selection_changes.borrow_mut().push(change.clone());
    }

    async fn request_add(&self, mut detail: AddDetail) -> Cancellable<AddDetail> {
        if let Some(name) = self.rename_added.borrow().as_ref() {
            detail.ruleset.name = name.clone();
        }
        Cancellable::allow(detail)
    }

    async fn added(&self, detail: AddDetail) {
        self.added.borrow_mut().push(detail);
    }

    async fn request_delete(&self, rulesets: Vec<Ruleset>) -> Cancellable<Vec<Ruleset>> {
        if self.veto_delete.get() {
            Cancellable::deny(rulesets)
        } else {
            Cancellable::allow(rulesets)
        }
    }

    fn state_changed(&self) {
        self.state_changes.set(self.state_changes.get() + 1);
    }
}

/// Dialogs with a scripted confirm answer
pub struct RecordingDialogs {
    answer: Cell<bool>,
    confirms: Cell<usize>,
    errors: RefCell<Vec<String>>,
}

impl RecordingDialogs {
    pub fn confirming() -> Self {
        Self {
            answer: Cell::new(true),
            confirms: Cell::new(0),
            errors: RefCell::new(Vec::new()),
        }
    }

    pub fn set_confirm(&self, answer: bool) {
        self.answer.set(answer);
    }

    pub fn confirms(&self) -> usize {
        self.confirms.get()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Dialogs for RecordingDialogs {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.confirms.set(self.confirms.get() + 1);
        self.answer.get()
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

/// User backend that logs every call as a short line
#[derive(Default)]
pub struct FakeUserClient {
    users: RefCell<Vec<User>>,
    roles: RefCell<Vec<Role>>,
    assigned: RefCell<HashMap<String, Vec<Role>>>,
    fail_reads: Cell<bool>,
    calls: RefCell<Vec<String>>,
}

impl FakeUserClient {
    pub fn set_users(&self, users: Vec<User>) {
        *self.users.borrow_mut() = users;
    }

    pub fn set_roles(&self, roles: Vec<Role>) {
        *self.roles.borrow_mut() = roles;
    }

    /// Report `role` as assigned to `user_id`
    pub fn assign(&self, user_id: &str, mut role: Role) {
        role.assigned = Some(true);
        self.assigned
            .borrow_mut()
            .entry(user_id.to_string())
            .or_default()
            .push(role);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn read<T>(&self, value: T) -> Result<T> {
        if self.fail_reads.get() {
            return Err(Error::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(value)
    }
}

#[async_trait(?Send)]
impl UserClient for FakeUserClient {
    async fn list_users(&self, realm: &str) -> Result<Vec<User>> {
        self.record(format!("list_users {}", realm));
        self.read(self.users.borrow().clone())
    }

    async fn list_roles(&self, realm: &str) -> Result<Vec<Role>> {
        self.record(format!("list_roles {}", realm));
        self.read(self.roles.borrow().clone())
    }

    async fn get_user_roles(&self, _realm: &str, user_id: &str) -> Result<Vec<Role>> {
        self.record(format!("get_user_roles {}", user_id));
        let mut roles = self.roles.borrow().clone();
        if let Some(assigned) = self.assigned.borrow().get(user_id) {
            for role in &mut roles {
                role.assigned = Some(assigned.iter().any(|a| a.id == role.id));
            }
        }
        self.read(roles)
    }

    async fn create_user(&self, _realm: &str, user: &User) -> Result<User> {
        self.record(format!("create_user {}", user.username));
        let mut created = user.clone();
        let mut users = self.users.borrow_mut();
        created.id = Some(format!("new-{}", users.len() + 1));
        users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, _realm: &str, user: &User) -> Result<()> {
        self.record(format!("update_user {}", user.id.as_deref().unwrap_or_default()));
        let mut users = self.users.borrow_mut();
        if let Some(stored) = users.iter_mut().find(|u| u.id == user.id) {
            *stored = user.clone();
        }
        Ok(())
    }

    async fn delete_user(&self, _realm: &str, user_id: &str) -> Result<()> {
        self.record(format!("delete_user {}", user_id));
        self.users.borrow_mut().retain(|u| u.id.as_deref() != Some(user_id));
        Ok(())
    }

    async fn reset_password(&self, _realm: &str, user_id: &str, _credential: &Credential) -> Result<()> {
        self.record(format!("reset_password {}", user_id));
        Ok(())
    }

    async fn update_user_roles(&self, _realm: &str, user_id: &str, roles: &[Role]) -> Result<()> {
        let ids: Vec<&str> = roles.iter().map(|r| r.id.as_str()).collect();
        self.record(format!("update_user_roles {} {}", user_id, ids.join(",")));
        self.assigned
            .borrow_mut()
            .insert(user_id.to_string(), roles.to_vec());
        Ok(())
    }
}
