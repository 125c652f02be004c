//! Rule list state
//!
//! [`RuleListState`] is the synchronous model behind the rule list widget:
//! the fetched nodes, the selection set, sort order, language gating and
//! the add/copy/delete candidates. [`RuleList`] wraps it with a client, a
//! listener and dialogs and runs the asynchronous flows. It only takes `&self`
//! and never holds a state borrow across an await, so the UI can share it
//! behind an `Rc` and keep rendering while a flow is suspended.

mod mutation;
mod selection;
mod sort;
mod status;

pub use mutation::{add_candidate, copy_candidate, delete_rulesets, DeleteOutcome};
pub use sort::{sort_nodes, SortKey};
pub use status::{current_status, status_of, NodeStatus};

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::auth::ClientRole;
use crate::client::{RulesClient, RulesetQuery};
use crate::events::{AddDetail, AllowAll, Dialogs, RuleListListener, SelectionChange};
use crate::rules::{Ruleset, RulesetLang};
use crate::session::Session;
use crate::Result;

/// Hook that may edit a candidate ruleset; returning false vetoes the action
pub type RulesetHandler = Rc<dyn Fn(&mut Ruleset) -> bool>;

/// Hook consulted per ruleset before it is deleted; returning false skips it
pub type DeleteHandler = Rc<dyn Fn(&Ruleset) -> bool>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesControls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_languages: Option<Vec<RulesetLang>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select: Option<bool>,
}

#[derive(Clone, Default)]
pub struct RulesConfig {
    pub controls: RulesControls,
    pub ruleset_add_handler: Option<RulesetHandler>,
    pub ruleset_copy_handler: Option<RulesetHandler>,
    pub ruleset_delete_handler: Option<DeleteHandler>,
}

impl fmt::Debug for RulesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesConfig")
            .field("controls", &self.controls)
            .field("ruleset_add_handler", &self.ruleset_add_handler.is_some())
            .field("ruleset_copy_handler", &self.ruleset_copy_handler.is_some())
            .field("ruleset_delete_handler", &self.ruleset_delete_handler.is_some())
            .finish()
    }
}

/// One row of the rule list
#[derive(Debug, Clone, PartialEq)]
pub struct RulesetNode {
    pub ruleset: Ruleset,
    pub selected: bool,
}

impl RulesetNode {
    pub fn new(ruleset: Ruleset) -> Self {
        Self {
            ruleset,
            selected: false,
        }
    }

    pub fn id(&self) -> i64 {
        self.ruleset.id.unwrap_or_default()
    }

    pub fn status(&self, now_ms: i64) -> NodeStatus {
        status_of(&self.ruleset, now_ms)
    }
}

#[derive(Debug, Clone)]
pub struct RuleListState {
    pub config: RulesConfig,
    pub readonly: bool,
    pub multi_select: bool,
    pub language: Option<RulesetLang>,
    disabled: bool,
    sort_by: SortKey,
    global: bool,
    nodes: Option<Vec<RulesetNode>>,
    selected_ids: Vec<i64>,
    selected_nodes: Vec<RulesetNode>,
}

impl Default for RuleListState {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}

impl RuleListState {
    pub fn new(config: RulesConfig) -> Self {
        Self {
            config,
            readonly: false,
            multi_select: true,
            language: None,
            disabled: false,
            sort_by: SortKey::default(),
            global: false,
            nodes: None,
            selected_ids: Vec::new(),
            selected_nodes: Vec::new(),
        }
    }

    /// `None` until the first successful load and after a realm change
    pub fn nodes(&self) -> Option<&[RulesetNode]> {
        self.nodes.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.nodes.is_none()
    }

    pub fn selected_ids(&self) -> &[i64] {
        &self.selected_ids
    }

    pub fn selected_nodes(&self) -> &[RulesetNode] {
        &self.selected_nodes
    }

    pub fn sort_by(&self) -> SortKey {
        self.sort_by
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_readonly(&self, session: &Session) -> bool {
        self.readonly || !session.has_role(ClientRole::WriteRules)
    }

    pub fn multi_select_enabled(&self, session: &Session) -> bool {
        !self.is_readonly(session) && self.multi_select && self.config.controls.multi_select != Some(false)
    }

    /// Languages that may be listed and added. Groovy and anything listed
    /// after it are reserved for super users working on global rules.
    pub fn allowed_languages(&self, session: &Session) -> Vec<RulesetLang> {
        let mut languages = self
            .config
            .controls
            .allowed_languages
            .clone()
            .unwrap_or_else(|| RulesetLang::DEFAULT_ALLOWED.to_vec());

        if !session.is_super_user() || !self.global {
            if let Some(index) = languages.iter().position(|l| *l == RulesetLang::Groovy) {
                if index > 0 {
                    languages.truncate(index);
                }
            }
        }

        languages
    }

    /// Keep the current language if still allowed, otherwise fall back to the
    /// first allowed one
    pub fn update_language(&mut self, session: &Session) {
        let languages = self.allowed_languages(session);
        match self.language {
            _ if languages.is_empty() => self.language = None,
            Some(lang) if languages.contains(&lang) => {}
            _ => self.language = Some(languages[0]),
        }
    }

    pub fn sort_options(&self, session: &Session) -> Vec<SortKey> {
        SortKey::options(self.allowed_languages(session).len())
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort_by = key;
        if let Some(nodes) = self.nodes.as_mut() {
            sort_nodes(nodes, key);
        }
    }

    /// Switch between tenant and global rulesets; the caller reloads
    pub fn set_global(&mut self, global: bool, session: &Session) {
        self.global = global;
        self.update_language(session);
    }

    /// Drop the nodes so the next render reloads them
    pub fn clear(&mut self) {
        self.nodes = None;
    }

    pub fn query(&self, session: &Session) -> RulesetQuery {
        RulesetQuery {
            fully_populate: true,
            languages: if self.global {
                Vec::new()
            } else {
                self.allowed_languages(session)
            },
        }
    }

    /// Replace the nodes with freshly fetched rulesets, sorted by the current
    /// key. A pending selection is reconciled against the new nodes.
    pub fn set_rulesets(&mut self, rulesets: Vec<Ruleset>) -> Option<SelectionChange> {
        // Selection is keyed by id, so a ruleset without one can't be a node
        let mut nodes: Vec<RulesetNode> = rulesets
            .into_iter()
            .filter(|r| {
                if r.id.is_none() {
                    tracing::warn!(name = %r.name, "skipping ruleset without id");
                }
                r.id.is_some()
            })
            .map(RulesetNode::new)
            .collect();
        sort_nodes(&mut nodes, self.sort_by);
        self.nodes = Some(nodes);

        if self.selected_ids.is_empty() {
            None
        } else {
            let requested = self.selected_ids.clone();
            Some(self.set_selected_ids(&requested))
        }
    }

    /// Reconcile the selection to the nodes whose ids are in `requested`
    pub fn set_selected_ids(&mut self, requested: &[i64]) -> SelectionChange {
        let (ids, nodes) = selection::reconcile(self.nodes.as_mut(), requested);
        self.selected_ids = ids;
        let old_nodes = std::mem::replace(&mut self.selected_nodes, nodes);
        SelectionChange {
            old_nodes,
            new_nodes: self.selected_nodes.clone(),
        }
    }

    /// Externally bound selection. Reordering the same ids is not a change;
    /// before the first load the ids are kept and reconciled once nodes arrive.
    pub fn request_selected_ids(&mut self, requested: &[i64]) -> Option<SelectionChange> {
        if !selection::ids_changed(&self.selected_ids, requested) {
            return None;
        }
        if self.nodes.is_none() {
            self.selected_ids = requested.to_vec();
            return None;
        }
        Some(self.set_selected_ids(requested))
    }

    /// Selection a click on node `id` proposes
    pub fn propose_click(&self, id: i64, modifier: bool, session: &Session) -> Option<SelectionChange> {
        if self.disabled {
            return None;
        }
        let node = self.nodes.as_ref()?.iter().find(|n| n.id() == id)?;
        let new_nodes = selection::propose_click(
            &self.selected_nodes,
            node,
            self.multi_select_enabled(session),
            modifier,
        );
        Some(SelectionChange {
            old_nodes: self.selected_nodes.clone(),
            new_nodes,
        })
    }

    pub fn add_candidate(&self, lang: Option<RulesetLang>, session: &Session) -> Option<AddDetail> {
        if self.disabled || self.is_readonly(session) {
            return None;
        }
        let lang = lang.or(self.language)?;
        add_candidate(&self.config, lang, self.global, session.effective_realm())
    }

    pub fn copy_candidate(&self, session: &Session) -> Option<AddDetail> {
        if self.disabled || self.is_readonly(session) || self.selected_nodes.len() != 1 {
            return None;
        }
        copy_candidate(&self.config, &self.selected_nodes[0].ruleset)
    }

    pub fn delete_candidates(&self, session: &Session) -> Vec<Ruleset> {
        if self.disabled || self.is_readonly(session) {
            return Vec::new();
        }
        self.selected_nodes.iter().map(|n| n.ruleset.clone()).collect()
    }
}

/// Rule list widget logic bound to a client, a listener and host dialogs
pub struct RuleList<C, L = AllowAll, D = AllowAll> {
    client: C,
    listener: L,
    dialogs: D,
    session: Rc<RefCell<Session>>,
    state: RefCell<RuleListState>,
}

impl<C, L, D> RuleList<C, L, D>
where
    C: RulesClient,
    L: RuleListListener,
    D: Dialogs,
{
    pub fn new(client: C, listener: L, dialogs: D, session: Rc<RefCell<Session>>, config: RulesConfig) -> Self {
        let mut state = RuleListState::new(config);
        state.update_language(&session.borrow());
        Self {
            client,
            listener,
            dialogs,
            session,
            state: RefCell::new(state),
        }
    }

    pub fn state(&self) -> Ref<'_, RuleListState> {
        self.state.borrow()
    }

    /// Apply a synchronous edit to the state and tell the listener
    pub fn update(&self, f: impl FnOnce(&mut RuleListState, &Session)) {
        {
            let session = self.session.borrow();
            f(&mut self.state.borrow_mut(), &session);
        }
        self.listener.state_changed();
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn session(&self) -> &Rc<RefCell<Session>> {
        &self.session
    }

    /// Fetch rulesets for the current realm and scope. On failure the
    /// previous nodes are kept.
    pub async fn load(&self) -> Result<()> {
        let (global, query, realm) = {
            let session = self.session.borrow();
            let state = self.state.borrow();
            (
                state.global,
                state.query(&session),
                session.effective_realm().to_string(),
            )
        };

        let result = if global {
            self.client.list_global_rulesets(&query).await
        } else {
            self.client.list_tenant_rulesets(&realm, &query).await
        };

        match result {
            Ok(rulesets) => {
                tracing::debug!(realm = %realm, global, count = rulesets.len(), "loaded rulesets");
                let change = self.state.borrow_mut().set_rulesets(rulesets);
                if let Some(change) = change {
                    self.listener.selection_changed(&change);
                }
                self.listener.state_changed();
                Ok(())
            }
            Err(e) => {
                tracing::error!(realm = %realm, global, error = %e, "failed to load rulesets");
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> Result<()> {
        self.load().await
    }

    /// Discard the nodes and refetch; called when the displayed realm changes
    pub async fn realm_changed(&self) -> Result<()> {
        self.update(|state, _| state.clear());
        self.load().await
    }

    /// Bound `selected_ids` input
    pub fn select(&self, ids: &[i64]) {
        let change = self.state.borrow_mut().request_selected_ids(ids);
        if let Some(change) = change {
            self.listener.selection_changed(&change);
            self.listener.state_changed();
        }
    }

    /// Node click; returns true when the proposed selection was allowed
    pub async fn click(&self, id: i64, modifier: bool) -> bool {
        let proposal = {
            let session = self.session.borrow();
            self.state.borrow().propose_click(id, modifier, &session)
        };
        let Some(proposal) = proposal else {
            return false;
        };

        let answer = self.listener.request_selection(proposal).await;
        if !answer.allow {
            return false;
        }
        self.select(&answer.detail.new_ids());
        true
    }

    pub fn set_sort(&self, key: SortKey) {
        self.update(|state, _| state.set_sort(key));
    }

    /// Toggle global rules; only super users can leave tenant scope
    pub async fn set_global(&self, global: bool) -> Result<()> {
        if global && !self.session.borrow().is_super_user() {
            return Ok(());
        }
        self.update(|state, session| state.set_global(global, session));
        self.load().await
    }

    pub async fn add(&self, lang: Option<RulesetLang>) -> bool {
        let candidate = {
            let session = self.session.borrow();
            self.state.borrow().add_candidate(lang, &session)
        };
        match candidate {
            Some(detail) => self.dispatch_add(detail).await,
            None => false,
        }
    }

    /// Copy the single selected ruleset
    pub async fn copy(&self) -> bool {
        let candidate = {
            let session = self.session.borrow();
            self.state.borrow().copy_candidate(&session)
        };
        match candidate {
            Some(detail) => self.dispatch_add(detail).await,
            None => false,
        }
    }

    async fn dispatch_add(&self, detail: AddDetail) -> bool {
        let answer = self.listener.request_add(detail).await;
        if !answer.allow {
            return false;
        }
        self.listener.added(answer.detail).await;
        true
    }

    /// Delete the selected rulesets after the host allowed and the user
    /// confirmed it. Always reloads once the batch has run.
    pub async fn delete(&self) -> Option<DeleteOutcome> {
        let rulesets = {
            let session = self.session.borrow();
            self.state.borrow().delete_candidates(&session)
        };
        if rulesets.is_empty() {
            return None;
        }

        let answer = self.listener.request_delete(rulesets).await;
        if !answer.allow || answer.detail.is_empty() {
            return None;
        }

        if !self
            .dialogs
            .confirm("Delete", "Are you sure you want to delete the selected rules?")
            .await
        {
            return None;
        }

        self.update(|state, _| state.set_disabled(true));
        let config = self.state.borrow().config.clone();
        let outcome = delete_rulesets(&self.client, &config, &answer.detail).await;

        if outcome.has_failures() {
            self.dialogs.error("Failed to delete one or more rules");
        }

        self.update(|state, _| state.set_disabled(false));
        // A failed reload is already logged; the outcome still stands
        let _ = self.load().await;
        Some(outcome)
    }
}
