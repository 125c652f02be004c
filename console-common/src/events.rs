//! Cancellable request/response events
//!
//! Widgets propose a change, hand it to the embedding page, and only commit
//! when the page allows it. The page may also hand back a replacement payload.

use async_trait::async_trait;
use std::rc::Rc;

use crate::rule_list::RulesetNode;
use crate::rules::Ruleset;

/// Answer to a cancellable request
#[derive(Debug, Clone, PartialEq)]
pub struct Cancellable<T> {
    pub allow: bool,
    pub detail: T,
}

impl<T> Cancellable<T> {
    pub fn allow(detail: T) -> Self {
        Self { allow: true, detail }
    }

    pub fn deny(detail: T) -> Self {
        Self { allow: false, detail }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionChange {
    pub old_nodes: Vec<RulesetNode>,
    pub new_nodes: Vec<RulesetNode>,
}

impl SelectionChange {
    pub fn new_ids(&self) -> Vec<i64> {
        self.new_nodes.iter().map(RulesetNode::id).collect()
    }
}

/// Payload of add and copy requests
#[derive(Debug, Clone, PartialEq)]
pub struct AddDetail {
    pub ruleset: Ruleset,
    pub source_ruleset: Option<Ruleset>,
    pub is_copy: bool,
}

/// Events the rule list sends to its embedding page. Every method has an
/// allow-everything default.
#[async_trait(?Send)]
pub trait RuleListListener {
    async fn request_selection(&self, change: SelectionChange) -> Cancellable<SelectionChange> {
        Cancellable::allow(change)
    }

    fn selection_changed(&self, _change: &SelectionChange) {}

    async fn request_add(&self, detail: AddDetail) -> Cancellable<AddDetail> {
        Cancellable::allow(detail)
    }

    /// An add or copy went through; the page is expected to open or save it
    async fn added(&self, _detail: AddDetail) {}

    async fn request_delete(&self, rulesets: Vec<Ruleset>) -> Cancellable<Vec<Ruleset>> {
        Cancellable::allow(rulesets)
    }

    /// Widget state changed and should be redrawn
    fn state_changed(&self) {}
}

/// Modal dialogs owned by the host
#[async_trait(?Send)]
pub trait Dialogs {
    async fn confirm(&self, title: &str, message: &str) -> bool;

    fn error(&self, message: &str);
}

#[async_trait(?Send)]
impl<T: RuleListListener + ?Sized> RuleListListener for Rc<T> {
    async fn request_selection(&self, change: SelectionChange) -> Cancellable<SelectionChange> {
        (**self).request_selection(change).await
    }

    fn selection_changed(&self, change: &SelectionChange) {
        (**self).selection_changed(change)
    }

    async fn request_add(&self, detail: AddDetail) -> Cancellable<AddDetail> {
        (**self).request_add(detail).await
    }

    async fn added(&self, detail: AddDetail) {
        (**self).added(detail).await
    }

    async fn request_delete(&self, rulesets: Vec<Ruleset>) -> Cancellable<Vec<Ruleset>> {
        (**self).request_delete(rulesets).await
    }

    fn state_changed(&self) {
        (**self).state_changed()
    }
}

#[async_trait(?Send)]
impl<T: Dialogs + ?Sized> Dialogs for Rc<T> {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        (**self).confirm(title, message).await
    }

    fn error(&self, message: &str) {
        (**self).error(message)
    }
}

/// Listener and dialogs that approve everything; errors go to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait(?Send)]
impl RuleListListener for AllowAll {}

#[async_trait(?Send)]
impl Dialogs for AllowAll {
    async fn confirm(&self, _title: &str, _message: &str) -> bool {
        true
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
