///! Selection bookkeeping for the rule list

use super::RulesetNode;

/// Mark nodes whose id is in `requested` as selected and return the ids and
/// nodes that were actually found, in node order. Ids without a node are
/// dropped.
pub(crate) fn reconcile(
    nodes: Option<&mut Vec<RulesetNode>>,
    requested: &[i64],
) -> (Vec<i64>, Vec<RulesetNode>) {
    let mut ids = Vec::new();
    let mut selected = Vec::new();

    for node in nodes.into_iter().flatten() {
        node.selected = requested.contains(&node.id());
        if node.selected {
            ids.push(node.id());
            selected.push(node.clone());
        }
    }

    (ids, selected)
}

/// True when `requested` differs from `current` by more than ordering
pub(crate) fn ids_changed(current: &[i64], requested: &[i64]) -> bool {
    if current.len() != requested.len() {
        return true;
    }
    requested.iter().any(|id| !current.contains(id))
}

/// Selection that a click on `clicked` would produce.
///
/// With multi-select and a modifier key the click toggles `clicked`, except
/// that the last selected node can't be toggled off. Any other click selects
/// only `clicked`.
pub(crate) fn propose_click(
    selected: &[RulesetNode],
    clicked: &RulesetNode,
    multi_select: bool,
    modifier: bool,
) -> Vec<RulesetNode> {
    if !(multi_select && modifier) {
        return vec![clicked.clone()];
    }

    let index = selected.iter().position(|n| n.id() == clicked.id());
    match index {
        Some(i) if selected.len() > 1 => {
            let mut nodes = selected.to_vec();
            nodes.remove(i);
            nodes
        }
        Some(_) => selected.to_vec(),
        None => {
            let mut nodes = selected.to_vec();
            nodes.push(clicked.clone());
            nodes
        }
    }
}
