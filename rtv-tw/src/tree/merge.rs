//! Single-child chain collapsing
//!
//! A run of nodes that each have exactly one cutoff-surviving child reads
//! as one long token span, so it is folded into a single node. There is
//! one folding rule, applied either to a single store record on demand
//! ([`collapse_chain`]) or to a whole subtree up front
//! ([`collapse_subtree`]); both scopes produce identical merged nodes for
//! a given record.
//!
//! Folding assumes text-valued nodes; the behavior for anything else is
//! undefined. Survivor counting uses the same global cutoff as query-time
//! filtering, so merge results derived under one cutoff are invalid under
//! another.

use rtv_common::node::{FlatTree, NodeId};

/// Ids of the cutoff-surviving children of a store record
fn surviving_child_ids(store: &FlatTree, id: NodeId, cutoff: f64) -> Vec<NodeId> {
    let Some(node) = store.get(&id) else {
        return Vec::new();
    };
    node.next
        .values()
        .filter_map(|child_id| store.get(child_id))
        .filter(|child| child.prob > cutoff)
        .map(|child| child.id)
        .collect()
}

/// Fold runs of single-surviving-child nodes into the record at `id`.
///
/// While exactly one child survives the cutoff, that child's text is
/// appended to the record's and the child's `next` replaces the record's;
/// `prob` and `total_prob` stay anchored at the chain's first node. Stops
/// once the record has zero or two-or-more survivors. Mutates the store in
/// place, so repeated calls see the already-merged result and return
/// immediately.
///
/// Note that folding drops any non-surviving siblings of the folded child
/// from `next`; they were below the cutoff and invisible anyway.
pub fn collapse_chain(store: &mut FlatTree, id: NodeId, cutoff: f64) {
    loop {
        let survivors = surviving_child_ids(store, id, cutoff);
        let &[child_id] = survivors.as_slice() else {
            break;
        };
        let Some(child) = store.get(&child_id) else {
            break;
        };
        let (child_value, child_next) = (child.value.clone(), child.next.clone());
        let Some(node) = store.get_mut(&id) else {
            break;
        };
        node.value.push_str(&child_value);
        node.next = child_next;
    }
}

/// Collapse every chain in the subtree rooted at `id`.
///
/// Applies the fold at `id`, then recurses into each remaining child.
pub fn collapse_subtree(store: &mut FlatTree, id: NodeId, cutoff: f64) {
    collapse_chain(store, id, cutoff);
    let child_ids: Vec<NodeId> = match store.get(&id) {
        Some(node) => node.next.values().copied().collect(),
        None => return,
    };
    for child_id in child_ids {
        collapse_subtree(store, child_id, cutoff);
    }
}
