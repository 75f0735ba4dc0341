//! Preorder identifier assignment

use rtv_common::node::{Node, NodeId};

/// Assign preorder ids to every node and return the total node count.
///
/// The root gets id 0; children are visited depth-first in `next` key
/// order. Ids are never reassigned once set, and every other component
/// (flattener, query engine) references nodes purely by these ids, so this
/// must run before anything else touches the tree.
pub fn assign_ids(root: &mut Node) -> u64 {
    let mut next_id: NodeId = 0;
    assign(root, &mut next_id);
    next_id
}

fn assign(node: &mut Node, next_id: &mut NodeId) {
    node.id = *next_id;
    *next_id += 1;
    for child in node.next.values_mut() {
        assign(child, next_id);
    }
}
