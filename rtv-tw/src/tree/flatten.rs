//! Tree flattening and reconstruction
//!
//! The flattened store avoids holding or transferring the entire nested
//! tree in the consumer's working set at once; after flattening it is the
//! authoritative representation for the query engine.

use std::collections::BTreeMap;

use rtv_common::node::{FlatNode, FlatTree, Node, NodeId};
use rtv_common::{Error, Result};

/// Flatten an id-stamped tree into the id-indexed store.
///
/// Preorder walk; each node becomes a shallow record with `next` rewritten
/// to child ids. Every node is visited exactly once along tree edges;
/// should an id somehow be reachable twice, the last write wins.
pub fn flatten(root: &Node) -> FlatTree {
    let mut store = FlatTree::new();
    flatten_into(root, &mut store);
    store
}

fn flatten_into(node: &Node, store: &mut FlatTree) {
    store.insert(
        node.id,
        FlatNode {
            id: node.id,
            value: node.value.clone(),
            prob: node.prob,
            total_prob: node.total_prob,
            depth: node.depth,
            next: node
                .next
                .iter()
                .map(|(label, child)| (label.clone(), child.id))
                .collect(),
            response_distribution: node.response_distribution,
        },
    );
    for child in node.next.values() {
        flatten_into(child, store);
    }
}

/// Rebuild a nested tree from the store, following child ids from
/// `root_id`.
///
/// Fails with [`Error::NodeNotFound`] if any referenced id is missing,
/// which a store built by [`flatten`] never exhibits.
pub fn reconstruct(store: &FlatTree, root_id: NodeId) -> Result<Node> {
    let flat = store.get(&root_id).ok_or(Error::NodeNotFound(root_id))?;
    let mut next = BTreeMap::new();
    for (label, child_id) in &flat.next {
        next.insert(label.clone(), reconstruct(store, *child_id)?);
    }
    Ok(Node {
        id: flat.id,
        value: flat.value.clone(),
        prob: flat.prob,
        total_prob: flat.total_prob,
        depth: flat.depth,
        next,
        response_distribution: flat.response_distribution,
    })
}
