//! Cutoff-filtered child retrieval
//!
//! The only place pruning is enforced for on-demand exploration; it
//! reproduces exactly the set that eager whole-tree merging plus pruning
//! would have produced for the same subtree.

use std::collections::BTreeMap;

use rtv_common::node::{FlatNode, FlatTree, NodeId};
use rtv_common::{Error, Result};

use super::merge;

/// The cutoff-surviving children of `node_id`, each lazily chain-collapsed.
///
/// Every candidate child is first folded (mutating the store, so later
/// lookups see the merged record), then included if its `prob` clears the
/// cutoff or its value is the sentinel end marker, which is always shown
/// no matter how improbable. Returns the parent record as stored alongside
/// the children.
pub fn children_of(
    store: &mut FlatTree,
    node_id: NodeId,
    cutoff: f64,
    sentinel: &str,
) -> Result<(FlatNode, BTreeMap<String, FlatNode>)> {
    let parent = store
        .get(&node_id)
        .cloned()
        .ok_or(Error::NodeNotFound(node_id))?;

    let mut children = BTreeMap::new();
    for (label, child_id) in &parent.next {
        merge::collapse_chain(store, *child_id, cutoff);
        let Some(child) = store.get(child_id) else {
            continue;
        };
        if child.prob > cutoff || child.value == sentinel {
            children.insert(label.clone(), child.clone());
        }
    }

    Ok((parent, children))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtv_common::config::DEFAULT_SENTINEL;
    use std::collections::BTreeMap as Map;

    const CUTOFF: f64 = 0.09;

    fn flat(id: NodeId, value: &str, prob: f64, children: &[(&str, NodeId)]) -> FlatNode {
        FlatNode {
            id,
            value: value.to_string(),
            prob,
            total_prob: prob,
            depth: 0,
            next: children
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<Map<_, _>>(),
            response_distribution: None,
        }
    }

    fn store_of(nodes: Vec<FlatNode>) -> FlatTree {
        nodes.into_iter().map(|n| (n.id, n)).collect()
    }

    #[test]
    fn test_unknown_node_errors() {
        let mut store = store_of(vec![flat(0, "r", 1.0, &[])]);
        assert!(matches!(
            children_of(&mut store, 42, CUTOFF, DEFAULT_SENTINEL),
            Err(Error::NodeNotFound(42))
        ));
    }

    #[test]
    fn test_cutoff_excludes_improbable_children() {
        let mut store = store_of(vec![
            flat(0, "r", 1.0, &[("0", 1), ("1", 2)]),
            flat(1, "a", 0.9, &[]),
            flat(2, "b", 0.05, &[]),
        ]);

        let (_, children) = children_of(&mut store, 0, CUTOFF, DEFAULT_SENTINEL).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children["0"].value, "a");
    }

    #[test]
    fn test_sentinel_survives_any_cutoff() {
        let mut store = store_of(vec![
            flat(0, "r", 1.0, &[("0", 1), ("1", 2)]),
            flat(1, "a", 0.9, &[]),
            flat(2, DEFAULT_SENTINEL, 0.05, &[]),
        ]);

        let (_, children) = children_of(&mut store, 0, CUTOFF, DEFAULT_SENTINEL).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children["1"].value, DEFAULT_SENTINEL);
    }

    #[test]
    fn test_children_are_lazily_merged() {
        // child 1 heads a chain a -> b -> c
        let mut store = store_of(vec![
            flat(0, "r", 1.0, &[("0", 1), ("1", 4)]),
            flat(1, "a", 0.6, &[("0", 2)]),
            flat(2, "b", 0.95, &[("0", 3)]),
            flat(3, "c", 1.0, &[]),
            flat(4, "d", 0.4, &[]),
        ]);

        let (_, children) = children_of(&mut store, 0, CUTOFF, DEFAULT_SENTINEL).unwrap();
        assert_eq!(children["0"].value, "abc");
        assert_eq!(children["0"].prob, 0.6);
        assert!(children["0"].is_leaf());

        // the merge is memoized in the store
        assert_eq!(store[&1].value, "abc");
    }

    #[test]
    fn test_parent_record_is_echoed_unmerged() {
        let mut store = store_of(vec![
            flat(0, "r", 1.0, &[("0", 1)]),
            flat(1, "a", 0.6, &[("0", 2)]),
            flat(2, "b", 1.0, &[]),
        ]);

        let (parent, _) = children_of(&mut store, 0, CUTOFF, DEFAULT_SENTINEL).unwrap();
        assert_eq!(parent.value, "r");
        assert_eq!(parent.next.len(), 1);
    }

    #[test]
    fn test_matches_eager_merge_and_prune() {
        let build = || {
            store_of(vec![
                flat(0, "r", 1.0, &[("0", 1), ("1", 3), ("2", 5)]),
                flat(1, "a", 0.6, &[("0", 2)]),
                flat(2, "b", 1.0, &[]),
                flat(3, "c", 0.3, &[("0", 4)]),
                flat(4, "d", 0.9, &[]),
                flat(5, "e", 0.02, &[]),
            ])
        };

        // eager: collapse whole tree, then prune by hand
        let mut eager = build();
        crate::tree::merge::collapse_subtree(&mut eager, 0, CUTOFF);
        let eager_children: Vec<String> = eager[&0]
            .next
            .values()
            .filter_map(|id| eager.get(id))
            .filter(|c| c.prob > CUTOFF)
            .map(|c| c.value.clone())
            .collect();

        // lazy: single query
        let mut lazy = build();
        let (_, children) = children_of(&mut lazy, 0, CUTOFF, DEFAULT_SENTINEL).unwrap();
        let lazy_children: Vec<String> = children.values().map(|c| c.value.clone()).collect();

        assert_eq!(eager_children, lazy_children);
        assert_eq!(lazy_children, vec!["ab".to_string(), "cd".to_string()]);
    }
}
