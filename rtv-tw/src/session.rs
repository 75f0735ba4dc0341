//! Loaded-tree session state
//!
//! A session owns the flattened store produced by the load pipeline and
//! the parameters it was derived under; all queries go through it. There
//! is no process-wide tree state: a failed or absent load simply means no
//! session exists.

use std::collections::BTreeMap;

use rtv_common::node::{FlatNode, FlatTree, NodeId};
use rtv_common::{Error, Result};

use crate::tree::query;

/// A loaded tree ready for on-demand queries
///
/// Chain-merge results are derived under `cutoff`, so a session is only
/// valid for the cutoff it was built with; changing the cutoff means
/// rebuilding the session.
#[derive(Debug)]
pub struct TreeSession {
    store: FlatTree,
    node_count: u64,
    root_id: NodeId,
    cutoff: f64,
    sentinel: String,
}

impl TreeSession {
    /// Wrap a freshly built store; the root is the preorder-first id 0
    pub fn new(store: FlatTree, node_count: u64, cutoff: f64, sentinel: String) -> Self {
        Self {
            store,
            node_count,
            root_id: 0,
            cutoff,
            sentinel,
        }
    }

    /// Total number of nodes the identifier assigner counted
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Id of the tree root
    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// The store itself, for handing the full tree to a consumer
    pub fn store(&self) -> &FlatTree {
        &self.store
    }

    /// Look up a single record by id
    pub fn get(&self, id: NodeId) -> Result<FlatNode> {
        self.store.get(&id).cloned().ok_or(Error::NodeNotFound(id))
    }

    /// The cutoff-surviving children of `id`, lazily chain-merged
    ///
    /// Mutable because the lazy merge memoizes itself into the store.
    pub fn children_of(&mut self, id: NodeId) -> Result<(FlatNode, BTreeMap<String, FlatNode>)> {
        query::children_of(&mut self.store, id, self.cutoff, &self.sentinel)
    }
}
