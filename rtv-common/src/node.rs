//! Tree node data model and wire decoding
//!
//! The in-memory shape is always the canonical [`Node`]; the `wire` module
//! decodes the serialized input format (which still contains a legacy
//! single-letter field encoding) into it before anything else touches the
//! tree.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Node identifier assigned by preorder traversal; stable for the lifetime
/// of the loaded tree.
pub type NodeId = u64;

/// Outcome-likelihood estimate beneath a node
///
/// Weights are non-negative; absent fields decode as 0. The sum is
/// best-effort near 1 after normalization, never forced to exactly 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseDistribution {
    #[serde(default)]
    pub yes: f64,
    #[serde(default)]
    pub no: f64,
    #[serde(default)]
    pub maybe: f64,
}

/// A node of the nested response tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Preorder-assigned id (0 until the assigner has run)
    #[serde(default)]
    pub id: NodeId,
    /// Token text, or a span of concatenated tokens after chain merging
    pub value: String,
    /// Conditional probability of this node given its parent, in [0, 1]
    pub prob: f64,
    /// Cumulative probability of reaching this node from the root
    pub total_prob: f64,
    /// Distance from root (display-only, taken verbatim from the input)
    #[serde(default)]
    pub depth: u64,
    /// Edge label -> child; empty means leaf
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub next: BTreeMap<String, Node>,
    /// Set on leaves by the input, on internal nodes by propagation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_distribution: Option<ResponseDistribution>,
}

impl Node {
    /// True if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.next.is_empty()
    }
}

/// A node record in the flattened store: children are ids, not nested nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatNode {
    pub id: NodeId,
    pub value: String,
    pub prob: f64,
    pub total_prob: f64,
    pub depth: u64,
    /// Edge label -> child id; every referenced id exists in the store
    #[serde(default)]
    pub next: BTreeMap<String, NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_distribution: Option<ResponseDistribution>,
}

impl FlatNode {
    /// True if this record has no children
    pub fn is_leaf(&self) -> bool {
        self.next.is_empty()
    }
}

/// The id-indexed store: the authoritative representation for on-demand
/// queries
pub type FlatTree = HashMap<NodeId, FlatNode>;

pub mod wire {
    //! Input decoding for the serialized tree
    //!
    //! The serialized format is a union of two per-node encodings: the
    //! canonical field names, and a legacy single-letter encoding
    //! (`v`/`r`/`p`/`t`/`n`) left over from an abandoned compression
    //! experiment in the upstream data. Both decode to the canonical
    //! [`Node`] here, so nothing downstream knows the legacy names existed.
    //! The legacy arm exists for backward compatibility with already
    //! published payloads only.

    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::{Node, ResponseDistribution};
    use crate::Result;

    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    enum RawNode {
        Canonical(CanonicalNode),
        Legacy(LegacyNode),
    }

    #[derive(Debug, Deserialize)]
    struct CanonicalNode {
        value: String,
        prob: f64,
        total_prob: f64,
        #[serde(default)]
        depth: u64,
        #[serde(default)]
        next: BTreeMap<String, RawNode>,
        #[serde(default)]
        response_distribution: Option<ResponseDistribution>,
    }

    /// Legacy encoding: `depth` was never shortened, only the five
    /// canonical names were
    #[derive(Debug, Deserialize)]
    struct LegacyNode {
        v: String,
        p: f64,
        t: f64,
        #[serde(default)]
        depth: u64,
        #[serde(default)]
        n: BTreeMap<String, RawNode>,
        #[serde(default)]
        r: Option<ResponseDistribution>,
    }

    impl From<RawNode> for Node {
        fn from(raw: RawNode) -> Self {
            match raw {
                RawNode::Canonical(c) => Node {
                    id: 0,
                    value: c.value,
                    prob: c.prob,
                    total_prob: c.total_prob,
                    depth: c.depth,
                    next: convert_children(c.next),
                    response_distribution: c.response_distribution,
                },
                RawNode::Legacy(l) => Node {
                    id: 0,
                    value: l.v,
                    prob: l.p,
                    total_prob: l.t,
                    depth: l.depth,
                    next: convert_children(l.n),
                    response_distribution: l.r,
                },
            }
        }
    }

    fn convert_children(raw: BTreeMap<String, RawNode>) -> BTreeMap<String, Node> {
        raw.into_iter().map(|(k, v)| (k, Node::from(v))).collect()
    }

    /// Decode a serialized tree into the canonical in-memory shape
    pub fn decode_tree(json: &str) -> Result<Node> {
        let raw: RawNode = serde_json::from_str(json)?;
        Ok(Node::from(raw))
    }

}
