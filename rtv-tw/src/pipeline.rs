//! Load pipeline: acquisition through ready-to-serve tree
//!
//! Orchestrates acquire -> inflate -> parse -> assign ids -> propagate
//! distributions -> flatten, emitting status and progress events
//! throughout. The terminal shape depends on the processing mode: lazy
//! yields a query session over the flattened store, eager yields the
//! fully merged and propagated nested tree.

use rtv_common::cache::PayloadCache;
use rtv_common::config::{ProcessingMode, TreeConfig};
use rtv_common::events::{EventBus, TreeEvent};
use rtv_common::node::{wire, Node};
use rtv_common::Result;
use tracing::{debug, info};

use crate::session::TreeSession;
use crate::tree::{distribution, flatten, ids, merge};
use crate::{fetch, inflate};

/// Outcome of a completed load, per processing mode
pub enum LoadOutcome {
    /// Lazy mode: an id-indexed session ready for on-demand queries
    Lazy(TreeSession),
    /// Eager mode: the whole tree, merged and propagated, handed over at
    /// once
    Eager { tree: Node, node_count: u64 },
}

/// Run the full load pipeline for `url`.
///
/// Any stage failure is terminal: the error propagates and no partial
/// tree escapes. There are no retries here; retry policy belongs to the
/// caller.
pub async fn load_tree(
    cache: &PayloadCache,
    url: &str,
    config: &TreeConfig,
    events: &EventBus,
) -> Result<LoadOutcome> {
    let payload = fetch::fetch_payload(cache, url, events).await?;

    events.emit(TreeEvent::status("(1/3) loading data..."));
    let text = inflate::inflate_to_string(&payload, events)?;
    debug!("Decompressed {} bytes of JSON", text.len());

    events.emit(TreeEvent::status("(2/3) computing node tree..."));
    // parsing has no incremental progress; show a midpoint while it runs
    events.emit(TreeEvent::progress(0.45));
    let mut root = wire::decode_tree(&text)?;
    events.emit(TreeEvent::progress(1.0));

    let node_count = ids::assign_ids(&mut root);
    info!("Parsed tree with {} nodes", node_count);

    events.emit(TreeEvent::status("(3/3) computing response distributions..."));
    distribution::propagate(&mut root, node_count, events);

    let mut store = flatten::flatten(&root);

    match config.mode {
        ProcessingMode::Lazy => Ok(LoadOutcome::Lazy(TreeSession::new(
            store,
            node_count,
            config.cutoff,
            config.sentinel.clone(),
        ))),
        ProcessingMode::Eager => {
            merge::collapse_subtree(&mut store, root.id, config.cutoff);
            let tree = flatten::reconstruct(&store, root.id)?;
            Ok(LoadOutcome::Eager { tree, node_count })
        }
    }
}
