//! # RTV Tree Worker Library (rtv-tw)
//!
//! Loads a compressed response tree once, indexes it, and serves
//! cutoff-filtered subtrees on demand so the rendering layer only ever
//! materializes a bounded amount of UI at a time.
//!
//! **Purpose:** acquire and cache the serialized tree, decompress and
//! parse it, assign preorder ids, propagate response distributions
//! bottom-up, flatten into an id-indexed store, and answer child queries
//! under the probability cutoff.
//!
//! **Architecture:** a background worker task owns the loaded tree and
//! serializes all requests; progress and status events are broadcast and
//! bridged to the rendering layer over HTTP/SSE.

pub mod api;
pub mod fetch;
pub mod inflate;
pub mod pipeline;
pub mod session;
pub mod tree;
pub mod worker;

pub use session::TreeSession;
pub use worker::{TreeWorker, WorkerHandle};
