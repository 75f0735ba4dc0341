//! Background tree worker and its request/reply protocol
//!
//! The worker task owns the session outright and serializes all requests
//! through one mpsc channel, so tree mutation (lazy chain merging) needs
//! no locking. Every request carries an explicit request id that is
//! echoed in its reply, and each request gets its own oneshot reply slot;
//! two in-flight requests can never receive each other's answers.
//!
//! There is no cancellation and no timeout: an issued request runs to
//! completion or error. Liveness observability is the event stream.

use std::collections::BTreeMap;

use rtv_common::cache::PayloadCache;
use rtv_common::config::TreeConfig;
use rtv_common::events::{EventBus, TreeEvent};
use rtv_common::node::{FlatNode, FlatTree, Node, NodeId};
use rtv_common::{Error, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::pipeline::{self, LoadOutcome};
use crate::session::TreeSession;

/// Commands accepted by the worker
#[derive(Debug, Clone)]
pub enum Command {
    /// Run the load pipeline for `url`
    FetchTree { url: String },
    /// Return the cutoff-surviving children of a node
    GetChildren { node_id: NodeId },
}

/// Terminal payload of a successful request
#[derive(Debug)]
pub enum ReplyPayload {
    /// Lazy-mode load finished: the full id-indexed store
    FlattenedTree(FlatTree),
    /// Eager-mode load finished: the fully processed nested tree
    ProcessedTree(Node),
    /// Child query answered
    ChildrenFetched {
        node_id: NodeId,
        node: FlatNode,
        children: BTreeMap<String, FlatNode>,
    },
}

/// Reply envelope, correlated to its request by `request_id`
///
/// The oneshot slot already pairs request and reply at the transport
/// level; the echoed id lets protocol-level consumers (logs, wire
/// bridges) correlate as well.
#[derive(Debug)]
pub struct WorkerReply {
    pub request_id: Uuid,
    pub payload: Result<ReplyPayload>,
}

/// Request envelope: id, command, and the slot the reply goes into
#[derive(Debug)]
pub struct WorkerRequest {
    pub request_id: Uuid,
    pub command: Command,
    reply_tx: oneshot::Sender<WorkerReply>,
}

/// The terminal payload of a finished load, as seen by handle users
#[derive(Debug)]
pub enum TreePayload {
    /// Lazy mode: the id-indexed store
    Flattened(FlatTree),
    /// Eager mode: the processed nested tree
    Processed(Node),
}

/// A child-query answer, as seen by handle users
#[derive(Debug)]
pub struct ChildrenReply {
    pub node_id: NodeId,
    pub node: FlatNode,
    pub children: BTreeMap<String, FlatNode>,
}

/// Handle for issuing requests to a running worker
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    req_tx: mpsc::Sender<WorkerRequest>,
    events: EventBus,
}

impl WorkerHandle {
    /// Subscribe to the worker's status/progress event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    /// Load the tree at `url`; resolves with the terminal payload once the
    /// pipeline finishes
    pub async fn fetch_tree(&self, url: impl Into<String>) -> Result<TreePayload> {
        match self.request(Command::FetchTree { url: url.into() }).await? {
            ReplyPayload::FlattenedTree(tree) => Ok(TreePayload::Flattened(tree)),
            ReplyPayload::ProcessedTree(tree) => Ok(TreePayload::Processed(tree)),
            other => Err(Error::Internal(format!(
                "unexpected reply to FetchTree: {other:?}"
            ))),
        }
    }

    /// Query the cutoff-surviving children of `node_id`
    pub async fn get_children(&self, node_id: NodeId) -> Result<ChildrenReply> {
        match self.request(Command::GetChildren { node_id }).await? {
            ReplyPayload::ChildrenFetched {
                node_id,
                node,
                children,
            } => Ok(ChildrenReply {
                node_id,
                node,
                children,
            }),
            other => Err(Error::Internal(format!(
                "unexpected reply to GetChildren: {other:?}"
            ))),
        }
    }

    async fn request(&self, command: Command) -> Result<ReplyPayload> {
        let request_id = Uuid::new_v4();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.req_tx
            .send(WorkerRequest {
                request_id,
                command,
                reply_tx,
            })
            .await
            .map_err(|_| Error::Internal("tree worker is gone".to_string()))?;

        let reply = reply_rx
            .await
            .map_err(|_| Error::Internal("tree worker dropped the request".to_string()))?;
        debug_assert_eq!(reply.request_id, request_id);
        reply.payload
    }
}

/// The background worker: owns the session, serializes all requests
pub struct TreeWorker {
    cache: PayloadCache,
    config: TreeConfig,
    events: EventBus,
    session: Option<TreeSession>,
    req_rx: mpsc::Receiver<WorkerRequest>,
}

impl TreeWorker {
    /// Spawn the worker task; returns the handle used to reach it
    pub fn spawn(cache: PayloadCache, config: TreeConfig) -> WorkerHandle {
        let (req_tx, req_rx) = mpsc::channel(32);
        let events = EventBus::default();
        let worker = TreeWorker {
            cache,
            config,
            events: events.clone(),
            session: None,
            req_rx,
        };
        tokio::spawn(worker.run());
        WorkerHandle { req_tx, events }
    }

    async fn run(mut self) {
        info!("Tree worker started ({:?} mode)", self.config.mode);
        while let Some(request) = self.req_rx.recv().await {
            let WorkerRequest {
                request_id,
                command,
                reply_tx,
            } = request;

            let payload = self.handle(command).await;
            if let Err(e) = &payload {
                warn!("Request {} failed: {}", request_id, e);
            }
            // a dropped receiver means the caller went away; nothing to do
            let _ = reply_tx.send(WorkerReply {
                request_id,
                payload,
            });
        }
        info!("Tree worker stopped");
    }

    async fn handle(&mut self, command: Command) -> Result<ReplyPayload> {
        match command {
            Command::FetchTree { url } => {
                match pipeline::load_tree(&self.cache, &url, &self.config, &self.events).await {
                    Ok(LoadOutcome::Lazy(session)) => {
                        let tree = session.store().clone();
                        self.events
                            .emit(TreeEvent::tree_loaded(session.node_count(), session.root_id()));
                        self.session = Some(session);
                        Ok(ReplyPayload::FlattenedTree(tree))
                    }
                    Ok(LoadOutcome::Eager { tree, node_count }) => {
                        self.events.emit(TreeEvent::tree_loaded(node_count, tree.id));
                        Ok(ReplyPayload::ProcessedTree(tree))
                    }
                    Err(e) => {
                        // a failed load leaves no usable store behind
                        self.session = None;
                        self.events.emit(TreeEvent::load_failed(&e));
                        Err(e)
                    }
                }
            }
            Command::GetChildren { node_id } => {
                let session = self.session.as_mut().ok_or(Error::StoreNotReady)?;
                let (node, children) = session.children_of(node_id)?;
                Ok(ReplyPayload::ChildrenFetched {
                    node_id,
                    node,
                    children,
                })
            }
        }
    }
}
