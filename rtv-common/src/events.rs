//! Event types for the RTV event system
//!
//! Events are broadcast on the worker's event bus and can be serialized
//! for SSE transmission to the rendering layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::node::NodeId;

/// Tree worker event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TreeEvent {
    /// Human-readable load phase status (e.g. "(2/3) computing node tree...")
    Status {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Fractional progress of the current load phase, in [0, 1]
    Progress {
        progress: f64,
        timestamp: DateTime<Utc>,
    },

    /// Load pipeline finished; the store is ready for queries
    TreeLoaded {
        node_count: u64,
        root_id: NodeId,
        timestamp: DateTime<Utc>,
    },

    /// Load pipeline failed; no usable store exists
    LoadFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TreeEvent {
    /// Status message event stamped with the current time
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Progress fraction event stamped with the current time
    pub fn progress(progress: f64) -> Self {
        Self::Progress {
            progress,
            timestamp: Utc::now(),
        }
    }

    /// Terminal load-success event
    pub fn tree_loaded(node_count: u64, root_id: NodeId) -> Self {
        Self::TreeLoaded {
            node_count,
            root_id,
            timestamp: Utc::now(),
        }
    }

    /// Terminal load-failure event
    pub fn load_failed(error: impl std::fmt::Display) -> Self {
        Self::LoadFailed {
            error: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus for [`TreeEvent`]s
///
/// Cloning shares the underlying channel. Send errors are ignored: no
/// subscribers is a normal state.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TreeEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` undelivered events per
    /// subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event to all subscribers
    pub fn emit(&self, event: TreeEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(TreeEvent::status("loading"));
        bus.emit(TreeEvent::progress(0.5));

        match rx.recv().await.unwrap() {
            TreeEvent::Status { message, .. } => assert_eq!(message, "loading"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            TreeEvent::Progress { progress, .. } => assert_eq!(progress, 0.5),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::default();
        bus.emit(TreeEvent::progress(1.0));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(TreeEvent::progress(0.25)).unwrap();
        assert_eq!(json["type"], "Progress");
        assert_eq!(json["progress"], 0.25);
    }
}
