//! Integration tests for the worker request/reply protocol

mod helpers;

use rtv_common::config::ProcessingMode;
use rtv_common::events::TreeEvent;
use rtv_common::Error;
use rtv_tw::worker::{TreePayload, TreeWorker};

use helpers::{seeded_cache, test_config, SAMPLE_NODE_COUNT, TREE_URL};

#[tokio::test]
async fn test_query_before_load_is_store_not_ready() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));

    let result = worker.get_children(0).await;
    assert!(matches!(result, Err(Error::StoreNotReady)));
}

#[tokio::test]
async fn test_load_then_query() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));

    let payload = worker.fetch_tree(TREE_URL).await.unwrap();
    let TreePayload::Flattened(tree) = payload else {
        panic!("expected flattened tree in lazy mode");
    };
    assert_eq!(tree.len(), SAMPLE_NODE_COUNT as usize);

    let reply = worker.get_children(0).await.unwrap();
    assert_eq!(reply.node_id, 0);
    assert_eq!(reply.node.value, "The answer is");
    assert_eq!(reply.children.len(), 3);
    assert_eq!(reply.children["0"].value, " yes!");

    // repeat query sees the memoized merge, same answer
    let again = worker.get_children(0).await.unwrap();
    assert_eq!(again.children["0"].value, " yes!");
}

#[tokio::test]
async fn test_unknown_node_id_is_not_found() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));

    worker.fetch_tree(TREE_URL).await.unwrap();

    let result = worker.get_children(999).await;
    assert!(matches!(result, Err(Error::NodeNotFound(999))));
}

#[tokio::test]
async fn test_eager_mode_returns_processed_tree() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Eager, dir.path().join("cache.db")));

    let payload = worker.fetch_tree(TREE_URL).await.unwrap();
    let TreePayload::Processed(tree) = payload else {
        panic!("expected processed tree in eager mode");
    };
    assert_eq!(tree.next["0"].value, " yes!");

    // eager mode hands the whole tree over; there is no query store
    let result = worker.get_children(0).await;
    assert!(matches!(result, Err(Error::StoreNotReady)));
}

#[tokio::test]
async fn test_failed_load_leaves_no_usable_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let cache = rtv_common::cache::PayloadCache::open(&dir.path().join("cache.db"))
        .await
        .unwrap();
    cache.put(TREE_URL, b"corrupt").await.unwrap();

    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));
    let mut events = worker.subscribe_events();

    let result = worker.fetch_tree(TREE_URL).await;
    assert!(matches!(result, Err(Error::Decompression(_))));

    // queries after a failed load must not hang or return partial data
    let result = worker.get_children(0).await;
    assert!(matches!(result, Err(Error::StoreNotReady)));

    // the failure was broadcast
    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, TreeEvent::LoadFailed { .. }) {
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn test_load_broadcasts_status_progress_and_completion() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));
    let mut events = worker.subscribe_events();

    worker.fetch_tree(TREE_URL).await.unwrap();

    let mut saw_status = false;
    let mut saw_progress = false;
    let mut loaded = None;
    while let Ok(event) = events.try_recv() {
        match event {
            TreeEvent::Status { .. } => saw_status = true,
            TreeEvent::Progress { .. } => saw_progress = true,
            TreeEvent::TreeLoaded {
                node_count,
                root_id,
                ..
            } => loaded = Some((node_count, root_id)),
            TreeEvent::LoadFailed { .. } => panic!("load should not fail"),
        }
    }

    assert!(saw_status);
    assert!(saw_progress);
    assert_eq!(loaded, Some((SAMPLE_NODE_COUNT, 0)));
}

#[tokio::test]
async fn test_concurrent_queries_get_their_own_answers() {
    let (dir, cache) = seeded_cache().await;
    let worker = TreeWorker::spawn(cache, test_config(ProcessingMode::Lazy, dir.path().join("cache.db")));
    worker.fetch_tree(TREE_URL).await.unwrap();

    // issue two queries without awaiting the first's reply; each must get
    // the answer matching its own node id
    let (a, b) = tokio::join!(worker.get_children(3), worker.get_children(4));
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.node_id, 3);
    assert_eq!(b.node_id, 4);
    assert_eq!(a.node.value, " no");
    assert_eq!(b.node.value, rtv_common::config::DEFAULT_SENTINEL);
    assert!(a.children.is_empty());
    assert!(b.children.is_empty());
}
