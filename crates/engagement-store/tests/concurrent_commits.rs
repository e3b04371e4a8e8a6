//! Concurrent commit and subscription integration tests

use engagement_core::{compute_transition, EngagementTarget, Status, StatusSet};
use engagement_store::{MemoryStore, MemoryStoreConfig, StatusStore, StatusWrite, StoreError};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// Read-compute-write with retry on compare-and-swap failure
async fn select(store: &MemoryStore, target: &str, user: &str, label: &str) -> EngagementTarget {
    loop {
        let snapshot = store.get_snapshot(target).await.expect("snapshot");
        let current = snapshot.status_of(user).cloned();
        let t = compute_transition(current.as_ref(), &Status::from(label));
        match store
            .apply_atomic(target, user, StatusWrite::new(current, t.new_status), t.count_deltas)
            .await
        {
            Ok(committed) => return committed,
            Err(StoreError::Conflict { .. }) => continue,
            Err(e) => panic!("unexpected store error: {e}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_users_never_lose_increments() {
    let store = Arc::new(MemoryStore::new());
    store.create_target("evt", &StatusSet::attendance()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let user = format!("user-{i}");
            let label = if i % 2 == 0 { "going" } else { "interested" };
            select(&store, "evt", &user, label).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = store.get_snapshot("evt").await.unwrap();
    assert_eq!(snapshot.count("going"), 25);
    assert_eq!(snapshot.count("interested"), 25);
    assert_eq!(snapshot.version, 50);
    snapshot.verify_consistency().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_switches_stay_consistent() {
    let store = Arc::new(MemoryStore::with_config(MemoryStoreConfig::with_latency(1)));
    store.create_target("evt", &StatusSet::attendance()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let user = format!("user-{i}");
            // going, interested, going: ends on going
            for label in ["going", "interested", "going"] {
                select(&store, "evt", &user, label).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = store.get_snapshot("evt").await.unwrap();
    assert_eq!(snapshot.count("going"), 10);
    assert_eq!(snapshot.count("interested"), 0);
    snapshot.verify_consistency().unwrap();
}

#[tokio::test]
async fn test_subscription_yields_current_then_commits() {
    let store = MemoryStore::new();
    store.create_target("post-1", &StatusSet::upvote("post")).await.unwrap();

    let mut updates = store.subscribe("post-1").await.unwrap();
    let first = updates.next().await.unwrap();
    assert_eq!(first.version, 0);

    select(&store, "post-1", "ada", "upvoted").await;
    select(&store, "post-1", "lin", "upvoted").await;

    let second = tokio::time::timeout(Duration::from_secs(1), updates.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.count("upvoted"), 1);

    let third = updates.next().await.unwrap();
    assert_eq!(third.count("upvoted"), 2);
    assert_eq!(third.holders("upvoted"), vec!["ada", "lin"]);
}

#[tokio::test]
async fn test_delete_ends_subscription() {
    let store = MemoryStore::new();
    store.create_target("evt", &StatusSet::attendance()).await.unwrap();

    let mut updates = store.subscribe("evt").await.unwrap();
    updates.next().await.unwrap();

    store.delete_target("evt").await.unwrap();
    let end = tokio::time::timeout(Duration::from_secs(1), updates.next())
        .await
        .unwrap();
    assert!(end.is_none());

    assert!(matches!(store.get_snapshot("evt").await, Err(StoreError::NotFound(_))));
}
