// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end queue lifecycle tests against the public API only.
//!
//! Each test opens a fresh queue file in a temp directory; ids therefore
//! start at 1 and the assertions can use absolute ids.

use std::time::Duration;

use trapd_storage::{EventQueue, QueueStatus};

async fn fresh_queue() -> (EventQueue, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let queue = EventQueue::open(dir.path().join("queue.db")).await.unwrap();
    (queue, dir)
}

#[tokio::test]
async fn happy_path_enqueue_lease_ack_purge() {
    let (queue, _dir) = fresh_queue().await;

    let id = queue
        .enqueue("heartbeat", &serde_json::json!({"a": 1}))
        .await
        .unwrap();
    assert_eq!(id, 1);

    let items = queue
        .lease_batch(10, Duration::from_secs(300))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, 1);
    assert_eq!(items[0].retry_count, 0);

    queue.mark_sent(&[1]).await.unwrap();

    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.leased, 0);
    assert_eq!(stats.sent, 1);
    assert_eq!(stats.dead, 0);
    assert_eq!(stats.total, 1);

    assert_eq!(queue.delete_sent().await.unwrap(), 1);
    assert!(queue.stats().await.unwrap().is_empty());
}

#[tokio::test]
async fn crash_during_send_reclaims_whole_batch_in_order() {
    let (queue, _dir) = fresh_queue().await;
    for n in 1..=3 {
        queue
            .enqueue("heartbeat", &serde_json::json!({"n": n}))
            .await
            .unwrap();
    }

    // Claim with a short lease, then "crash": drop the lease without acking.
    let claimed = queue
        .lease_batch(10, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(claimed.len(), 3);
    drop(claimed);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let reclaimed = queue
        .lease_batch(10, Duration::from_secs(300))
        .await
        .unwrap();
    let ids: Vec<i64> = reclaimed.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(reclaimed.iter().all(|i| i.retry_count == 1));
}

#[tokio::test]
async fn partial_ack_leaves_only_the_unacked_item() {
    let (queue, _dir) = fresh_queue().await;
    for n in 1..=5 {
        queue
            .enqueue("heartbeat", &serde_json::json!({"n": n}))
            .await
            .unwrap();
    }

    let claimed = queue
        .lease_batch(10, Duration::from_millis(50))
        .await
        .unwrap();
    assert_eq!(claimed.len(), 5);

    queue.mark_sent(&[1, 3, 5]).await.unwrap();
    queue.mark_dead(&[2]).await.unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;

    let released = queue
        .lease_batch(10, Duration::from_secs(300))
        .await
        .unwrap();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].id, 4);
    assert_eq!(released[0].retry_count, 1);

    let stats = queue.stats().await.unwrap();
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.leased, 1);
    assert_eq!(stats.sent, 3);
    assert_eq!(stats.dead, 1);
    assert_eq!(stats.total, 5);
}

#[tokio::test]
async fn bounded_growth_trims_the_oldest_rows() {
    let (queue, _dir) = fresh_queue().await;
    for n in 0..1050 {
        queue
            .enqueue_raw("heartbeat", format!(r#"{{"n":{n}}}"#))
            .await
            .unwrap();
    }

    assert_eq!(queue.trim_oldest_by_count(1000).await.unwrap(), 50);
    assert_eq!(queue.pending_count().await.unwrap(), 1000);

    let items = queue.lease_batch(1, Duration::from_secs(300)).await.unwrap();
    assert_eq!(items[0].id, 51);
}

#[tokio::test]
async fn lease_column_tracks_status_through_the_lifecycle() {
    let (queue, _dir) = fresh_queue().await;
    let id = queue
        .enqueue("heartbeat", &serde_json::json!({}))
        .await
        .unwrap();

    // Pending: no lease, no retries, last_error never written.
    let item = queue.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Pending);
    assert!(item.lease_until_utc.is_none());
    assert_eq!(item.retry_count, 0);
    assert!(item.last_error.is_none());

    // Leased: lease timestamp present, sorted after the enqueue stamp.
    queue
        .lease_batch(10, Duration::from_secs(300))
        .await
        .unwrap();
    let item = queue.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Leased);
    let lease = item.lease_until_utc.expect("leased item must carry a lease");
    assert!(lease > item.created_utc);

    // Sent: terminal, lease cleared.
    queue.mark_sent(&[id]).await.unwrap();
    let item = queue.get_item(id).await.unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Sent);
    assert!(item.lease_until_utc.is_none());

    assert!(queue.get_item(9999).await.unwrap().is_none());
}

#[tokio::test]
async fn queue_contents_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.db");

    {
        let queue = EventQueue::open(&path).await.unwrap();
        queue
            .enqueue("heartbeat", &serde_json::json!({"persisted": true}))
            .await
            .unwrap();
        queue.close().await.unwrap();
    }

    let queue = EventQueue::open(&path).await.unwrap();
    assert_eq!(queue.pending_count().await.unwrap(), 1);
    let items = queue.lease_batch(10, Duration::from_secs(300)).await.unwrap();
    assert_eq!(items[0].id, 1);
    let payload: serde_json::Value = serde_json::from_str(&items[0].payload_json).unwrap();
    assert_eq!(payload["persisted"], true);
}

#[tokio::test]
async fn leases_claimed_before_restart_expire_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.db");

    {
        let queue = EventQueue::open(&path).await.unwrap();
        queue
            .enqueue("heartbeat", &serde_json::json!({}))
            .await
            .unwrap();
        queue
            .lease_batch(10, Duration::from_millis(30))
            .await
            .unwrap();
        // No ack: process "dies" here with the item leased.
    }

    tokio::time::sleep(Duration::from_millis(60)).await;

    let queue = EventQueue::open(&path).await.unwrap();
    let items = queue.lease_batch(10, Duration::from_secs(300)).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].retry_count, 1);
}
