//! End-to-end behaviour of the broker under concurrency and timing

use queuestack_test::{wait_until, TestBroker, WAIT_TIMEOUT_SECS};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

fn md5_hello() -> &'static str {
    "5d41402abc4b2a76b9719d911017c592"
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_yields_one_queue() {
    let broker = TestBroker::start();
    let db = broker.shared();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let db = Arc::clone(&db);
            tokio::task::spawn_blocking(move || {
                db.create_queue("contended", db.default_queue_attributes())
                    .map(|q| q.url)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        if let Some(url) = handle.await.unwrap() {
            winners.push(url);
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(broker.counters().queues_created, 1);

    // Every caller's later lookup agrees on the winning URL
    let url = db.get_queue_by_name("contended").unwrap().url;
    assert_eq!(url, winners[0]);
    assert_eq!(db.get_queue_by_url(&url).unwrap().name, "contended");
    assert_eq!(db.list_queues(Some("contended")).len(), 1);
}

#[tokio::test]
async fn test_send_receive_delete_round_trip() {
    let broker = TestBroker::start();
    let url = broker.queue("round-trip");
    broker.send(&url, "hello");

    let received = broker.db().receive_messages(&url, 1, None);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].md5_of_body, md5_hello());
    assert_eq!(received[0].receive_count, 1);

    let handle = received[0].receipt_handle.clone().unwrap();
    assert!(broker.db().delete_message(&handle).is_some());
    assert!(broker.db().receive_messages(&url, 1, None).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_visibility_timeout_redelivery() {
    let broker = TestBroker::start();
    let url = broker.queue("redelivery");
    broker.send(&url, "hello");

    let first = broker.db().receive_messages(&url, 1, Some(1)).remove(0);
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let second = broker.db().receive_messages(&url, 1, None).remove(0);

    assert_eq!(second.message_id, first.message_id);
    assert_eq!(second.receive_count, 2);
    assert_ne!(second.receipt_handle, first.receipt_handle);
    assert_eq!(broker.counters().messages_redelivered, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_delivery() {
    let broker = TestBroker::start();
    let db = broker.shared();

    for round in 0..50 {
        let url = broker.queue(&format!("single-{}", round));
        broker.send(&url, "only");

        let receivers: Vec<_> = (0..2)
            .map(|_| {
                let db = Arc::clone(&db);
                let url = url.clone();
                tokio::task::spawn_blocking(move || db.receive_messages(&url, 1, None))
            })
            .collect();

        let mut delivered = 0;
        for receiver in receivers {
            delivered += receiver.await.unwrap().len();
        }
        assert_eq!(delivered, 1, "round {}", round);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_receivers_split_messages() {
    let broker = TestBroker::start();
    let db = broker.shared();
    let url = broker.queue("fan-out");

    let mut sent = HashSet::new();
    for i in 0..200 {
        sent.insert(broker.send(&url, &format!("m{}", i)).message_id);
    }

    let receivers: Vec<_> = (0..8)
        .map(|_| {
            let db = Arc::clone(&db);
            let url = url.clone();
            tokio::task::spawn_blocking(move || {
                let mut ids = Vec::new();
                loop {
                    let batch = db.receive_messages(&url, 10, Some(60));
                    if batch.is_empty() {
                        return ids;
                    }
                    ids.extend(batch.into_iter().map(|m| m.message_id));
                }
            })
        })
        .collect();

    let mut received = Vec::new();
    for receiver in receivers {
        received.extend(receiver.await.unwrap());
    }

    let unique: HashSet<String> = received.iter().cloned().collect();
    assert_eq!(received.len(), 200);
    assert_eq!(unique, sent);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_send_is_invisible_until_due() {
    let broker = TestBroker::start();
    let url = broker.queue("delayed");

    broker
        .db()
        .send_message(&url, "later".to_string(), HashMap::new(), Some(2))
        .unwrap();
    assert!(broker.db().receive_messages(&url, 1, None).is_empty());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(broker.db().receive_messages(&url, 1, None).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_purge_preserves_in_flight() {
    let broker = TestBroker::start();
    let url = broker.queue("purge");
    broker.send(&url, "first");
    broker.send(&url, "second");

    let in_flight = broker.db().receive_messages(&url, 1, Some(1)).remove(0);
    assert!(broker.db().purge_queue(&url));

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let again = broker.db().receive_messages(&url, 10, Some(60));
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].message_id, in_flight.message_id);
    assert_eq!(again[0].body, "first");

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(broker.db().receive_messages(&url, 10, None).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_races_visibility_expiry() {
    let broker = TestBroker::start();
    let db = broker.shared();
    let url = broker.queue("race");

    for i in 0..100 {
        broker.send(&url, &format!("m{}", i));
    }

    // Zero visibility: every timer fires right away and races the deletes below
    let received = db.receive_messages(&url, 100, Some(0));
    let deleted = received
        .iter()
        .filter_map(|m| m.receipt_handle.as_deref())
        .filter(|h| db.delete_message(h).is_some())
        .count();

    // Each delivery ends exactly once: deleted, or returned to the queue
    wait_until(Duration::from_secs(WAIT_TIMEOUT_SECS), || {
        let depth = db.queue_depth(&url)?;
        (depth.in_flight == 0 && depth.visible + deleted == 100).then_some(())
    })
    .await
    .unwrap();

    assert_eq!(broker.counters().in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_change_visibility_races_expiry() {
    let broker = TestBroker::start();
    let db = broker.shared();
    let url = broker.queue("extend-race");

    for i in 0..100 {
        broker.send(&url, &format!("m{}", i));
    }

    let received = db.receive_messages(&url, 100, Some(0));
    let extended: Vec<String> = received
        .iter()
        .filter_map(|m| m.receipt_handle.clone())
        .filter(|h| db.change_message_visibility(h, 600).is_some())
        .collect();

    wait_until(Duration::from_secs(WAIT_TIMEOUT_SECS), || {
        let depth = db.queue_depth(&url)?;
        (depth.in_flight == extended.len() && depth.visible + extended.len() == 100)
            .then_some(())
    })
    .await
    .unwrap();

    // Extended deliveries are still owned by their handles
    for handle in &extended {
        assert!(db.delete_message(handle).is_some());
    }
}
