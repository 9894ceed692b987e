/// Request log behavior as seen by subscribers
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use studio_gateway::observability::{
    Engine, LogId, LogService, LogSnapshot, LogStatus, LogUpdate, NewLogEntry,
};

fn recorder() -> (Arc<Mutex<Vec<LogSnapshot>>>, impl Fn(&LogSnapshot) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |snapshot: &LogSnapshot| {
        sink.lock().unwrap().push(snapshot.clone())
    })
}

#[test]
fn test_subscriber_sees_current_state_immediately() {
    let logs = LogService::new();
    logs.add_log(NewLogEntry::new(Engine::Logo, json!({ "prompt": "owl" })));

    let (seen, listener) = recorder();
    let _subscription = logs.subscribe(listener);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].len(), 1);
    assert_eq!(seen[0][0].engine, Engine::Logo);
}

#[test]
fn test_entries_are_newest_first_with_unique_ids() {
    let logs = LogService::new();
    let ids: Vec<LogId> = (0..4)
        .map(|i| {
            logs.add_log(NewLogEntry::new(Engine::UiMockup, json!({ "n": i })))
                .id
        })
        .collect();

    let snapshot = logs.snapshot();
    let listed: Vec<LogId> = snapshot.iter().map(|entry| entry.id).collect();
    let mut expected = ids.clone();
    expected.reverse();
    assert_eq!(listed, expected);

    let unique: HashSet<LogId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), 4);
    assert!(snapshot.iter().all(|entry| entry.status == LogStatus::Pending));
}

#[test]
fn test_every_mutation_notifies_with_full_collection() {
    let logs = LogService::new();
    let (seen, listener) = recorder();
    let _subscription = logs.subscribe(listener);

    let entry = logs.add_log(NewLogEntry::new(Engine::TryOn, json!({ "hasPerson": true })));
    assert!(logs.update_log(entry.id, LogUpdate::success("Image Generated Successfully", 840)));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_empty());
    assert_eq!(seen[1][0].status, LogStatus::Pending);
    assert_eq!(seen[2][0].status, LogStatus::Success);
    assert_eq!(seen[2][0].duration, Some(840));
    // Earlier snapshots are not rewritten by later updates.
    assert_eq!(seen[1][0].duration, None);
}

#[test]
fn test_finalized_entry_ignores_further_updates() {
    let logs = LogService::new();
    let entry = logs.add_log(NewLogEntry::new(Engine::MediaAnalysis, json!({})));

    assert!(logs.update_log(entry.id, LogUpdate::error("quota exceeded", 12)));
    assert!(!logs.update_log(entry.id, LogUpdate::success("late", 99)));

    let stored = &logs.snapshot()[0];
    assert_eq!(stored.status, LogStatus::Error);
    assert_eq!(stored.error_message.as_deref(), Some("quota exceeded"));
    assert!(stored.response_data.is_none());
}

#[test]
fn test_unknown_id_is_a_silent_no_op() {
    let logs = LogService::new();
    let existing = logs.add_log(NewLogEntry::new(Engine::Logo, json!({ "prompt": "heron" })));
    let before = logs.snapshot();

    let (seen, listener) = recorder();
    let _subscription = logs.subscribe(listener);

    assert!(!logs.update_log(LogId(existing.id.0 + 100), LogUpdate::success("nothing", 1)));

    let after = logs.snapshot();
    assert_eq!(after.len(), 1);
    assert_eq!(*after, *before);
    assert_eq!(after[0], existing);
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_unsubscribed_listener_is_not_called_again() {
    let logs = LogService::new();
    let (seen, listener) = recorder();
    let subscription = logs.subscribe(listener);
    assert_eq!(logs.listener_count(), 1);

    subscription.unsubscribe();
    assert_eq!(logs.listener_count(), 0);

    logs.add_log(NewLogEntry::new(Engine::Logo, json!({})));
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn test_listeners_run_in_registration_order() {
    let logs = LogService::new();
    let calls = Arc::new(Mutex::new(Vec::new()));

    let subscriptions: Vec<_> = ["first", "second", "third"]
        .into_iter()
        .map(|name| {
            let calls = calls.clone();
            logs.subscribe(move |_| calls.lock().unwrap().push(name))
        })
        .collect();

    calls.lock().unwrap().clear();
    logs.add_log(NewLogEntry::new(Engine::Logo, json!({})));

    assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
    drop(subscriptions);
}

#[test]
fn test_clones_share_one_log() {
    let logs = LogService::new();
    let handle = logs.clone();

    let entry = handle.add_log(NewLogEntry::new(Engine::UiMockup, json!({})));
    assert_eq!(logs.len(), 1);
    assert!(logs.update_log(entry.id, LogUpdate::success("done", 5)));
    assert_eq!(handle.snapshot()[0].status, LogStatus::Success);
}

#[tokio::test]
async fn test_watch_delivers_latest_snapshot() {
    let logs = LogService::new();
    let (mut receiver, _subscription) = logs.watch();
    assert!(receiver.borrow_and_update().is_empty());

    let entry = logs.add_log(NewLogEntry::new(Engine::Logo, json!({ "prompt": "fox" })));
    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update()[0].id, entry.id);
}

#[test]
fn test_success_update_keeps_identity_fields() {
    let logs = LogService::new();
    let created = logs.add_log(NewLogEntry::new(
        Engine::TryOn,
        json!({ "prompt": "denim jacket", "hasPerson": true, "hasProduct": true }),
    ));

    assert!(logs.update_log(created.id, LogUpdate::success("Image Generated Successfully", 2300)));

    let stored = &logs.snapshot()[0];
    assert_eq!(stored.id, created.id);
    assert_eq!(stored.timestamp, created.timestamp);
    assert_eq!(stored.engine, created.engine);
    assert_eq!(stored.request_data, created.request_data);
    assert_eq!(stored.status, LogStatus::Success);
    assert_eq!(stored.response_data, Some(json!("Image Generated Successfully")));
    assert_eq!(stored.duration, Some(2300));
    assert!(stored.error_message.is_none());
}
