//! In-memory request log with live subscription
//!
//! Every mutation pushes the full, newest-first collection to each registered
//! listener, synchronously and in registration order. Snapshots are shared
//! `Arc`s; the backing vector is only copied when a listener still holds the
//! previous snapshot.
//!
//! Listeners run while the log is locked, so they observe snapshots in mutation
//! order. A listener must not call back into the same `LogService`; forward the
//! snapshot (e.g. into a channel) instead.

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;

use super::entry::{LogEntry, LogId, LogStatus, LogUpdate, NewLogEntry};

/// Full log contents, newest first
pub type LogSnapshot = Arc<Vec<LogEntry>>;

type Listener = Box<dyn Fn(&LogSnapshot) + Send + Sync>;

struct LogState {
    entries: LogSnapshot,
    listeners: Vec<(u64, Listener)>,
    last_entry_id: u64,
    last_listener_id: u64,
}

impl LogState {
    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.entries);
        }
    }

    /// Entries are newest-first and ids grow with creation order, so ids are strictly descending.
    fn position(&self, id: LogId) -> Option<usize> {
        self.entries
            .binary_search_by(|probe| id.cmp(&probe.id))
            .ok()
    }
}

#[derive(Clone)]
pub struct LogService {
    state: Arc<Mutex<LogState>>,
}

impl LogService {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LogState {
                entries: Arc::new(Vec::new()),
                listeners: Vec::new(),
                last_entry_id: 0,
                last_listener_id: 0,
            })),
        }
    }

    /// Record a new pending attempt and return it, including its assigned id
    pub fn add_log(&self, new_entry: NewLogEntry) -> LogEntry {
        let mut state = self.lock();

        state.last_entry_id += 1;
        let entry = LogEntry {
            id: LogId(state.last_entry_id),
            timestamp: Utc::now().timestamp_millis(),
            engine: new_entry.engine,
            status: LogStatus::Pending,
            request_data: new_entry.request_data,
            response_data: None,
            error_message: None,
            duration: None,
        };

        Arc::make_mut(&mut state.entries).insert(0, entry.clone());

        tracing::debug!(
            log_id = %entry.id,
            engine = %entry.engine,
            total = state.entries.len(),
            "Request log entry created"
        );

        state.notify();
        entry
    }

    /// Merge `update` into the entry with `id`.
    ///
    /// Unknown ids and entries that already reached `success`/`error` are left
    /// alone and `false` is returned; this never fails.
    pub fn update_log(&self, id: LogId, update: LogUpdate) -> bool {
        let mut state = self.lock();

        let Some(position) = state.position(id) else {
            tracing::debug!(log_id = %id, "Ignoring update for unknown log entry");
            return false;
        };

        if state.entries[position].status.is_terminal() {
            tracing::debug!(
                log_id = %id,
                status = state.entries[position].status.as_str(),
                "Ignoring update for finalized log entry"
            );
            return false;
        }

        let entries = Arc::make_mut(&mut state.entries);
        update.apply(&mut entries[position]);

        state.notify();
        true
    }

    /// Register `listener`, call it once with the current collection, and
    /// return the handle that de-registers it
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&LogSnapshot) + Send + Sync + 'static,
    {
        let mut state = self.lock();

        state.last_listener_id += 1;
        let id = state.last_listener_id;

        listener(&state.entries);
        state.listeners.push((id, Box::new(listener)));

        tracing::debug!(
            listener_id = id,
            listeners = state.listeners.len(),
            "Log listener subscribed"
        );

        Subscription {
            state: Arc::downgrade(&self.state),
            id,
        }
    }

    /// Subscribe through a watch channel that always holds the latest snapshot
    pub fn watch(&self) -> (watch::Receiver<LogSnapshot>, Subscription) {
        let (sender, receiver) = watch::channel(self.snapshot());
        let subscription = self.subscribe(move |snapshot| {
            sender.send_replace(snapshot.clone());
        });
        (receiver, subscription)
    }

    pub fn snapshot(&self) -> LogSnapshot {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        lock_state(&self.state)
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_state(state: &Mutex<LogState>) -> MutexGuard<'_, LogState> {
    // A panicking listener poisons the lock after the mutation completed; the state is still whole.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registration handle returned by [`LogService::subscribe`].
///
/// The listener stays registered until the handle is dropped or
/// [`Subscription::unsubscribe`] is called.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    state: Weak<Mutex<LogState>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = lock_state(&state);
            state.listeners.retain(|(id, _)| *id != self.id);
            tracing::debug!(listener_id = self.id, "Log listener unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::entry::Engine;
    use serde_json::json;

    fn logo_entry(prompt: &str) -> NewLogEntry {
        NewLogEntry::new(Engine::Logo, json!({ "prompt": prompt }))
    }

    #[test]
    fn test_add_log_prepends_pending_entry() {
        let logs = LogService::new();
        let first = logs.add_log(logo_entry("first"));
        let second = logs.add_log(logo_entry("second"));

        let snapshot = logs.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].id, second.id);
        assert_eq!(snapshot[1].id, first.id);
        assert_eq!(second.status, LogStatus::Pending);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_lookup_finds_every_entry() {
        let logs = LogService::new();
        let ids: Vec<LogId> = (0..25)
            .map(|i| logs.add_log(logo_entry(&format!("p{}", i))).id)
            .collect();

        for id in ids {
            assert!(logs.update_log(id, LogUpdate::success("done", 1)));
        }
        assert!(logs.snapshot().iter().all(|e| e.status == LogStatus::Success));
    }

    #[test]
    fn test_terminal_entry_is_not_changed_again() {
        let logs = LogService::new();
        let entry = logs.add_log(logo_entry("mark"));

        assert!(logs.update_log(entry.id, LogUpdate::error("Failed to generate logo.", 40)));
        assert!(!logs.update_log(entry.id, LogUpdate::success("late", 90)));

        let stored = &logs.snapshot()[0];
        assert_eq!(stored.status, LogStatus::Error);
        assert_eq!(stored.duration, Some(40));
        assert!(stored.response_data.is_none());
    }

    #[test]
    fn test_old_snapshots_are_not_mutated() {
        let logs = LogService::new();
        let entry = logs.add_log(logo_entry("snap"));
        let before = logs.snapshot();

        logs.update_log(entry.id, LogUpdate::success("ok", 3));

        assert_eq!(before[0].status, LogStatus::Pending);
        assert_eq!(logs.snapshot()[0].status, LogStatus::Success);
    }

    #[test]
    fn test_clones_share_the_same_log() {
        let logs = LogService::new();
        let handle = logs.clone();
        handle.add_log(logo_entry("shared"));
        assert_eq!(logs.len(), 1);
        assert!(!logs.is_empty());
    }

    #[tokio::test]
    async fn test_watch_tracks_latest_snapshot() {
        let logs = LogService::new();
        let (mut receiver, _subscription) = logs.watch();
        assert!(receiver.borrow_and_update().is_empty());

        let entry = logs.add_log(logo_entry("watched"));
        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow_and_update()[0].id, entry.id);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let logs = LogService::new();
        let subscription = logs.subscribe(|_| {});
        assert_eq!(logs.listener_count(), 1);
        drop(subscription);
        assert_eq!(logs.listener_count(), 0);
    }
}
