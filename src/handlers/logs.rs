use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use std::time::Duration;

use super::AppState;
use crate::{observability::LogEntry, throttler::ThrottleStats};

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub total: usize,
    pub logs: Vec<LogEntry>,
}

/// GET /api/logs - current log, newest first
pub async fn list_logs(State(state): State<AppState>) -> Json<LogsResponse> {
    let snapshot = state.studio.logs().snapshot();
    Json(LogsResponse {
        total: snapshot.len(),
        logs: snapshot.to_vec(),
    })
}

/// GET /api/logs/stream - one `logs` event with the full snapshot on connect
/// and after every change
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (receiver, subscription) = state.studio.logs().watch();
    let mut shutdown = state.shutdown.subscribe();

    tracing::debug!(
        listeners = state.studio.logs().listener_count(),
        "Log stream client connected"
    );

    let events = stream::unfold(
        (receiver, subscription, true),
        |(mut receiver, subscription, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            let snapshot = receiver.borrow_and_update().clone();
            let event = Event::default().event("logs").json_data(&*snapshot);
            Some((event, (receiver, subscription, false)))
        },
    )
    .take_until(async move {
        let _ = shutdown.recv().await;
    });

    Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

/// GET /api/throttle - gate occupancy
pub async fn throttle_stats(State(state): State<AppState>) -> Json<ThrottleStats> {
    Json(state.studio.throttler().stats())
}
