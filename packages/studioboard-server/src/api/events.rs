use axum::{
    extract::{Query, State},
    response::{sse::Event, Json, Sse},
};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use studioboard_core::types::BoardId;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::state::AppState;

const KEEP_ALIVE: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct EventQuery {
    board: Option<BoardId>,
}

/// SSE endpoint: board change events as JSON, optionally for one board.
pub async fn sse_events(
    State(state): State<AppState>,
    Query(params): Query<EventQuery>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let event = result.ok()?;
        if params.board.is_some_and(|board| board != event.board_id()) {
            return None;
        }
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    let keep_alive = StreamExt::map(IntervalStream::new(tokio::time::interval(KEEP_ALIVE)), |_| {
        Ok(Event::default().comment("keep-alive"))
    });

    Sse::new(stream.merge(keep_alive))
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
        "bind_address": state.bind_address,
        "subscribers": state.event_tx.receiver_count(),
    }))
}

pub async fn list_logs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(),
        "filePath": crate::log_bridge::log_file_path(),
    }))
}

pub async fn stream_logs() -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = crate::log_bridge::subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|item| {
        let entry = item.ok()?;
        let payload = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(payload)))
    });
    Sse::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::app_state;

    #[tokio::test]
    async fn test_status_reports_address() {
        let state = app_state();
        let Json(body) = status(State(state)).await;
        assert_eq!(body["status"], "running");
        assert_eq!(body["bind_address"], "127.0.0.1");
    }
}
