use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use studioboard_core::boards;
use studioboard_core::events::BoardChangeEvent;
use studioboard_core::ordering::reconcile_board;
use studioboard_core::requests::{BulkReorderRequest, NewBoardRequest};
use studioboard_core::search::KanbanFilter;
use studioboard_core::types::{BoardId, ColumnId};

use super::{
    api_error, insert_header_safe, json_body, parsed, to_json, with_store, ApiError, ApiResult,
};
use crate::preferences::client_id;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct KanbanQuery {
    q: Option<String>,
    tag: Option<String>,
    col: Option<ColumnId>,
}

pub async fn list_boards(State(state): State<AppState>) -> ApiResult {
    let target = "studioboard.api.list_boards";
    let boards = with_store(&state, target, |store| boards::list_boards(store)).await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "boards": boards }))))
}

pub async fn create_board(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.create_board";
    let body = json_body(target, payload)?;
    let req = parsed(target, NewBoardRequest::from_value(&body))?;
    let setup = with_store(&state, target, move |store| boards::create_board(store, &req)).await?;
    state.publish(BoardChangeEvent::BoardChanged {
        board_id: setup.board.id,
    });
    Ok((StatusCode::CREATED, Json(to_json(target, &setup)?)))
}

/// GET /boards/{board_id}/kanban — columns with their ideas in display
/// order. The ETag is the SHA-256 of the response body.
pub async fn kanban(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    Query(params): Query<KanbanQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap, Json<serde_json::Value>), ApiError> {
    let target = "studioboard.api.kanban";
    let filter = KanbanFilter::new(params.q.as_deref(), params.tag.as_deref(), params.col);
    let view = with_store(&state, target, move |store| boards::kanban(store, board_id, &filter)).await?;
    state.prefs.remember_board(&client_id(&headers), board_id);

    let body = to_json(target, &view)?;
    let bytes = serde_json::to_vec(&body).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            target,
            format!("failed to encode kanban view: {}", e),
        )
    })?;
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&bytes)));

    let mut resp_headers = HeaderMap::new();
    insert_header_safe(&mut resp_headers, header::ETAG, &etag);

    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag);
    if unchanged {
        return Ok((
            StatusCode::NOT_MODIFIED,
            resp_headers,
            Json(serde_json::json!({})),
        ));
    }
    Ok((StatusCode::OK, resp_headers, Json(body)))
}

/// POST /boards/{board_id}/reorder — replace the layout of the whole board.
pub async fn reorder_board(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.reorder_board";
    let body = json_body(target, payload)?;
    let req = parsed(target, BulkReorderRequest::from_value(&body))?;
    let outcome =
        with_store(&state, target, move |store| reconcile_board(store, board_id, &req.columns))
            .await?;
    state.publish(BoardChangeEvent::BoardReconciled {
        board_id,
        moved: outcome.moved,
    });
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "columns": outcome.columns,
            "cards": outcome.cards,
            "moved": outcome.moved,
        })),
    ))
}

pub async fn list_tags(State(state): State<AppState>) -> ApiResult {
    let target = "studioboard.api.list_tags";
    let tags = with_store(&state, target, |store| boards::list_tags(store)).await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "tags": tags }))))
}
