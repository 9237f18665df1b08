use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use studioboard_core::boards;
use studioboard_core::events::BoardChangeEvent;
use studioboard_core::ordering::reorder_column as reorder;
use studioboard_core::requests::{ColumnReorderRequest, NewColumnRequest};
use studioboard_core::types::{BoardId, ColumnId};

use super::{json_body, parsed, to_json, with_store, ApiResult};
use crate::state::AppState;

pub async fn add_column(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.add_column";
    let body = json_body(target, payload)?;
    let req = parsed(target, NewColumnRequest::from_value(&body))?;
    let column =
        with_store(&state, target, move |store| boards::add_column(store, board_id, &req)).await?;
    state.publish(BoardChangeEvent::BoardChanged { board_id });
    Ok((StatusCode::CREATED, Json(to_json(target, &column)?)))
}

/// POST /boards/{board_id}/columns/{column_id}/reorder — answers with the
/// completed order, stragglers included.
pub async fn reorder_column(
    State(state): State<AppState>,
    Path((board_id, column_id)): Path<(BoardId, ColumnId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.reorder_column";
    let body = json_body(target, payload)?;
    let req = parsed(target, ColumnReorderRequest::from_value(&body))?;
    let ordered_ids = with_store(&state, target, move |store| {
        reorder(store, board_id, column_id, &req.ordered_ids)
    })
    .await?;
    state.publish(BoardChangeEvent::ColumnReordered {
        board_id,
        column_id,
    });
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "ordered_ids": ordered_ids })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_column() {
        let state = app_state();
        let (board, _) = studio(&state).await;
        let (status, Json(body)) = add_column(
            State(state.clone()),
            Path(board),
            json_payload(json!({ "name": "Someday", "kind": "archived" })),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["order"], 5);

        let err = add_column(State(state), Path(board), json_payload(json!({ "name": "" })))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_reorder_appends_omitted_ideas() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;
        let y = idea(&state, board, columns[0], "Y").await;
        let z = idea(&state, board, columns[0], "Z").await;
        let mut events = state.event_tx.subscribe();

        let (_, Json(body)) = reorder_column(
            State(state.clone()),
            Path((board, columns[0])),
            json_payload(json!({ "ordered_ids": [z.to_string(), x] })),
        )
        .await
        .unwrap();
        assert_eq!(body["ordered_ids"], json!([z, x, y]));
        assert_eq!(
            events.try_recv().unwrap(),
            BoardChangeEvent::ColumnReordered {
                board_id: board,
                column_id: columns[0],
            }
        );
    }

    #[tokio::test]
    async fn test_reorder_rejections() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;
        let other = idea(&state, board, columns[1], "Other").await;

        for payload in [
            json!({ "ordered_ids": [] }),
            json!({ "ordered_ids": [x, x] }),
            json!({ "ordered_ids": [x, other] }),
            json!({ "ordered_ids": ["abc"] }),
        ] {
            let err = reorder_column(State(state.clone()), Path((board, columns[0])), json_payload(payload))
                .await
                .unwrap_err();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
        }

        let err = reorder_column(
            State(state.clone()),
            Path((board, columns[0])),
            json_payload(json!({ "ordered_ids": [x, 9999] })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = reorder_column(
            State(state),
            Path((board + 1, columns[0])),
            json_payload(json!({ "ordered_ids": [x] })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
