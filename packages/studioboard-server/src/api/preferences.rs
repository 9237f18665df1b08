use axum::extract::rejection::JsonRejection;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use studioboard_core::boards::list_boards;
use studioboard_core::requests::CurrentBoardRequest;
use studioboard_core::types::{Board, BoardId, BoardRef};
use studioboard_core::{BoardError, Resource};

use super::{board_error, json_body, parsed, with_store, ApiResult};
use crate::preferences::{client_id, CURRENT_BOARD_KEY};
use crate::state::AppState;

async fn find_board(state: &AppState, target: &'static str, board_id: BoardId) -> Result<Board, super::ApiError> {
    let boards = with_store(state, target, |store| list_boards(store)).await?;
    boards
        .into_iter()
        .find(|b| b.id == board_id)
        .ok_or_else(|| board_error(target, BoardError::not_found(Resource::Board)))
}

/// GET /preferences/current-board — 404 when unset or the board is gone.
pub async fn current_board(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let target = "studioboard.api.current_board";
    let client = client_id(&headers);
    let board_id = state
        .prefs
        .current_board(&client)
        .ok_or_else(|| board_error(target, BoardError::not_found(Resource::Board)))?;
    let board = match find_board(&state, target, board_id).await {
        Ok(board) => board,
        Err(err) => {
            state.prefs.remove(&client, CURRENT_BOARD_KEY);
            return Err(err);
        }
    };
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "board_id": board.id, "board": BoardRef::from(&board) })),
    ))
}

pub async fn set_current_board(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.set_current_board";
    let body = json_body(target, payload)?;
    let req = parsed(target, CurrentBoardRequest::from_value(&body))?;
    let board = find_board(&state, target, req.board_id).await?;
    state.prefs.remember_board(&client_id(&headers), board.id);
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "board_id": board.id, "board": BoardRef::from(&board) })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{app_state, json_payload, studio};
    use serde_json::json;

    #[tokio::test]
    async fn test_current_board_per_client() {
        let state = app_state();
        let (board, _) = studio(&state).await;
        let mut headers = HeaderMap::new();
        headers.insert("x-client-id", "phone".parse().unwrap());

        let err = current_board(State(state.clone()), headers.clone())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = set_current_board(
            State(state.clone()),
            headers.clone(),
            json_payload(json!({ "board_id": board + 1 })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        set_current_board(
            State(state.clone()),
            headers.clone(),
            json_payload(json!({ "board": board.to_string() })),
        )
        .await
        .unwrap();
        let (_, Json(body)) = current_board(State(state.clone()), headers).await.unwrap();
        assert_eq!(body["board"]["name"], "Studio");

        let err = current_board(State(state), HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stale_board_is_forgotten() {
        let state = app_state();
        state.prefs.remember_board("anonymous", 77);
        let err = current_board(State(state.clone()), HeaderMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(state.prefs.current_board("anonymous"), None);
    }
}
