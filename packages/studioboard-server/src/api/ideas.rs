use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use studioboard_core::events::BoardChangeEvent;
use studioboard_core::ideas;
use studioboard_core::ordering::{move_card, MoveOutcome};
use studioboard_core::requests::{
    ApplyTemplateRequest, CardPatch, MoveRequest, NewCardRequest, ProjectPatch, QuickAddRequest,
    SaveTemplateRequest,
};
use studioboard_core::templates;
use studioboard_core::types::{BoardId, CardId};

use super::{json_body, parsed, to_json, with_store, ApiResult};
use crate::state::AppState;

fn moved_event(board_id: BoardId, outcome: &MoveOutcome) -> BoardChangeEvent {
    BoardChangeEvent::CardMoved {
        board_id,
        card_id: outcome.card.id,
        from_column_id: outcome.from_column_id,
        to_column_id: outcome.card.column_id,
        position: outcome.card.position,
    }
}

pub async fn create_idea(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.create_idea";
    let body = json_body(target, payload)?;
    let req = parsed(target, NewCardRequest::from_value(&body))?;
    let card = with_store(&state, target, move |store| ideas::create_card(store, board_id, &req)).await?;
    state.publish(BoardChangeEvent::CardCreated {
        board_id,
        card_id: card.id,
        column_id: card.column.id,
    });
    Ok((StatusCode::CREATED, Json(to_json(target, &card)?)))
}

/// POST /boards/{board_id}/ideas/quick-add — `{ text: "Title @Column !3 #tag" }`.
pub async fn quick_add(
    State(state): State<AppState>,
    Path(board_id): Path<BoardId>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.quick_add";
    let body = json_body(target, payload)?;
    let req = parsed(target, QuickAddRequest::from_value(&body))?;
    let card = with_store(&state, target, move |store| ideas::quick_add(store, board_id, &req)).await?;
    state.publish(BoardChangeEvent::CardCreated {
        board_id,
        card_id: card.id,
        column_id: card.column.id,
    });
    Ok((StatusCode::CREATED, Json(to_json(target, &card)?)))
}

pub async fn idea_detail(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
) -> ApiResult {
    let target = "studioboard.api.idea_detail";
    let card = with_store(&state, target, move |store| ideas::card_detail(store, board_id, idea_id)).await?;
    Ok((StatusCode::OK, Json(to_json(target, &card)?)))
}

pub async fn delete_idea(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
) -> ApiResult {
    let target = "studioboard.api.delete_idea";
    let deleted = with_store(&state, target, move |store| ideas::delete_card(store, board_id, idea_id)).await?;
    state.publish(BoardChangeEvent::CardDeleted {
        board_id,
        card_id: deleted.id,
        column_id: deleted.column_id,
    });
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "deleted": deleted.id, "column_id": deleted.column_id })),
    ))
}

pub async fn update_idea(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.update_idea";
    let body = json_body(target, payload)?;
    let patch = parsed(target, CardPatch::from_value(&body))?;
    let updated = with_store(&state, target, move |store| {
        ideas::update_card(store, board_id, idea_id, &patch)
    })
    .await?;
    state.publish(BoardChangeEvent::CardUpdated {
        board_id,
        card_id: idea_id,
    });
    if let Some(outcome) = &updated.moved {
        state.publish(moved_event(board_id, outcome));
    }
    Ok((StatusCode::OK, Json(to_json(target, &updated)?)))
}

/// POST /boards/{board_id}/ideas/{idea_id}/move — answers with the card's
/// final `{ id, column_id, position }`.
pub async fn move_idea(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.move_idea";
    let body = json_body(target, payload)?;
    let req = parsed(target, MoveRequest::from_value(&body))?;
    let outcome = with_store(&state, target, move |store| {
        move_card(
            store,
            board_id,
            idea_id,
            req.destination_column_id,
            req.target_index,
        )
    })
    .await?;
    state.publish(moved_event(board_id, &outcome));
    Ok((StatusCode::OK, Json(to_json(target, &outcome.card)?)))
}

pub async fn convert_idea(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
) -> ApiResult {
    let target = "studioboard.api.convert_idea";
    let conversion =
        with_store(&state, target, move |store| ideas::convert_card(store, board_id, idea_id)).await?;
    state.publish(BoardChangeEvent::CardConverted {
        board_id,
        card_id: idea_id,
        column_id: conversion.moved.card.column_id,
    });
    Ok((StatusCode::CREATED, Json(to_json(target, &conversion)?)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.update_project";
    let body = json_body(target, payload)?;
    let patch = parsed(target, ProjectPatch::from_value(&body))?;
    let project = with_store(&state, target, move |store| {
        ideas::update_project(store, board_id, idea_id, &patch)
    })
    .await?;
    state.publish(BoardChangeEvent::CardUpdated {
        board_id,
        card_id: idea_id,
    });
    Ok((StatusCode::OK, Json(to_json(target, &project)?)))
}

pub async fn apply_template(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.apply_template";
    let body = json_body(target, payload)?;
    let req = parsed(target, ApplyTemplateRequest::from_value(&body))?;
    let card = with_store(&state, target, move |store| {
        templates::apply_template(store, board_id, idea_id, req.template_id)
    })
    .await?;
    state.publish(BoardChangeEvent::CardUpdated {
        board_id,
        card_id: idea_id,
    });
    Ok((StatusCode::OK, Json(to_json(target, &card)?)))
}

/// Templates are global, so no board event follows.
pub async fn save_template(
    State(state): State<AppState>,
    Path((board_id, idea_id)): Path<(BoardId, CardId)>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.save_template";
    let body = json_body(target, payload)?;
    let req = parsed(target, SaveTemplateRequest::from_value(&body))?;
    let template = with_store(&state, target, move |store| {
        templates::template_from_card(store, board_id, idea_id, &req)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(to_json(target, &template)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_quick_add() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let mut events = state.event_tx.subscribe();

        let (status, Json(card)) = create_idea(
            State(state.clone()),
            Path(board),
            json_payload(json!({ "title": "Podcast", "tags": "audio, #Audio, video", "impact": "3" })),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(card["column"]["id"], columns[0]);
        assert_eq!(card["tags"], json!(["audio", "video"]));
        assert_eq!(card["impact"], 3);
        assert!(matches!(
            events.try_recv().unwrap(),
            BoardChangeEvent::CardCreated { .. }
        ));

        let (_, Json(card)) = quick_add(
            State(state.clone()),
            Path(board),
            json_payload(json!({ "text": "Zine @thinking !4 #print" })),
        )
        .await
        .unwrap();
        assert_eq!(card["title"], "Zine");
        assert_eq!(card["column"]["id"], columns[2]);
        assert_eq!(card["impact"], 4);
        assert_eq!(card["position"], 0);

        let err = create_idea(
            State(state.clone()),
            Path(board),
            json_payload(json!({ "title": "x", "impact": 9 })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_move_within_and_across_columns() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;
        idea(&state, board, columns[0], "Y").await;
        idea(&state, board, columns[0], "Z").await;
        let m = idea(&state, board, columns[1], "M").await;

        let (_, Json(moved)) = move_idea(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "destination_column_id": columns[0], "target_index": 2 })),
        )
        .await
        .unwrap();
        assert_eq!(moved, json!({ "id": x, "column_id": columns[0], "position": 1 }));

        let mut events = state.event_tx.subscribe();
        let (_, Json(moved)) = move_idea(
            State(state.clone()),
            Path((board, m)),
            json_payload(json!({ "to_column_id": columns[0].to_string(), "position": -3 })),
        )
        .await
        .unwrap();
        assert_eq!(moved["position"], 0);
        assert_eq!(
            events.try_recv().unwrap(),
            BoardChangeEvent::CardMoved {
                board_id: board,
                card_id: m,
                from_column_id: columns[1],
                to_column_id: columns[0],
                position: 0,
            }
        );

        let err = move_idea(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "destination_column_id": "left" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = move_idea(
            State(state),
            Path((board, x)),
            json_payload(json!({ "destination_column_id": 9999 })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_detail_delete() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;
        let y = idea(&state, board, columns[0], "Y").await;

        let (_, Json(updated)) = update_idea(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "title": "X2", "column_id": columns[1] })),
        )
        .await
        .unwrap();
        assert_eq!(updated["card"]["title"], "X2");
        assert_eq!(updated["moved"]["from_column_id"], columns[0]);

        let (_, Json(detail)) = idea_detail(State(state.clone()), Path((board, y)))
            .await
            .unwrap();
        assert_eq!(detail["position"], 0);

        let (_, Json(deleted)) = delete_idea(State(state.clone()), Path((board, y)))
            .await
            .unwrap();
        assert_eq!(deleted["deleted"], y);

        let err = idea_detail(State(state), Path((board, y))).await.unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_convert_then_project() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;

        let err = update_project(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "goals": "ship" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let (status, Json(conversion)) = convert_idea(State(state.clone()), Path((board, x)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(conversion["moved"]["card"]["column_id"], columns[3]);

        let err = convert_idea(State(state.clone()), Path((board, x)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let (_, Json(project)) = update_project(
            State(state),
            Path((board, x)),
            json_payload(json!({ "goals": "ship", "due_date": "2026-12-01" })),
        )
        .await
        .unwrap();
        assert_eq!(project["goals"], "ship");
    }

    #[tokio::test]
    async fn test_templates_round_trip_through_card() {
        let state = app_state();
        let (board, columns) = studio(&state).await;
        let x = idea(&state, board, columns[0], "X").await;
        let y = idea(&state, board, columns[0], "Y").await;

        let err = save_template(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "name": "Empty" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        update_idea(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "body_md": "## Plan" })),
        )
        .await
        .unwrap();
        let (_, Json(template)) = save_template(
            State(state.clone()),
            Path((board, x)),
            json_payload(json!({ "name": "Plan" })),
        )
        .await
        .unwrap();

        let (_, Json(card)) = apply_template(
            State(state),
            Path((board, y)),
            json_payload(json!({ "template_id": template["id"] })),
        )
        .await
        .unwrap();
        assert_eq!(card["body_md"], "## Plan");
    }
}
