use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use studioboard_core::{BoardError, SqliteStorage, ValidationError};

mod boards;
mod columns;
mod events;
mod ideas;
mod preferences;
mod templates;

use crate::state::AppState;

/// Axum REST API routes.
///
///   GET  /boards                                    -> list boards
///   POST /boards                                    -> create board
///   GET  /boards/:boardId/kanban?q=&tag=&col=       -> kanban view (+ ETag)
///   POST /boards/:boardId/columns                   -> add column
///   POST /boards/:boardId/reorder                   -> reconcile the whole board
///   POST /boards/:boardId/columns/:columnId/reorder -> reorder one column
///   POST /boards/:boardId/ideas                     -> create idea
///   POST /boards/:boardId/ideas/quick-add           -> create idea from one line
///   GET  /boards/:boardId/ideas/:ideaId             -> idea detail
///   DELETE /boards/:boardId/ideas/:ideaId           -> delete idea
///   POST /boards/:boardId/ideas/:ideaId/update      -> partial update
///   POST /boards/:boardId/ideas/:ideaId/move        -> move to column/index
///   POST /boards/:boardId/ideas/:ideaId/convert     -> convert to project
///   POST /boards/:boardId/ideas/:ideaId/project     -> update project fields
///   POST /boards/:boardId/ideas/:ideaId/apply-template
///   POST /boards/:boardId/ideas/:ideaId/save-template
///   GET  /templates?active=true                     -> list templates
///   POST /templates                                 -> create template
///   POST /templates/:templateId/toggle              -> flip active flag
///   GET  /tags                                      -> all tags
///   GET  /events?board=                             -> SSE stream of board changes
///   GET  /logs, /logs/stream                        -> recent / live log entries
///   GET  /status                                    -> health check
///   GET/PUT /preferences/current-board              -> client's current board
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route("/boards/{board_id}/kanban", get(boards::kanban))
        .route("/boards/{board_id}/columns", post(columns::add_column))
        .route("/boards/{board_id}/reorder", post(boards::reorder_board))
        .route(
            "/boards/{board_id}/columns/{column_id}/reorder",
            post(columns::reorder_column),
        )
        .route("/boards/{board_id}/ideas", post(ideas::create_idea))
        .route("/boards/{board_id}/ideas/quick-add", post(ideas::quick_add))
        .route(
            "/boards/{board_id}/ideas/{idea_id}",
            get(ideas::idea_detail).delete(ideas::delete_idea),
        )
        .route("/boards/{board_id}/ideas/{idea_id}/update", post(ideas::update_idea))
        .route("/boards/{board_id}/ideas/{idea_id}/move", post(ideas::move_idea))
        .route("/boards/{board_id}/ideas/{idea_id}/convert", post(ideas::convert_idea))
        .route("/boards/{board_id}/ideas/{idea_id}/project", post(ideas::update_project))
        .route(
            "/boards/{board_id}/ideas/{idea_id}/apply-template",
            post(ideas::apply_template),
        )
        .route(
            "/boards/{board_id}/ideas/{idea_id}/save-template",
            post(ideas::save_template),
        )
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/templates/{template_id}/toggle", post(templates::toggle_template))
        .route("/tags", get(boards::list_tags))
        .route("/events", get(events::sse_events))
        .route("/logs", get(events::list_logs))
        .route("/logs/stream", get(events::stream_logs))
        .route("/status", get(events::status))
        .route(
            "/preferences/current-board",
            get(preferences::current_board).put(preferences::set_current_board),
        )
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, HeaderMap, Json<ErrorResponse>);
pub type ApiResult = Result<(StatusCode, Json<serde_json::Value>), ApiError>;

fn insert_header_safe(headers: &mut HeaderMap, name: header::HeaderName, value: &str) {
    match value.parse() {
        Ok(parsed) => {
            headers.insert(name, parsed);
        }
        Err(e) => {
            log::warn!("Failed to set header {}={} ({})", name, value, e);
        }
    }
}

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

fn api_error(status: StatusCode, target: &'static str, error: String) -> ApiError {
    log_api_issue(status, target, &error);
    (status, HeaderMap::new(), Json(ErrorResponse { error }))
}

fn status_for(err: &BoardError) -> StatusCode {
    match err {
        BoardError::NotFound(_) => StatusCode::NOT_FOUND,
        BoardError::Validation(_) => StatusCode::BAD_REQUEST,
        BoardError::Conflict => StatusCode::CONFLICT,
        BoardError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn board_error(target: &'static str, err: BoardError) -> ApiError {
    let (status, mut headers, body) = api_error(status_for(&err), target, err.to_string());
    if err.is_retryable() {
        insert_header_safe(&mut headers, header::RETRY_AFTER, "1");
    }
    (status, headers, body)
}

/// Turn a request parse failure into a 400.
fn parsed<T>(target: &'static str, result: Result<T, ValidationError>) -> Result<T, ApiError> {
    result.map_err(|e| board_error(target, e.into()))
}

/// Unwrap a JSON body, answering malformed or mistyped bodies with a 400
/// `ErrorResponse` instead of axum's plain-text rejection.
fn json_body(
    target: &'static str,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<serde_json::Value, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        api_error(
            StatusCode::BAD_REQUEST,
            target,
            format!("invalid JSON body: {}", rejection.body_text()),
        )
    })
}

/// Run a store operation on the blocking pool.
async fn with_store<T, F>(state: &AppState, target: &'static str, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SqliteStorage) -> studioboard_core::Result<T> + Send + 'static,
{
    let storage = state.storage.clone();
    match tokio::task::spawn_blocking(move || op(&*storage)).await {
        Ok(result) => result.map_err(|e| board_error(target, e)),
        Err(e) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            target,
            format!("store task failed: {}", e),
        )),
    }
}

fn to_json<T: Serialize>(target: &'static str, value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            target,
            format!("failed to encode response: {}", e),
        )
    })
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use studioboard_core::Resource;

    async fn rejected(content_type: &str, body: &'static str) -> JsonRejection {
        let request = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_bad_bodies_answer_with_error_response() {
        let state = testing::app_state();
        for (content_type, body) in [("application/json", "{not json"), ("text/plain", "{}")] {
            let payload = Err(rejected(content_type, body).await);
            let (status, _, Json(error)) =
                boards::create_board(axum::extract::State(state.clone()), payload)
                    .await
                    .unwrap_err();
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(error.error.starts_with("invalid JSON body"));
        }
        let (_, Json(body)) = boards::list_boards(axum::extract::State(state)).await.unwrap();
        assert!(body["boards"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, headers, _) = board_error("test", BoardError::not_found(Resource::Card));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers.is_empty());

        let (status, _, Json(body)) = board_error("test", ValidationError::EmptyOrder.into());
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "validation failed: ordered_ids must be a non-empty list");

        let (status, headers, _) = board_error("test", BoardError::Conflict);
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "1");
    }
}
