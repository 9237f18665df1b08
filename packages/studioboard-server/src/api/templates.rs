use axum::extract::rejection::JsonRejection;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use studioboard_core::requests::NewTemplateRequest;
use studioboard_core::templates;
use studioboard_core::types::TemplateId;

use super::{json_body, parsed, to_json, with_store, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    active: bool,
}

/// GET /templates?active=true — active templates first, then by name.
pub async fn list_templates(
    State(state): State<AppState>,
    Query(params): Query<TemplateQuery>,
) -> ApiResult {
    let target = "studioboard.api.list_templates";
    let list = with_store(&state, target, move |store| {
        templates::list_templates(store, params.active)
    })
    .await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "templates": list }))))
}

pub async fn create_template(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult {
    let target = "studioboard.api.create_template";
    let body = json_body(target, payload)?;
    let req = parsed(target, NewTemplateRequest::from_value(&body))?;
    let template = with_store(&state, target, move |store| templates::create_template(store, &req)).await?;
    Ok((StatusCode::CREATED, Json(to_json(target, &template)?)))
}

pub async fn toggle_template(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
) -> ApiResult {
    let target = "studioboard.api.toggle_template";
    let template =
        with_store(&state, target, move |store| templates::toggle_template(store, template_id)).await?;
    Ok((StatusCode::OK, Json(to_json(target, &template)?)))
}
