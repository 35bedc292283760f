use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Json,
};

use crate::dto::article_dto::{EditModerationResponse, ModerationRequest, ModerationResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::require_internal_secret;
use crate::AppState;

pub async fn send_moderation(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ModerationRequest>, JsonRejection>,
) -> Result<Json<ModerationResponse>> {
    require_internal_secret(&state.config, &headers)?;
    let Json(req) = payload?;
    let article_id = req
        .article_id
        .ok_or_else(|| Error::BadRequest("articleId is required".into()))?;

    let message_id = state.moderation_service.send_article(article_id).await?;

    Ok(Json(ModerationResponse {
        success: true,
        message_id,
    }))
}

pub async fn send_edit_moderation(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<ModerationRequest>, JsonRejection>,
) -> Result<Json<EditModerationResponse>> {
    require_internal_secret(&state.config, &headers)?;
    let Json(req) = payload?;
    let article_id = req
        .article_id
        .ok_or_else(|| Error::BadRequest("articleId is required".into()))?;

    let message_id = state.moderation_service.send_edit(article_id).await?;

    Ok(Json(EditModerationResponse {
        success: true,
        message_id,
    }))
}
