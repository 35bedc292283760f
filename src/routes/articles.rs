use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use tracing::{info, warn};
use validator::Validate;

use crate::dto::article_dto::{
    AddViewRequest, AddViewResponse, UpdateArticleRequest, UpdateArticleResponse,
};
use crate::error::{Error, Result};
use crate::middleware::auth::authenticate;
use crate::models::article::PendingEdit;
use crate::utils::time::now;
use crate::AppState;

pub async fn tg_add_view(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddViewRequest>, JsonRejection>,
) -> Result<Json<AddViewResponse>> {
    let Json(req) = payload?;
    let (Some(init_data), Some(article_id)) = (req.init_data.as_deref(), req.article_id) else {
        return Err(Error::BadRequest("Missing initData or articleId".into()));
    };

    let user = authenticate(&state.config, Some(init_data))?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    let outcome = state.article_service.record_view(article_id, profile.id).await?;

    Ok(Json(AddViewResponse {
        success: true,
        already_viewed: outcome.already_viewed,
        views_count: outcome.views_count,
    }))
}

pub async fn tg_update_article(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> Result<Json<UpdateArticleResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    if req.init_data.as_deref().map_or(true, str::is_empty) {
        return Err(Error::BadRequest("initData is required".into()));
    }
    let (Some(article_id), Some(updates)) = (req.article_id, req.updates) else {
        return Err(Error::BadRequest("articleId and updates are required".into()));
    };

    let user = authenticate(&state.config, req.init_data.as_deref())?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    let article = state
        .article_service
        .get_with_author(article_id)
        .await?
        .ok_or_else(|| Error::NotFound("Article not found".into()))?;

    if article.article.author_id != Some(profile.id) {
        return Err(Error::Forbidden("You can only edit your own articles".into()));
    }

    let edit = PendingEdit {
        title: updates.title,
        topic: updates.topic,
        body: updates.body,
        media_url: updates.media_url,
        media_type: updates.media_type,
        is_anonymous: updates.is_anonymous,
        sources: updates.sources,
        submitted_at: Some(now()),
    };
    state.article_service.submit_pending_edit(article_id, &edit).await?;

    // The edit is stored; a failed admin notification must not fail the request.
    if let Err(e) = state.moderation_service.send_edit(article_id).await {
        warn!(%article_id, error = %e, "Failed to send edit moderation request");
    }

    info!(%article_id, profile_id = %profile.id, "Article edit submitted for moderation");
    Ok(Json(UpdateArticleResponse {
        success: true,
        message: "Edit submitted for moderation",
    }))
}
