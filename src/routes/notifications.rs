use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use validator::Validate;

use crate::dto::notification_dto::NotificationsRequest;
use crate::error::Result;
use crate::middleware::auth::authenticate;
use crate::models::notification::NotificationFilter;
use crate::AppState;

const DEFAULT_LIMIT: i64 = 50;

pub async fn tg_notifications(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NotificationsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;
    req.validate()?;

    let user = authenticate(&state.config, req.init_data.as_deref())?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    if req.action.as_deref() == Some("mark_all_read") {
        let updated = state.notification_service.mark_all_read(profile.id).await?;
        tracing::debug!(profile_id = %profile.id, updated, "Marked notifications read");
        return Ok(Json(json!({ "success": true })).into_response());
    }

    let page = state
        .notification_service
        .list(
            profile.id,
            NotificationFilter::parse(req.filter.as_deref()),
            req.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;

    Ok(Json(page).into_response())
}
