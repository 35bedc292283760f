use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use validator::Validate;

use crate::dto::activity_dto::{ActivityRequest, ActivityResponse};
use crate::error::Result;
use crate::middleware::auth::authenticate;
use crate::AppState;

pub async fn tg_my_activity(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ActivityRequest>, JsonRejection>,
) -> Result<Json<ActivityResponse>> {
    let Json(req) = payload?;
    req.validate()?;

    let user = authenticate(&state.config, req.init_data.as_deref())?;
    let profile = state.profile_service.require_by_telegram_id(user.id).await?;

    let activities = state
        .activity_service
        .feed(profile.id, req.limit.unwrap_or(50))
        .await?;

    Ok(Json(ActivityResponse { activities }))
}
