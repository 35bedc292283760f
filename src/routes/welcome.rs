use axum::{extract::State, http::HeaderMap, response::Json};

use crate::error::Result;
use crate::middleware::auth::require_internal_secret;
use crate::models::scheduled_notification::WelcomeDispatch;
use crate::AppState;

/// Called by the scheduler; the request body is ignored.
pub async fn send_welcome_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<WelcomeDispatch>> {
    require_internal_secret(&state.config, &headers)?;
    let outcome = state.welcome_service.dispatch().await?;
    Ok(Json(outcome))
}
