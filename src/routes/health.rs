use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

/// Liveness probe. Reports pool occupancy without acquiring a connection.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "db_pool": {
            "size": state.pool.size(),
            "idle": state.pool.num_idle(),
        },
    });
    (StatusCode::OK, Json(body))
}
