use axum::{extract::State, http::HeaderMap, response::Json};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::dto::payment_dto::CryptoBotUpdate;
use crate::error::{Error, Result};
use crate::services::payment_service::paid_purchase;
use crate::utils::crypto::verify_webhook_signature;
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "crypto-pay-api-signature";

/// Crypto Pay webhook. The signature covers the exact bytes received, so
/// it is checked before the body is parsed.
pub async fn cryptobot_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let Some(token) = state.config.cryptobot_api_token.as_deref() else {
        error!("CRYPTOBOT_API_TOKEN not configured");
        return Err(Error::Config("CRYPTOBOT_API_TOKEN not configured".into()));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_webhook_signature(&body, signature, token) {
        warn!("Invalid CryptoBot webhook signature");
        return Err(Error::Unauthorized("Invalid signature".into()));
    }

    let update: CryptoBotUpdate =
        serde_json::from_slice(&body).map_err(|_| Error::BadRequest("Invalid payload".into()))?;

    let Some((purchase, amount)) = paid_purchase(&update)? else {
        info!(update_type = %update.update_type, "Ignoring non-payment update");
        return Ok(Json(json!({ "ok": true })));
    };

    info!(
        telegram_id = purchase.telegram_id,
        plan = %purchase.plan,
        period = %purchase.period,
        "Processing CryptoBot payment"
    );
    state.subscription_service.activate(&purchase, amount).await?;

    Ok(Json(json!({ "ok": true })))
}
